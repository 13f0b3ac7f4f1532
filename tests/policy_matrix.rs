// ==============================================
// EXTRACTION POLICY MATRIX (integration)
// ==============================================
//
// The same workload against all four key/time storage shapes, built both
// through typed constructors and through the runtime builder. Observable
// recency and expiry behaviour must not depend on where keys and
// timestamps are stored.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

use ttl_lru::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Token {
    id: u32,
    last_used: Instant,
}

fn token(id: u32, clock: &ManualClock) -> Token {
    Token {
        id,
        last_used: clock.now(),
    }
}

/// Recency and expiry checks shared by every policy. `put` hides whether the
/// policy takes the key explicitly.
fn exercise<P>(cache: &TtlLruCache<u32, Token, P, ManualClock>, put: impl Fn(Token))
where
    P: ExtractionPolicy<u32, Token>,
{
    let clock = cache.clock().clone();
    for id in 0..6 {
        put(token(id, &clock));
        clock.advance(Duration::from_millis(10));
    }
    assert_eq!(cache.keys_by_recency(), vec![5, 4, 3, 2, 1, 0]);

    // Re-putting 2 replaces it in place of growing.
    put(token(2, &clock));
    assert_eq!(cache.len(), 6);
    assert_eq!(cache.keys_by_recency(), vec![2, 5, 4, 3, 1, 0]);

    clock.advance(Duration::from_millis(10));
    assert!(cache.get(&0).is_some());
    assert_eq!(cache.keys_by_recency(), vec![0, 2, 5, 4, 3, 1]);

    assert_eq!(cache.shrink(5), 1);
    assert!(!cache.exists(&1));

    // Stamps: 0@70 2@60 5@50 4@40 3@30, now = 70.
    let mut evicted = Vec::new();
    assert_eq!(
        cache.expire_with(Duration::from_millis(15), |k| evicted.push(*k)),
        3
    );
    assert_eq!(evicted, vec![3, 4, 5]);
    assert_eq!(cache.keys_by_recency(), vec![0, 2]);

    assert!(cache.erase(&2));
    assert_eq!(cache.erase_keys([0, 42]), 1);
    assert!(cache.is_empty());
    cache.check_invariants().unwrap();
}

fn assert_config_error<T: Debug>(result: Result<T, ConfigError>, needle: &str) {
    let err = result.unwrap_err();
    assert!(
        err.message().contains(needle),
        "expected {needle:?} in {:?}",
        err.message()
    );
}

mod typed_constructors {
    use super::*;

    #[test]
    fn external_key_time() {
        let cache = TtlLruCache::with_policy_and_clock(ExternalKeyTime, ManualClock::new());
        exercise(&cache, |t| cache.put(t.id, t));
    }

    #[test]
    fn derived_key() {
        let cache = TtlLruCache::with_policy_and_clock(
            DerivedKey::new(|t: &Token| t.id),
            ManualClock::new(),
        );
        exercise(&cache, |t| cache.put_value(t));
    }

    #[test]
    fn derived_time() {
        let cache = TtlLruCache::with_policy_and_clock(
            DerivedTime::new(|t: &Token| t.last_used, |t: &mut Token, at| t.last_used = at),
            ManualClock::new(),
        );
        exercise(&cache, |t| cache.put(t.id, t));
    }

    #[test]
    fn derived_key_time() {
        let cache = TtlLruCache::with_policy_and_clock(
            DerivedKeyTime::new(
                |t: &Token| t.id,
                |t: &Token| t.last_used,
                |t: &mut Token, at| t.last_used = at,
            ),
            ManualClock::new(),
        );
        exercise(&cache, |t| cache.put_value(t));
    }
}

mod runtime_builder {
    use super::*;

    fn builder() -> CacheBuilder<u32, Token, ManualClock> {
        CacheBuilder::new().capacity(8).clock(ManualClock::new())
    }

    #[test]
    fn all_policies_behave_alike() {
        let cache = builder().try_build::<ExternalKeyTime>().unwrap();
        exercise(&cache, |t| cache.put(t.id, t));

        let cache = builder()
            .key_fn(|t: &Token| t.id)
            .try_build::<DerivedKey<u32, Token>>()
            .unwrap();
        exercise(&cache, |t| cache.put_value(t));

        let cache = builder()
            .time_fns(|t: &Token| t.last_used, |t: &mut Token, at| t.last_used = at)
            .try_build::<DerivedTime<Token>>()
            .unwrap();
        exercise(&cache, |t| cache.put(t.id, t));

        let cache = builder()
            .key_fn(|t: &Token| t.id)
            .time_fns(|t: &Token| t.last_used, |t: &mut Token, at| t.last_used = at)
            .try_build::<DerivedKeyTime<u32, Token>>()
            .unwrap();
        exercise(&cache, |t| cache.put_value(t));
    }

    #[test]
    fn mismatched_parts_are_config_errors() {
        assert_config_error(
            builder().try_build::<DerivedKey<u32, Token>>(),
            "DerivedKey",
        );
        assert_config_error(
            builder()
                .key_fn(|t: &Token| t.id)
                .try_build::<DerivedKeyTime<u32, Token>>(),
            "DerivedKeyTime",
        );
        assert_config_error(
            builder()
                .get_time(|t: &Token| t.last_used)
                .try_build::<DerivedTime<Token>>(),
            "setter",
        );
        assert_config_error(
            builder()
                .time_fns(|t: &Token| t.last_used, |t: &mut Token, at| t.last_used = at)
                .try_build::<ExternalKeyTime>(),
            "ExternalKeyTime",
        );
    }
}

mod generic_keys {
    use super::*;

    fn round_trip<K>(keys: [K; 3])
    where
        K: Eq + Hash + Clone + Debug,
    {
        let cache: TtlLruCache<K, usize> = TtlLruCache::new();
        for (i, k) in keys.iter().enumerate() {
            cache.put(k.clone(), i);
        }
        cache.get(&keys[0]);
        assert_eq!(cache.keys_by_recency(), vec![
            keys[0].clone(),
            keys[2].clone(),
            keys[1].clone()
        ]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn string_keys() {
        round_trip(["alpha".to_string(), "beta".to_string(), "gamma".to_string()]);
    }

    #[test]
    fn tuple_keys() {
        round_trip([(1u8, 'a'), (1, 'b'), (2, 'a')]);
    }
}
