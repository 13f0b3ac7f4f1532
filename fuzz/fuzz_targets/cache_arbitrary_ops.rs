#![no_main]

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use libfuzzer_sys::fuzz_target;
use ttl_lru::prelude::*;

// Fuzz arbitrary operation sequences on TtlLruCache
//
// Drives put, get, erase, shrink, expire, clock advances and clear against a
// VecDeque reference of (key, last_access) in MRU-first order, checking
// recency order and structural invariants after every step.
fuzz_target!(|data: &[u8]| {
    let clock = ManualClock::new();
    let cache: TtlLruCache<u8, u32, ExternalKeyTime, ManualClock> =
        TtlLruCache::with_policy_and_clock(ExternalKeyTime, clock.clone());
    let mut reference: VecDeque<(u8, Instant)> = VecDeque::new();

    for (step, pair) in data.chunks_exact(2).enumerate() {
        let arg = pair[1];
        match pair[0] % 7 {
            0 => {
                cache.put(arg, step as u32);
                reference.retain(|(k, _)| *k != arg);
                reference.push_front((arg, clock.now()));
            }
            1 => {
                let hit = cache.get(&arg).is_some();
                let pos = reference.iter().position(|(k, _)| *k == arg);
                assert_eq!(hit, pos.is_some());
                if let Some(pos) = pos {
                    reference.remove(pos);
                    reference.push_front((arg, clock.now()));
                }
            }
            2 => {
                let removed = cache.erase(&arg);
                let before = reference.len();
                reference.retain(|(k, _)| *k != arg);
                assert_eq!(removed, before != reference.len());
            }
            3 => {
                let max_size = usize::from(arg % 32);
                let evicted = cache.shrink(max_size);
                assert_eq!(evicted, reference.len().saturating_sub(max_size));
                reference.truncate(max_size);
            }
            4 => {
                let age = Duration::from_millis(u64::from(arg));
                let threshold = clock.now() - age;
                let mut evicted = Vec::new();
                cache.expire_with(age, |k| evicted.push(*k));

                let mut expected = Vec::new();
                while reference.back().is_some_and(|(_, t)| *t < threshold) {
                    if let Some((k, _)) = reference.pop_back() {
                        expected.push(k);
                    }
                }
                assert_eq!(evicted, expected);
            }
            5 => clock.advance(Duration::from_millis(u64::from(arg % 16))),
            _ => {
                if arg == 0 {
                    cache.clear();
                    reference.clear();
                }
            }
        }

        let keys: Vec<u8> = reference.iter().map(|(k, _)| *k).collect();
        assert_eq!(cache.keys_by_recency(), keys);
        assert_eq!(cache.is_empty(), reference.is_empty());
        cache.check_invariants().unwrap();
    }
});
