// ==============================================
// TTL-LRU CONCURRENCY TESTS (integration)
// ==============================================
//
// Every operation takes the same mutex, so no interleaving may leave the
// index and the recency list disagreeing. These runs hammer the cache from
// several threads released together by a barrier and then check the
// structure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ttl_lru::prelude::*;

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;
const KEY_SPACE: u64 = 128;

type ManualCache = TtlLruCache<u64, u64, ExternalKeyTime, ManualClock>;

fn run_threads<F>(threads: usize, body: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(threads));
    let body = Arc::new(body);
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            let body = Arc::clone(&body);
            thread::spawn(move || {
                barrier.wait();
                body(t);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

mod mixed_workload {
    use super::*;

    #[test]
    fn random_ops_preserve_invariants() {
        let cache: Arc<TtlLruCache<u64, u64>> = Arc::new(TtlLruCache::with_capacity(256));

        let shared = Arc::clone(&cache);
        run_threads(THREADS, move |t| {
            let mut rng = StdRng::seed_from_u64(0x5eed + t as u64);
            for _ in 0..OPS_PER_THREAD {
                let key = rng.gen_range(0..KEY_SPACE);
                match rng.gen_range(0..100) {
                    0..=44 => shared.put(key, key * 10),
                    45..=79 => {
                        if let Some(v) = shared.get(&key) {
                            assert_eq!(v, key * 10);
                        }
                    },
                    80..=89 => {
                        shared.erase(&key);
                    },
                    90..=94 => {
                        shared.shrink(64);
                    },
                    _ => {
                        shared.expire(Duration::from_millis(1));
                    },
                }
            }
        });

        cache.check_invariants().unwrap();
        assert!(cache.len() <= KEY_SPACE as usize);
        assert_eq!(cache.is_empty(), cache.len() == 0);
    }

    #[test]
    fn concurrent_shrink_never_overshoots() {
        let cache: Arc<TtlLruCache<u64, u64>> = Arc::new(TtlLruCache::new());
        for k in 0..1_000 {
            cache.put(k, k);
        }

        let shared = Arc::clone(&cache);
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evicted);
        run_threads(THREADS, move |t| {
            let target = 100 + t * 50;
            counter.fetch_add(shared.shrink(target), Ordering::SeqCst);
        });

        assert_eq!(cache.len(), 100);
        assert_eq!(evicted.load(Ordering::SeqCst), 900);
        cache.check_invariants().unwrap();
    }
}

mod expire_under_contention {
    use super::*;

    #[test]
    fn expire_racing_puts_keeps_invariants() {
        let clock = ManualClock::new();
        let cache: Arc<ManualCache> = Arc::new(TtlLruCache::with_policy_and_clock(
            ExternalKeyTime,
            clock.clone(),
        ));

        let shared = Arc::clone(&cache);
        run_threads(4, move |t| {
            for i in 0..1_000u64 {
                match t {
                    0 => clock.advance(Duration::from_micros(50)),
                    1 => {
                        shared.expire(Duration::from_millis(5));
                    },
                    _ => shared.put((t as u64) << 32 | i, i),
                }
            }
        });

        cache.check_invariants().unwrap();
        let keys = cache.keys_by_recency();
        assert_eq!(keys.len(), cache.len());
    }

    #[test]
    fn evict_callback_sees_each_key_once() {
        let clock = ManualClock::new();
        let cache: Arc<ManualCache> = Arc::new(TtlLruCache::with_policy_and_clock(
            ExternalKeyTime,
            clock.clone(),
        ));
        for k in 0..512u64 {
            cache.put(k, k);
        }
        clock.advance(Duration::from_secs(1));

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let shared = Arc::clone(&cache);
        let sink = Arc::clone(&seen);
        run_threads(THREADS, move |_| {
            let mut local = Vec::new();
            shared.expire_with(Duration::from_millis(10), |k| local.push(*k));
            sink.lock().extend(local);
        });

        let mut seen = seen.lock().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..512).collect::<Vec<_>>());
        assert!(cache.is_empty());
    }
}
