//! Periodic TTL sweeps over a shared cache.
//!
//! [`ExpiryService`] pairs a [`TtlLruCache`] with a [`Ticker`] that calls
//! [`expire_with`](TtlLruCache::expire_with) every `interval`. Shutting the
//! service down (explicitly or by dropping it) stops the ticker and then
//! clears the cache.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use ttl_lru::cache::TtlLruCache;
//! use ttl_lru::service::{ExpiryConfig, ExpiryService};
//!
//! let cache: Arc<TtlLruCache<String, Vec<u8>>> = Arc::new(TtlLruCache::new());
//! let config = ExpiryConfig::new(Duration::from_secs(1), Duration::from_secs(300)).unwrap();
//! let mut service = ExpiryService::start(Arc::clone(&cache), config, None).unwrap();
//!
//! cache.put("blob".to_string(), vec![0; 16]);
//! // ... entries idle for five minutes disappear within a second ...
//!
//! service.shutdown();
//! assert!(cache.is_empty());
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::ticker::Ticker;
use crate::cache::TtlLruCache;
use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, ServiceError};
use crate::policy::{ExternalKeyTime, ExtractionPolicy};

const TICKER_NAME: &str = "ttl-lru-expiry";

/// Called with each key a sweep evicts, while the cache lock is held.
pub type EvictCallback<K> = Arc<dyn Fn(&K) + Send + Sync>;

/// Sweep cadence and the idle age past which entries are evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryConfig {
    interval: Duration,
    max_age: Duration,
}

impl ExpiryConfig {
    /// `interval` must be non-zero. A zero `max_age` evicts everything not
    /// touched since the previous clock reading.
    pub fn new(interval: Duration, max_age: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::new("expiry interval must be > 0"));
        }
        Ok(Self { interval, max_age })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}

/// Background expiration driver for a shared [`TtlLruCache`].
pub struct ExpiryService<K, V, P = ExternalKeyTime, C = SystemClock>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    cache: Arc<TtlLruCache<K, V, P, C>>,
    config: ExpiryConfig,
    on_evict: Arc<Mutex<Option<EvictCallback<K>>>>,
    ticker: Option<Ticker>,
}

impl<K, V, P, C> ExpiryService<K, V, P, C>
where
    K: Eq + Hash + Send + 'static,
    V: 'static,
    P: ExtractionPolicy<K, V> + Send + Sync + 'static,
    P::Entry: Send,
    C: Clock + 'static,
{
    /// Starts sweeping `cache` every `config.interval()`.
    pub fn start(
        cache: Arc<TtlLruCache<K, V, P, C>>,
        config: ExpiryConfig,
        on_evict: Option<EvictCallback<K>>,
    ) -> Result<Self, ServiceError> {
        let on_evict = Arc::new(Mutex::new(on_evict));

        let sweep_cache = Arc::clone(&cache);
        let sweep_callback = Arc::clone(&on_evict);
        let max_age = config.max_age;
        let ticker = Ticker::schedule(TICKER_NAME, config.interval, move || {
            sweep(&*sweep_cache, max_age, &*sweep_callback);
        })?;

        info!(
            interval = ?config.interval,
            max_age = ?config.max_age,
            "expiry service started"
        );
        Ok(Self {
            cache,
            config,
            on_evict,
            ticker: Some(ticker),
        })
    }

    /// Validates `interval`/`max_age` and starts the service.
    pub fn start_every(
        cache: Arc<TtlLruCache<K, V, P, C>>,
        interval: Duration,
        max_age: Duration,
        on_evict: Option<EvictCallback<K>>,
    ) -> Result<Self, ServiceError> {
        let config = ExpiryConfig::new(interval, max_age)?;
        Self::start(cache, config, on_evict)
    }
}

impl<K, V, P, C> ExpiryService<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    /// Replaces the eviction callback. Takes effect from the next sweep.
    pub fn set_on_evict(&self, on_evict: Option<EvictCallback<K>>) {
        *self.on_evict.lock() = on_evict;
    }

    pub fn cache(&self) -> &Arc<TtlLruCache<K, V, P, C>> {
        &self.cache
    }

    pub fn config(&self) -> ExpiryConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Stops sweeping and clears the cache. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(mut ticker) = self.ticker.take() else {
            return;
        };
        ticker.cancel();
        self.cache.clear();
        info!("expiry service stopped");
    }
}

fn sweep<K, V, P, C>(
    cache: &TtlLruCache<K, V, P, C>,
    max_age: Duration,
    on_evict: &Mutex<Option<EvictCallback<K>>>,
) where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    let callback = on_evict.lock().clone();
    let evicted = match callback {
        Some(callback) => cache.expire_with(max_age, |key| callback(key)),
        None => cache.expire(max_age),
    };
    if evicted > 0 {
        debug!(evicted, ?max_age, "expiry sweep");
    }
}

impl<K, V, P, C> Drop for ExpiryService<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<K, V, P, C> fmt::Debug for ExpiryService<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryService")
            .field("config", &self.config)
            .field("running", &self.ticker.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::clock::ManualClock;

    type ManualCache = TtlLruCache<u32, String, ExternalKeyTime, ManualClock>;

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let give_up = Instant::now() + Duration::from_secs(5);
        while Instant::now() < give_up {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    fn manual_cache() -> (Arc<ManualCache>, ManualClock) {
        let clock = ManualClock::new();
        let cache = Arc::new(TtlLruCache::with_policy_and_clock(
            ExternalKeyTime,
            clock.clone(),
        ));
        (cache, clock)
    }

    #[test]
    fn config_rejects_zero_interval() {
        let err = ExpiryConfig::new(Duration::ZERO, Duration::from_secs(1)).unwrap_err();
        assert!(err.message().contains("interval"));
    }

    #[test]
    fn start_every_surfaces_config_error() {
        let (cache, _clock) = manual_cache();
        let result = ExpiryService::start_every(cache, Duration::ZERO, Duration::ZERO, None);
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn sweeps_stale_entries_and_reports_keys() {
        let (cache, clock) = manual_cache();
        cache.put(1, "stale".into());
        cache.put(2, "stale".into());
        clock.advance(Duration::from_secs(60));
        cache.put(3, "fresh".into());

        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let config = ExpiryConfig::new(Duration::from_millis(5), Duration::from_secs(30)).unwrap();
        let mut service = ExpiryService::start(
            Arc::clone(&cache),
            config,
            Some(Arc::new(move |key: &u32| sink.lock().push(*key))),
        )
        .unwrap();

        assert!(wait_for(|| cache.len() == 1));
        assert_eq!(*evicted.lock(), vec![1, 2]);
        assert!(cache.exists(&3));

        service.shutdown();
    }

    #[test]
    fn set_on_evict_applies_to_later_sweeps() {
        let (cache, clock) = manual_cache();
        let config = ExpiryConfig::new(Duration::from_millis(5), Duration::from_secs(1)).unwrap();
        let service = ExpiryService::start(Arc::clone(&cache), config, None).unwrap();

        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        service.set_on_evict(Some(Arc::new(move |key: &u32| sink.lock().push(*key))));

        cache.put(7, "seven".into());
        clock.advance(Duration::from_secs(2));

        assert!(wait_for(|| !evicted.lock().is_empty()));
        assert_eq!(*evicted.lock(), vec![7]);
    }

    #[test]
    fn shutdown_clears_cache_and_is_idempotent() {
        let (cache, _clock) = manual_cache();
        cache.put(1, "one".into());
        let config = ExpiryConfig::new(Duration::from_secs(3600), Duration::from_secs(3600)).unwrap();
        let mut service = ExpiryService::start(Arc::clone(&cache), config, None).unwrap();
        assert!(service.is_running());

        service.shutdown();
        assert!(!service.is_running());
        assert!(cache.is_empty());

        cache.put(2, "two".into());
        service.shutdown();
        assert!(cache.exists(&2), "second shutdown must not clear again");
    }

    #[test]
    fn drop_stops_sweeping_and_clears() {
        let (cache, _clock) = manual_cache();
        cache.put(1, "one".into());
        {
            let config =
                ExpiryConfig::new(Duration::from_secs(3600), Duration::from_secs(3600)).unwrap();
            let _service = ExpiryService::start(Arc::clone(&cache), config, None).unwrap();
        }
        assert!(cache.is_empty());
        assert_eq!(Arc::strong_count(&cache), 1);
    }

    #[test]
    fn accessors_expose_configuration() {
        let (cache, _clock) = manual_cache();
        let config = ExpiryConfig::new(Duration::from_millis(250), Duration::from_secs(9)).unwrap();
        let service = ExpiryService::start(Arc::clone(&cache), config, None).unwrap();
        assert_eq!(service.config().interval(), Duration::from_millis(250));
        assert_eq!(service.config().max_age(), Duration::from_secs(9));
        assert!(Arc::ptr_eq(service.cache(), &cache));
    }
}
