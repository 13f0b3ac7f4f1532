//! # LRU + TTL Cache Engine
//!
//! A thread-safe cache that bounds its contents two independent ways: by
//! count ([`shrink`](TtlLruCache::shrink), least recently used first) and by
//! age ([`expire`](TtlLruCache::expire), entries not touched within a
//! maximum age). Reads count as uses: [`get`](TtlLruCache::get) promotes the
//! entry and refreshes its last-access time.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                    TtlLruCache<K, V, P, C>                           │
//!   │                                                                      │
//!   │   policy: P  (key / time extraction)     clock: C     empty: Atomic  │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │              Mutex<TtlLruCore<K, V, P>>                      │   │
//!   │   │                                                              │   │
//!   │   │   FxHashMap<K, SlotId>          (index)                      │   │
//!   │   │        │        │        │                                   │   │
//!   │   │        ▼        ▼        ▼                                   │   │
//!   │   │   IntrusiveList<P::Entry>       (recency order)              │   │
//!   │   │   head ──► [e1] ◄──► [e2] ◄──► [e3] ◄── tail                 │   │
//!   │   │    (MRU, newest last_access)       (LRU, oldest last_access) │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The arena behind the list owns every entry by value; the index and the
//! list links hold only generation-checked `SlotId`s, so a handle can never
//! outlive the entry it pointed at.
//!
//! ## Why a back-to-front scan is enough for `expire`
//!
//! Every promotion moves an entry to the front *and* stamps it with the
//! current time, both under the same lock. Last-access times are therefore
//! non-increasing from front to back, and the stale entries always form a
//! contiguous run at the back:
//!
//! ```text
//!   threshold = now - max_age
//!
//!   head ──► [t=90] ◄──► [t=80] ◄──► [t=40] ◄──► [t=10] ◄── tail
//!                           ▲           └──── stale ────┘
//!                           first entry from the back with t >= threshold (50)
//! ```
//!
//! `expire` walks from the tail while `last_access < threshold`, collecting
//! the keys of the run. It then detaches the run with one `split_off` and
//! drops those keys from the index. `shrink` cuts its run the same way.
//! `on_evict` is only called once index and list agree again, so a callback
//! that panics leaves a consistent cache behind.
//!
//! ## Locking
//!
//! One `parking_lot::Mutex` guards index and list together; every public
//! operation takes it, so all operations are linearizable and mutually
//! exclusive. There is no reader fast path because even `get` reorders the
//! list. Values evicted by `shrink`, `expire`, batch erase and `clear` are
//! dropped *after* the lock is released. `put` drops a replaced value while
//! still holding the lock, before the new one becomes visible.
//!
//! `is_empty` reads an atomic flag refreshed by every mutation and does not
//! lock; it can be momentarily stale under contention. `len` and `exists`
//! always lock.
//!
//! ## Re-entrancy
//!
//! The `on_evict` callback of [`expire_with`](TtlLruCache::expire_with) and
//! the closure passed to [`get_with`](TtlLruCache::get_with) run while the
//! lock is held. They must not call back into the same cache: the mutex is
//! not re-entrant and the call deadlocks.
//!
//! ## Example
//!
//! ```
//! use ttl_lru::cache::TtlLruCache;
//!
//! let cache: TtlLruCache<u32, &str> = TtlLruCache::new();
//! for (k, v) in [(1, "one"), (2, "two"), (3, "three")] {
//!     cache.put(k, v);
//! }
//!
//! // Reading 1 makes it most recently used.
//! assert_eq!(cache.get(&1), Some("one"));
//!
//! // Keep the two most recently used entries.
//! assert_eq!(cache.shrink(2), 1);
//! assert!(cache.exists(&1));
//! assert!(cache.exists(&3));
//! assert!(!cache.exists(&2));
//! ```

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::ds::{IntrusiveList, SlotId};
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::TtlLruMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::TtlLruMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsSnapshotProvider, TtlLruMetricsRecorder};
use crate::policy::{ExternalKey, ExternalKeyTime, ExtractionPolicy, IntrusiveKey};

/// Index + recency list. Single-threaded; [`TtlLruCache`] wraps it in a
/// mutex and supplies the policy and the current time.
struct TtlLruCore<K, V, P>
where
    P: ExtractionPolicy<K, V>,
{
    index: FxHashMap<K, SlotId>,
    list: IntrusiveList<P::Entry>,
    #[cfg(feature = "metrics")]
    metrics: TtlLruMetrics,
    _value: PhantomData<fn() -> V>,
}

impl<K, V, P> TtlLruCore<K, V, P>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
{
    fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: IntrusiveList::with_capacity(capacity),
            #[cfg(feature = "metrics")]
            metrics: TtlLruMetrics::default(),
            _value: PhantomData,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Erase-then-insert. A previous entry under `key` is unlinked and
    /// dropped before the new entry goes in at the front.
    fn insert(&mut self, key: K, entry: P::Entry) {
        if let Some(stale) = self.index.remove(&key) {
            drop(self.list.remove(stale));
            #[cfg(feature = "metrics")]
            self.metrics.record_put_replace();
        } else {
            #[cfg(feature = "metrics")]
            self.metrics.record_put_new();
        }
        let id = self.list.push_front(entry);
        self.index.insert(key, id);
    }

    /// Promotes `key` to the front and stamps it with `now`.
    fn touch(&mut self, policy: &P, key: &K, now: Instant) -> Option<&P::Entry> {
        let Some(&id) = self.index.get(key) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        };
        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.list.move_to_front(id);
        let entry = self.list.get_mut(id)?;
        policy.set_last_access(entry, now);
        Some(&*entry)
    }

    fn remove(&mut self, key: &K) -> Option<P::Entry> {
        let id = self.index.remove(key)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_erase_found();
        self.list.remove(id)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Scans from the back while `stale` holds, at most `limit` entries.
    /// Returns the front-most stale id and the keys of the run, least
    /// recently used first. Read-only: a panicking extractor leaves the core
    /// as it was.
    fn stale_run<F>(&self, policy: &P, limit: usize, mut stale: F) -> Option<(SlotId, Vec<K>)>
    where
        F: FnMut(&P::Entry) -> bool,
    {
        let mut boundary = None;
        let mut keys = Vec::new();
        for (id, entry) in self.list.iter_entries_rev().take(limit) {
            if !stale(entry) {
                break;
            }
            keys.push(policy.key_of(entry));
            boundary = Some(id);
        }
        boundary.map(|id| (id, keys))
    }

    /// Cuts the run starting at `boundary` off the list and drops `keys`
    /// from the index. No policy code runs here.
    fn detach_run(&mut self, boundary: SlotId, keys: &[K]) -> Vec<P::Entry> {
        let entries = self.list.split_off(boundary);
        for key in keys {
            self.index.remove(key);
        }
        entries
    }

    fn shrink(&mut self, policy: &P, max_size: usize) -> Vec<P::Entry> {
        #[cfg(feature = "metrics")]
        self.metrics.record_shrink_call();

        let excess = self.len().saturating_sub(max_size);
        let evicted = match self.stale_run(policy, excess, |_| true) {
            Some((boundary, keys)) => self.detach_run(boundary, &keys),
            None => Vec::new(),
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_shrink_evicted(evicted.len() as u64);
        evicted
    }

    /// Unlinks the run of entries at the back whose last access is older
    /// than `threshold`. Returns the evicted keys (least recently used first)
    /// alongside the entries; index and list already agree when it returns.
    fn expire(&mut self, policy: &P, threshold: Instant) -> (Vec<K>, Vec<P::Entry>) {
        #[cfg(feature = "metrics")]
        self.metrics.record_expire_call();

        let stale = |entry: &P::Entry| policy.last_access(entry) < threshold;
        let (keys, expired) = match self.stale_run(policy, usize::MAX, stale) {
            Some((boundary, keys)) => {
                let expired = self.detach_run(boundary, &keys);
                (keys, expired)
            },
            None => (Vec::new(), Vec::new()),
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_expired(expired.len() as u64);
        (keys, expired)
    }

    /// Empties the core and hands back the old list so the caller can drop
    /// it outside the lock.
    fn take_all(&mut self) -> IntrusiveList<P::Entry> {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
        self.index.clear();
        std::mem::take(&mut self.list)
    }

    fn keys_by_recency(&self, policy: &P) -> Vec<K> {
        self.list.iter().map(|entry| policy.key_of(entry)).collect()
    }

    fn check_invariants(&self, policy: &P) -> Result<(), InvariantError> {
        self.list.check_invariants()?;

        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but recency list holds {} entries",
                self.index.len(),
                self.list.len()
            )));
        }

        for (key, &id) in &self.index {
            let entry = self
                .list
                .get(id)
                .ok_or_else(|| InvariantError::new("index handle does not resolve"))?;
            if policy.key_of(entry) != *key {
                return Err(InvariantError::new(
                    "index handle resolves to an entry with a different key",
                ));
            }
        }
        Ok(())
    }
}

/// Thread-safe LRU cache with TTL expiration.
///
/// `P` selects where keys and last-access times come from (see
/// [`policy`](crate::policy)); `C` is the time source.
pub struct TtlLruCache<K, V, P = ExternalKeyTime, C = SystemClock>
where
    P: ExtractionPolicy<K, V>,
{
    core: Mutex<TtlLruCore<K, V, P>>,
    empty: AtomicBool,
    policy: P,
    clock: C,
}

impl<K, V> TtlLruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache with caller-supplied keys and cache-managed
    /// timestamps.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Like [`new`](Self::new), reserving room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_components(ExternalKeyTime, SystemClock, capacity)
    }
}

impl<K, V> Default for TtlLruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, P> TtlLruCache<K, V, P, SystemClock>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
{
    /// Creates an empty cache using `policy` and the system clock.
    pub fn with_policy(policy: P) -> Self {
        Self::from_components(policy, SystemClock, 0)
    }
}

impl<K, V, P, C> TtlLruCache<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    /// Creates an empty cache using `policy` and `clock`.
    pub fn with_policy_and_clock(policy: P, clock: C) -> Self {
        Self::from_components(policy, clock, 0)
    }

    pub(crate) fn from_components(policy: P, clock: C, capacity: usize) -> Self {
        Self {
            core: Mutex::new(TtlLruCore::with_capacity(capacity)),
            empty: AtomicBool::new(true),
            policy,
            clock,
        }
    }

    #[inline]
    fn publish_emptiness(&self, core: &TtlLruCore<K, V, P>) {
        self.empty.store(core.is_empty(), Ordering::Release);
    }

    fn insert_entry(&self, key: K, wrap: impl FnOnce(Instant) -> P::Entry) {
        let mut core = self.core.lock();
        let entry = wrap(self.clock.now());
        core.insert(key, entry);
        self.publish_emptiness(&core);
    }

    /// Returns a clone of the value under `key`, promoting it to most
    /// recently used and refreshing its last-access time.
    ///
    /// # Example
    ///
    /// ```
    /// use ttl_lru::cache::TtlLruCache;
    ///
    /// let cache: TtlLruCache<&str, i32> = TtlLruCache::new();
    /// cache.put("a", 1);
    /// assert_eq!(cache.get(&"a"), Some(1));
    /// assert_eq!(cache.get(&"b"), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Like [`get`](Self::get), but hands a reference to `f` under the lock
    /// instead of cloning. `f` must not touch this cache.
    pub fn get_with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        let mut core = self.core.lock();
        let now = self.clock.now();
        let entry = core.touch(&self.policy, key, now)?;
        Some(f(self.policy.value_of(entry)))
    }

    /// Removes `key` if present. Returns whether an entry was removed.
    pub fn erase(&self, key: &K) -> bool {
        let removed = {
            let mut core = self.core.lock();
            let removed = core.remove(key);
            self.publish_emptiness(&core);
            removed
        };
        removed.is_some()
    }

    /// Erases the key extracted from each item, under one lock acquisition.
    ///
    /// Useful when the caller already holds the values and only needs their
    /// keys gone. Every key is extracted before the lock is taken.
    pub fn erase_by<I, F>(&self, items: I, extract: F) -> usize
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> K,
    {
        let keys: Vec<K> = items.into_iter().map(extract).collect();
        let removed: Vec<P::Entry> = {
            let mut core = self.core.lock();
            let removed = keys.iter().filter_map(|key| core.remove(key)).collect();
            self.publish_emptiness(&core);
            removed
        };
        removed.len()
    }

    /// Erases every key in `keys`, under one lock acquisition.
    pub fn erase_keys<I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        self.erase_by(keys, |key| key)
    }

    /// Evicts least recently used entries until at most `max_size` remain.
    /// Returns the number evicted; `max_size >= len()` is a no-op.
    pub fn shrink(&self, max_size: usize) -> usize {
        let evicted = {
            let mut core = self.core.lock();
            let evicted = core.shrink(&self.policy, max_size);
            self.publish_emptiness(&core);
            evicted
        };
        let count = evicted.len();
        drop(evicted);

        if count > 0 {
            trace!(evicted = count, max_size, "shrink evicted entries");
        }
        count
    }

    /// Evicts every entry whose last access is older than `max_age`.
    /// Returns the number evicted.
    pub fn expire(&self, max_age: Duration) -> usize {
        self.expire_with(max_age, |_| {})
    }

    /// Like [`expire`](Self::expire), calling `on_evict` with each evicted
    /// key, least recently used first.
    ///
    /// `on_evict` runs while the cache lock is held and must not call back
    /// into this cache. The evicted values themselves are dropped after the
    /// lock is released.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use ttl_lru::cache::TtlLruCache;
    /// use ttl_lru::clock::ManualClock;
    /// use ttl_lru::policy::ExternalKeyTime;
    ///
    /// let clock = ManualClock::new();
    /// let cache = TtlLruCache::with_policy_and_clock(ExternalKeyTime, clock.clone());
    /// cache.put("old", 1);
    /// clock.advance(Duration::from_secs(10));
    /// cache.put("new", 2);
    ///
    /// let mut gone = Vec::new();
    /// cache.expire_with(Duration::from_secs(5), |key| gone.push(*key));
    /// assert_eq!(gone, vec!["old"]);
    /// assert!(cache.exists(&"new"));
    /// ```
    pub fn expire_with<F>(&self, max_age: Duration, mut on_evict: F) -> usize
    where
        F: FnMut(&K),
    {
        let expired = {
            let mut core = self.core.lock();
            let Some(threshold) = self.clock.now().checked_sub(max_age) else {
                return 0;
            };
            let (keys, expired) = core.expire(&self.policy, threshold);
            self.publish_emptiness(&core);
            for key in &keys {
                on_evict(key);
            }
            expired
        };
        let count = expired.len();
        drop(expired);

        if count > 0 {
            trace!(expired = count, ?max_age, "expired stale entries");
        }
        count
    }

    /// Returns `true` if `key` is present. Does not affect recency.
    pub fn exists(&self, key: &K) -> bool {
        self.core.lock().contains(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.core.lock().len()
    }

    /// Lock-free emptiness check; may lag a concurrent mutation.
    pub fn is_empty(&self) -> bool {
        self.empty.load(Ordering::Acquire)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let drained = {
            let mut core = self.core.lock();
            let drained = core.take_all();
            self.publish_emptiness(&core);
            drained
        };
        drop(drained);
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.core.lock().keys_by_recency(&self.policy)
    }

    /// Verifies that index and recency list agree: same size, every index
    /// handle resolves to an entry carrying that key, and the list links are
    /// consistent.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let core = self.core.lock();
        core.check_invariants(&self.policy)?;
        if self.empty.load(Ordering::Acquire) != core.is_empty() {
            return Err(InvariantError::new("cached emptiness flag is out of date"));
        }
        Ok(())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<K, V, P, C> TtlLruCache<K, V, P, C>
where
    K: Eq + Hash + Clone,
    P: ExternalKey<K, V>,
    C: Clock,
{
    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// An existing entry under `key` is removed first (and dropped) rather
    /// than updated in place; the new entry does not grow `len()`.
    pub fn put(&self, key: K, value: V) {
        let stored_key = key.clone();
        self.insert_entry(stored_key, |now| self.policy.wrap(key, value, now));
    }
}

impl<K, V, P, C> TtlLruCache<K, V, P, C>
where
    K: Eq + Hash,
    P: IntrusiveKey<K, V>,
    C: Clock,
{
    /// Stores `value` under the key the policy derives from it.
    ///
    /// ```
    /// use ttl_lru::cache::TtlLruCache;
    /// use ttl_lru::policy::DerivedKey;
    ///
    /// let cache = TtlLruCache::with_policy(DerivedKey::new(|v: &u32| *v % 10));
    /// cache.put_value(13);
    /// cache.put_value(23);
    /// assert_eq!(cache.len(), 1);
    /// assert_eq!(cache.get(&3), Some(23));
    /// ```
    pub fn put_value(&self, value: V) {
        let key = self.policy.derive_key(&value);
        self.insert_entry(key, |now| self.policy.wrap_value(value, now));
    }
}

#[cfg(feature = "metrics")]
impl<K, V, P, C> TtlLruCache<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    pub fn metrics_snapshot(&self) -> TtlLruMetricsSnapshot {
        let core = self.core.lock();
        TtlLruMetricsSnapshot::capture(&core.metrics, core.len())
    }
}

#[cfg(feature = "metrics")]
impl<K, V, P, C> MetricsSnapshotProvider<TtlLruMetricsSnapshot> for TtlLruCache<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V>,
    C: Clock,
{
    fn snapshot(&self) -> TtlLruMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V, P, C> fmt::Debug for TtlLruCache<K, V, P, C>
where
    K: Eq + Hash,
    P: ExtractionPolicy<K, V> + fmt::Debug,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.core.lock().len();
        f.debug_struct("TtlLruCache")
            .field("len", &len)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
