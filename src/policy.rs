//! # Extraction Policies
//!
//! A policy tells the cache how to get a value's key, how to read its
//! last-access time and how to stamp a new one. The cache engine is written
//! once against [`ExtractionPolicy`]; the four storage shapes below are four
//! policy types, picked when the cache is constructed.
//!
//! | Key source | Time source | Policy | Entry stores |
//! |---|---|---|---|
//! | explicit at call site | engine-managed | [`ExternalKeyTime`] | key, value, timestamp |
//! | derived from value | engine-managed | [`DerivedKey`] | value, timestamp |
//! | explicit at call site | read from / written into value | [`DerivedTime`] | key, value |
//! | derived from value | read from / written into value | [`DerivedKeyTime`] | value |
//!
//! Explicit-key policies implement [`ExternalKey`] and unlock
//! [`TtlLruCache::put`](crate::cache::TtlLruCache::put); derived-key policies
//! implement [`IntrusiveKey`] and unlock
//! [`TtlLruCache::put_value`](crate::cache::TtlLruCache::put_value). The
//! choice is made by the type system, so there is no branch on the hot path.
//!
//! ## Example
//!
//! ```
//! use std::time::Instant;
//!
//! use ttl_lru::cache::TtlLruCache;
//! use ttl_lru::policy::DerivedKeyTime;
//!
//! #[derive(Clone)]
//! struct Session {
//!     id: u64,
//!     seen: Instant,
//! }
//!
//! let policy = DerivedKeyTime::new(
//!     |s: &Session| s.id,
//!     |s: &Session| s.seen,
//!     |s: &mut Session, at| s.seen = at,
//! );
//! let cache: TtlLruCache<u64, Session, _> = TtlLruCache::with_policy(policy);
//! cache.put_value(Session { id: 7, seen: Instant::now() });
//! assert!(cache.exists(&7));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Shared key extraction function.
pub type KeyFn<K, V> = Arc<dyn Fn(&V) -> K + Send + Sync>;
/// Shared last-access getter.
pub type GetTimeFn<V> = Arc<dyn Fn(&V) -> Instant + Send + Sync>;
/// Shared last-access setter.
pub type SetTimeFn<V> = Arc<dyn Fn(&mut V, Instant) + Send + Sync>;

/// Capabilities every policy provides to the cache engine.
pub trait ExtractionPolicy<K, V> {
    /// What the cache stores per key.
    type Entry;

    /// Key of a stored entry. Called on eviction to drop the index record.
    fn key_of(&self, entry: &Self::Entry) -> K;

    fn value_of<'e>(&self, entry: &'e Self::Entry) -> &'e V;

    fn last_access(&self, entry: &Self::Entry) -> Instant;

    fn set_last_access(&self, entry: &mut Self::Entry, at: Instant);
}

/// Policies whose keys are supplied by the caller.
pub trait ExternalKey<K, V>: ExtractionPolicy<K, V> {
    /// Builds an entry stamped with `now`.
    fn wrap(&self, key: K, value: V, now: Instant) -> Self::Entry;
}

/// Policies whose keys are derived from the value.
pub trait IntrusiveKey<K, V>: ExtractionPolicy<K, V> {
    fn derive_key(&self, value: &V) -> K;

    /// Builds an entry stamped with `now`.
    fn wrap_value(&self, value: V, now: Instant) -> Self::Entry;
}

// ---------------------------------------------------------------------------
// Entry shapes
// ---------------------------------------------------------------------------

/// Entry for [`ExternalKeyTime`]: key, value and engine-managed timestamp.
#[derive(Debug)]
pub struct KeyedStamped<K, V> {
    key: K,
    value: V,
    last_access: Instant,
}

/// Entry for [`DerivedKey`]: value and engine-managed timestamp.
#[derive(Debug)]
pub struct Stamped<V> {
    value: V,
    last_access: Instant,
}

/// Entry for [`DerivedTime`]: key and value; the timestamp lives in the value.
#[derive(Debug)]
pub struct Keyed<K, V> {
    key: K,
    value: V,
}

// ---------------------------------------------------------------------------
// ExternalKeyTime
// ---------------------------------------------------------------------------

/// Key passed at the call site, timestamp kept by the cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalKeyTime;

impl<K: Clone, V> ExtractionPolicy<K, V> for ExternalKeyTime {
    type Entry = KeyedStamped<K, V>;

    #[inline]
    fn key_of(&self, entry: &Self::Entry) -> K {
        entry.key.clone()
    }

    #[inline]
    fn value_of<'e>(&self, entry: &'e Self::Entry) -> &'e V {
        &entry.value
    }

    #[inline]
    fn last_access(&self, entry: &Self::Entry) -> Instant {
        entry.last_access
    }

    #[inline]
    fn set_last_access(&self, entry: &mut Self::Entry, at: Instant) {
        entry.last_access = at;
    }
}

impl<K: Clone, V> ExternalKey<K, V> for ExternalKeyTime {
    #[inline]
    fn wrap(&self, key: K, value: V, now: Instant) -> Self::Entry {
        KeyedStamped {
            key,
            value,
            last_access: now,
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedKey
// ---------------------------------------------------------------------------

/// Key computed from the value, timestamp kept by the cache.
pub struct DerivedKey<K, V> {
    key_fn: KeyFn<K, V>,
}

impl<K, V> DerivedKey<K, V> {
    pub fn new<F>(key_fn: F) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        Self::from_shared(Arc::new(key_fn))
    }

    pub fn from_shared(key_fn: KeyFn<K, V>) -> Self {
        Self { key_fn }
    }
}

impl<K, V> ExtractionPolicy<K, V> for DerivedKey<K, V> {
    type Entry = Stamped<V>;

    #[inline]
    fn key_of(&self, entry: &Self::Entry) -> K {
        (self.key_fn)(&entry.value)
    }

    #[inline]
    fn value_of<'e>(&self, entry: &'e Self::Entry) -> &'e V {
        &entry.value
    }

    #[inline]
    fn last_access(&self, entry: &Self::Entry) -> Instant {
        entry.last_access
    }

    #[inline]
    fn set_last_access(&self, entry: &mut Self::Entry, at: Instant) {
        entry.last_access = at;
    }
}

impl<K, V> IntrusiveKey<K, V> for DerivedKey<K, V> {
    #[inline]
    fn derive_key(&self, value: &V) -> K {
        (self.key_fn)(value)
    }

    #[inline]
    fn wrap_value(&self, value: V, now: Instant) -> Self::Entry {
        Stamped {
            value,
            last_access: now,
        }
    }
}

impl<K, V> Clone for DerivedKey<K, V> {
    fn clone(&self) -> Self {
        Self {
            key_fn: Arc::clone(&self.key_fn),
        }
    }
}

impl<K, V> fmt::Debug for DerivedKey<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DerivedTime
// ---------------------------------------------------------------------------

/// Key passed at the call site, timestamp read from and written into the
/// value.
pub struct DerivedTime<V> {
    get_time: GetTimeFn<V>,
    set_time: SetTimeFn<V>,
}

impl<V> DerivedTime<V> {
    pub fn new<G, S>(get_time: G, set_time: S) -> Self
    where
        G: Fn(&V) -> Instant + Send + Sync + 'static,
        S: Fn(&mut V, Instant) + Send + Sync + 'static,
    {
        Self::from_shared(Arc::new(get_time), Arc::new(set_time))
    }

    pub fn from_shared(get_time: GetTimeFn<V>, set_time: SetTimeFn<V>) -> Self {
        Self { get_time, set_time }
    }
}

impl<K: Clone, V> ExtractionPolicy<K, V> for DerivedTime<V> {
    type Entry = Keyed<K, V>;

    #[inline]
    fn key_of(&self, entry: &Self::Entry) -> K {
        entry.key.clone()
    }

    #[inline]
    fn value_of<'e>(&self, entry: &'e Self::Entry) -> &'e V {
        &entry.value
    }

    #[inline]
    fn last_access(&self, entry: &Self::Entry) -> Instant {
        (self.get_time)(&entry.value)
    }

    #[inline]
    fn set_last_access(&self, entry: &mut Self::Entry, at: Instant) {
        (self.set_time)(&mut entry.value, at);
    }
}

impl<K: Clone, V> ExternalKey<K, V> for DerivedTime<V> {
    #[inline]
    fn wrap(&self, key: K, mut value: V, now: Instant) -> Self::Entry {
        (self.set_time)(&mut value, now);
        Keyed { key, value }
    }
}

impl<V> Clone for DerivedTime<V> {
    fn clone(&self) -> Self {
        Self {
            get_time: Arc::clone(&self.get_time),
            set_time: Arc::clone(&self.set_time),
        }
    }
}

impl<V> fmt::Debug for DerivedTime<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedTime").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// DerivedKeyTime
// ---------------------------------------------------------------------------

/// Key and timestamp both live in the value; the cache stores the value
/// alone.
pub struct DerivedKeyTime<K, V> {
    key_fn: KeyFn<K, V>,
    get_time: GetTimeFn<V>,
    set_time: SetTimeFn<V>,
}

impl<K, V> DerivedKeyTime<K, V> {
    pub fn new<F, G, S>(key_fn: F, get_time: G, set_time: S) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
        G: Fn(&V) -> Instant + Send + Sync + 'static,
        S: Fn(&mut V, Instant) + Send + Sync + 'static,
    {
        Self::from_shared(Arc::new(key_fn), Arc::new(get_time), Arc::new(set_time))
    }

    pub fn from_shared(
        key_fn: KeyFn<K, V>,
        get_time: GetTimeFn<V>,
        set_time: SetTimeFn<V>,
    ) -> Self {
        Self {
            key_fn,
            get_time,
            set_time,
        }
    }
}

impl<K, V> ExtractionPolicy<K, V> for DerivedKeyTime<K, V> {
    type Entry = V;

    #[inline]
    fn key_of(&self, entry: &V) -> K {
        (self.key_fn)(entry)
    }

    #[inline]
    fn value_of<'e>(&self, entry: &'e V) -> &'e V {
        entry
    }

    #[inline]
    fn last_access(&self, entry: &V) -> Instant {
        (self.get_time)(entry)
    }

    #[inline]
    fn set_last_access(&self, entry: &mut V, at: Instant) {
        (self.set_time)(entry, at);
    }
}

impl<K, V> IntrusiveKey<K, V> for DerivedKeyTime<K, V> {
    #[inline]
    fn derive_key(&self, value: &V) -> K {
        (self.key_fn)(value)
    }

    #[inline]
    fn wrap_value(&self, mut value: V, now: Instant) -> V {
        (self.set_time)(&mut value, now);
        value
    }
}

impl<K, V> Clone for DerivedKeyTime<K, V> {
    fn clone(&self) -> Self {
        Self {
            key_fn: Arc::clone(&self.key_fn),
            get_time: Arc::clone(&self.get_time),
            set_time: Arc::clone(&self.set_time),
        }
    }
}

impl<K, V> fmt::Debug for DerivedKeyTime<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyTime").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        id: u32,
        seen: Instant,
    }

    fn record_policy() -> DerivedKeyTime<u32, Record> {
        DerivedKeyTime::new(
            |r: &Record| r.id,
            |r: &Record| r.seen,
            |r: &mut Record, at| r.seen = at,
        )
    }

    #[test]
    fn external_key_time_stores_key_and_stamp() {
        let now = Instant::now();
        let policy = ExternalKeyTime;
        let mut entry = ExternalKey::<&str, i32>::wrap(&policy, "a", 1, now);
        assert_eq!(ExtractionPolicy::<&str, i32>::key_of(&policy, &entry), "a");
        assert_eq!(*ExtractionPolicy::<&str, i32>::value_of(&policy, &entry), 1);
        assert_eq!(ExtractionPolicy::<&str, i32>::last_access(&policy, &entry), now);

        let later = now + Duration::from_secs(1);
        ExtractionPolicy::<&str, i32>::set_last_access(&policy, &mut entry, later);
        assert_eq!(ExtractionPolicy::<&str, i32>::last_access(&policy, &entry), later);
    }

    #[test]
    fn derived_key_reads_key_from_value() {
        let policy: DerivedKey<usize, String> = DerivedKey::new(|s: &String| s.len());
        let now = Instant::now();
        let entry = policy.wrap_value("four".to_string(), now);
        assert_eq!(policy.derive_key(&"abc".to_string()), 3);
        assert_eq!(policy.key_of(&entry), 4);
        assert_eq!(policy.last_access(&entry), now);
    }

    #[test]
    fn derived_time_writes_stamp_into_value() {
        let policy = DerivedTime::new(|r: &Record| r.seen, |r: &mut Record, at| r.seen = at);
        let past = Instant::now();
        let now = past + Duration::from_millis(5);
        let entry = ExternalKey::<u8, Record>::wrap(&policy, 9, Record { id: 1, seen: past }, now);

        assert_eq!(ExtractionPolicy::<u8, Record>::key_of(&policy, &entry), 9);
        assert_eq!(ExtractionPolicy::<u8, Record>::value_of(&policy, &entry).seen, now);
        assert_eq!(ExtractionPolicy::<u8, Record>::last_access(&policy, &entry), now);
    }

    #[test]
    fn derived_key_time_entry_is_the_value() {
        let policy = record_policy();
        let past = Instant::now();
        let now = past + Duration::from_secs(2);
        let mut entry = policy.wrap_value(Record { id: 5, seen: past }, now);

        assert_eq!(entry.seen, now);
        assert_eq!(policy.key_of(&entry), 5);

        let later = now + Duration::from_secs(1);
        policy.set_last_access(&mut entry, later);
        assert_eq!(policy.value_of(&entry).seen, later);
    }

    #[test]
    fn policies_clone_share_functions() {
        let policy = record_policy();
        let copy = policy.clone();
        let record = Record {
            id: 42,
            seen: Instant::now(),
        };
        assert_eq!(copy.derive_key(&record), policy.derive_key(&record));
        assert!(format!("{:?}", copy).contains("DerivedKeyTime"));
    }
}
