//! Runtime-configured cache construction.
//!
//! The typed constructors ([`TtlLruCache::with_policy`] and friends) cannot
//! be misconfigured. [`CacheBuilder`] is for callers that collect the
//! extraction functions at runtime (from a registry, from optional config)
//! and only learn at build time whether the set they have matches the policy
//! they asked for.
//!
//! | Policy | `key_fn` | `get_time` + `set_time` |
//! |---|---|---|
//! | [`ExternalKeyTime`] | must be absent | must be absent |
//! | [`DerivedKey`] | required | must be absent |
//! | [`DerivedTime`] | must be absent | required |
//! | [`DerivedKeyTime`] | required | required |
//!
//! A getter without a setter (or the reverse) is always an error.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Instant;
//!
//! use ttl_lru::builder::CacheBuilder;
//! use ttl_lru::policy::DerivedKeyTime;
//!
//! struct Lease {
//!     id: u32,
//!     touched: Instant,
//! }
//!
//! let cache = CacheBuilder::<u32, Lease>::new()
//!     .capacity(64)
//!     .key_fn(|l: &Lease| l.id)
//!     .time_fns(|l: &Lease| l.touched, |l: &mut Lease, at| l.touched = at)
//!     .try_build::<DerivedKeyTime<u32, Lease>>()
//!     .unwrap();
//!
//! cache.put_value(Lease { id: 4, touched: Instant::now() });
//! assert!(cache.exists(&4));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::TtlLruCache;
use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::policy::{
    DerivedKey, DerivedKeyTime, DerivedTime, ExternalKeyTime, ExtractionPolicy, GetTimeFn, KeyFn,
    SetTimeFn,
};

/// Extraction functions collected by a [`CacheBuilder`].
pub struct PolicyParts<K, V> {
    pub key_fn: Option<KeyFn<K, V>>,
    pub get_time: Option<GetTimeFn<V>>,
    pub set_time: Option<SetTimeFn<V>>,
}

impl<K, V> PolicyParts<K, V> {
    fn describe(&self) -> String {
        format!(
            "key_fn: {}, get_time: {}, set_time: {}",
            presence(self.key_fn.is_some()),
            presence(self.get_time.is_some()),
            presence(self.set_time.is_some()),
        )
    }

    /// Takes the getter/setter pair, rejecting a half-configured pair.
    fn time_pair(&mut self) -> Result<Option<(GetTimeFn<V>, SetTimeFn<V>)>, ConfigError> {
        match (self.get_time.take(), self.set_time.take()) {
            (Some(get), Some(set)) => Ok(Some((get, set))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::new(
                "time getter supplied without a matching time setter",
            )),
            (None, Some(_)) => Err(ConfigError::new(
                "time setter supplied without a matching time getter",
            )),
        }
    }
}

impl<K, V> Default for PolicyParts<K, V> {
    fn default() -> Self {
        Self {
            key_fn: None,
            get_time: None,
            set_time: None,
        }
    }
}

impl<K, V> fmt::Debug for PolicyParts<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyParts")
            .field("key_fn", &self.key_fn.is_some())
            .field("get_time", &self.get_time.is_some())
            .field("set_time", &self.set_time.is_some())
            .finish()
    }
}

fn presence(set: bool) -> &'static str {
    if set { "set" } else { "unset" }
}

/// A policy that can be assembled from optional parts.
pub trait FromParts<K, V>: ExtractionPolicy<K, V> + Sized {
    fn from_parts(parts: PolicyParts<K, V>) -> Result<Self, ConfigError>;
}

impl<K: Clone, V> FromParts<K, V> for ExternalKeyTime {
    fn from_parts(mut parts: PolicyParts<K, V>) -> Result<Self, ConfigError> {
        let summary = parts.describe();
        match (parts.key_fn.take(), parts.time_pair()?) {
            (None, None) => Ok(ExternalKeyTime),
            _ => Err(ConfigError::new(format!(
                "ExternalKeyTime takes no extraction functions ({summary})"
            ))),
        }
    }
}

impl<K, V> FromParts<K, V> for DerivedKey<K, V> {
    fn from_parts(mut parts: PolicyParts<K, V>) -> Result<Self, ConfigError> {
        let summary = parts.describe();
        match (parts.key_fn.take(), parts.time_pair()?) {
            (Some(key_fn), None) => Ok(DerivedKey::from_shared(key_fn)),
            _ => Err(ConfigError::new(format!(
                "DerivedKey needs a key function and no time functions ({summary})"
            ))),
        }
    }
}

impl<K: Clone, V> FromParts<K, V> for DerivedTime<V> {
    fn from_parts(mut parts: PolicyParts<K, V>) -> Result<Self, ConfigError> {
        let summary = parts.describe();
        match (parts.key_fn.take(), parts.time_pair()?) {
            (None, Some((get, set))) => Ok(DerivedTime::from_shared(get, set)),
            _ => Err(ConfigError::new(format!(
                "DerivedTime needs time functions and no key function ({summary})"
            ))),
        }
    }
}

impl<K, V> FromParts<K, V> for DerivedKeyTime<K, V> {
    fn from_parts(mut parts: PolicyParts<K, V>) -> Result<Self, ConfigError> {
        let summary = parts.describe();
        match (parts.key_fn.take(), parts.time_pair()?) {
            (Some(key_fn), Some((get, set))) => Ok(DerivedKeyTime::from_shared(key_fn, get, set)),
            _ => Err(ConfigError::new(format!(
                "DerivedKeyTime needs a key function and time functions ({summary})"
            ))),
        }
    }
}

/// Collects capacity, clock and extraction functions, then builds a cache
/// for a chosen policy.
pub struct CacheBuilder<K, V, C = SystemClock> {
    capacity: usize,
    parts: PolicyParts<K, V>,
    clock: C,
}

impl<K, V> CacheBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            capacity: 0,
            parts: PolicyParts::default(),
            clock: SystemClock,
        }
    }
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> CacheBuilder<K, V, C> {
    /// Pre-allocates room for `capacity` entries. Not a limit: use
    /// [`TtlLruCache::shrink`] to bound the cache.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        self.parts.key_fn = Some(Arc::new(key_fn));
        self
    }

    pub fn get_time<G>(mut self, get_time: G) -> Self
    where
        G: Fn(&V) -> Instant + Send + Sync + 'static,
    {
        self.parts.get_time = Some(Arc::new(get_time));
        self
    }

    pub fn set_time<S>(mut self, set_time: S) -> Self
    where
        S: Fn(&mut V, Instant) + Send + Sync + 'static,
    {
        self.parts.set_time = Some(Arc::new(set_time));
        self
    }

    /// Sets getter and setter together.
    pub fn time_fns<G, S>(self, get_time: G, set_time: S) -> Self
    where
        G: Fn(&V) -> Instant + Send + Sync + 'static,
        S: Fn(&mut V, Instant) + Send + Sync + 'static,
    {
        self.get_time(get_time).set_time(set_time)
    }

    /// Swaps the time source.
    pub fn clock<C2: Clock>(self, clock: C2) -> CacheBuilder<K, V, C2> {
        CacheBuilder {
            capacity: self.capacity,
            parts: self.parts,
            clock,
        }
    }

    /// Builds a cache for policy `P`, failing if the collected functions
    /// do not match what `P` requires.
    pub fn try_build<P>(self) -> Result<TtlLruCache<K, V, P, C>, ConfigError>
    where
        K: Eq + Hash,
        P: FromParts<K, V>,
        C: Clock,
    {
        let policy = P::from_parts(self.parts)?;
        Ok(TtlLruCache::from_components(
            policy,
            self.clock,
            self.capacity,
        ))
    }
}

impl<K, V, C: fmt::Debug> fmt::Debug for CacheBuilder<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("parts", &self.parts)
            .field("clock", &self.clock)
            .finish()
    }
}
