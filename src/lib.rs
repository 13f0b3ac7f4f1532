//! ttl-lru: a thread-safe in-process cache bounded by recency and age.
//!
//! Entries are kept in least-recently-used order. Callers trim the cache by
//! count with [`TtlLruCache::shrink`] and by idle time with
//! [`TtlLruCache::expire`]; the optional [`service`] module runs `expire` on
//! a timer. Where keys and timestamps live is chosen per cache through an
//! extraction [`policy`].
//!
//! ```
//! use std::time::Duration;
//!
//! use ttl_lru::prelude::*;
//!
//! let cache: TtlLruCache<u64, String> = TtlLruCache::new();
//! cache.put(1, "one".to_string());
//! cache.put(2, "two".to_string());
//! assert_eq!(cache.get(&1).as_deref(), Some("one"));
//!
//! cache.shrink(1);
//! assert!(cache.exists(&1));
//! assert_eq!(cache.expire(Duration::from_secs(60)), 0);
//! ```

pub mod builder;
pub mod cache;
pub mod clock;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "service")]
pub mod service;

pub use crate::builder::CacheBuilder;
pub use crate::cache::TtlLruCache;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::ds::{IntrusiveList, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "service")]
pub use crate::error::ServiceError;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::TtlLruMetricsSnapshot;
pub use crate::policy::{DerivedKey, DerivedKeyTime, DerivedTime, ExternalKeyTime};
