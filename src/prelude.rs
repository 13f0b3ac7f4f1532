pub use crate::builder::{CacheBuilder, FromParts};
pub use crate::cache::TtlLruCache;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "service")]
pub use crate::error::ServiceError;
#[cfg(feature = "metrics")]
pub use crate::metrics::{snapshot::TtlLruMetricsSnapshot, traits::MetricsSnapshotProvider};
pub use crate::policy::{
    DerivedKey, DerivedKeyTime, DerivedTime, ExternalKey, ExternalKeyTime, ExtractionPolicy,
    IntrusiveKey,
};
#[cfg(feature = "service")]
pub use crate::service::{EvictCallback, ExpiryConfig, ExpiryService, Ticker};
