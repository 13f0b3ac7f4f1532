//! Error types for the ttl-lru library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when a cache or expiry service is assembled
//!   without the pieces its configuration requires (e.g. a derived-key policy
//!   with no key function, a zero sweep interval).
//! - [`InvariantError`]: Returned by `check_invariants` when the index and
//!   the recency list have drifted apart.
//! - `ServiceError` (feature `service`): Returned when the background expiry
//!   service cannot be started.
//!
//! Lookups never fail: a missing key is `None`, not an error.
//!
//! ## Example Usage
//!
//! ```
//! use ttl_lru::builder::CacheBuilder;
//! use ttl_lru::error::ConfigError;
//! use ttl_lru::policy::DerivedKey;
//!
//! // A derived-key cache needs a key function.
//! let missing: Result<_, ConfigError> =
//!     CacheBuilder::<u32, u32>::new().try_build::<DerivedKey<u32, u32>>();
//! assert!(missing.is_err());
//!
//! let ok = CacheBuilder::<u32, u32>::new()
//!     .key_fn(|v: &u32| *v)
//!     .try_build::<DerivedKey<u32, u32>>();
//! assert!(ok.is_ok());
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`TtlLruCache::check_invariants`](crate::cache::TtlLruCache::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration is incomplete or invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build)
/// and by `ExpiryConfig::new` when the service feature is enabled. This is a
/// setup-time error; a successfully built cache has no failing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Error returned when starting an
/// [`ExpiryService`](crate::service::ExpiryService) fails.
#[cfg(feature = "service")]
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid expiry configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn expiry thread: {0}")]
    Spawn(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
