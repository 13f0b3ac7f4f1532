//! Cache metrics (feature `metrics`).
//!
//! Recording, snapshotting and the counters themselves live in separate
//! modules so the cache engine only depends on the recorder trait.

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
