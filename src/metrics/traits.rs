//! # Metrics Traits
//!
//! Recording and snapshotting are split into two small traits. The cache
//! core only *records* (it owns a recorder behind its mutex); callers only
//! *read* through [`MetricsSnapshotProvider`].
//!
//! ```text
//!   TtlLruCore ──record_*()──► TtlLruMetrics (plain counters, under the cache lock)
//!                                   │
//!   TtlLruCache::snapshot() ◄───────┘  copies counters + len gauge
//! ```

/// Counters recorded by the TTL-LRU cache core.
///
/// All methods take `&mut self`: the recorder lives inside the cache core
/// and is only touched while the cache mutex is held.
pub trait TtlLruMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_put_new(&mut self);
    fn record_put_replace(&mut self);
    fn record_erase_found(&mut self);
    fn record_shrink_call(&mut self);
    fn record_shrink_evicted(&mut self, count: u64);
    fn record_expire_call(&mut self);
    fn record_expired(&mut self, count: u64);
    fn record_clear(&mut self);
}

/// Produces a point-in-time copy of a component's metrics.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
