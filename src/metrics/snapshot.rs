use crate::metrics::metrics_impl::TtlLruMetrics;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TtlLruMetricsSnapshot {
    pub get_hits: u64,
    pub get_misses: u64,

    pub put_new: u64,
    pub put_replace: u64,
    pub erase_found: u64,

    pub shrink_calls: u64,
    pub shrink_evicted: u64,
    pub expire_calls: u64,
    pub expired_entries: u64,
    pub clears: u64,

    // gauge captured at snapshot time
    pub cache_len: usize,
}

impl TtlLruMetricsSnapshot {
    pub(crate) fn capture(metrics: &TtlLruMetrics, cache_len: usize) -> Self {
        Self {
            get_hits: metrics.get_hits,
            get_misses: metrics.get_misses,
            put_new: metrics.put_new,
            put_replace: metrics.put_replace,
            erase_found: metrics.erase_found,
            shrink_calls: metrics.shrink_calls,
            shrink_evicted: metrics.shrink_evicted,
            expire_calls: metrics.expire_calls,
            expired_entries: metrics.expired_entries,
            clears: metrics.clears,
            cache_len,
        }
    }

    /// Hits over total lookups, or `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.get_hits + self.get_misses;
        if lookups == 0 {
            0.0
        } else {
            self.get_hits as f64 / lookups as f64
        }
    }
}
