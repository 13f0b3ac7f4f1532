use crate::metrics::traits::TtlLruMetricsRecorder;

#[derive(Debug, Default, Clone, Copy)]
pub struct TtlLruMetrics {
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
}

impl TtlLruMetricsRecorder for TtlLruMetrics {
    #[inline]
    fn record_get_hit(&mut self) {
        self.get_hits += 1;
    }

    #[inline]
    fn record_get_miss(&mut self) {
        self.get_misses += 1;
    }

    #[inline]
    fn record_put_new(&mut self) {
        self.put_new += 1;
    }

    #[inline]
    fn record_put_replace(&mut self) {
        self.put_replace += 1;
    }

    #[inline]
    fn record_erase_found(&mut self) {
        self.erase_found += 1;
    }

    #[inline]
    fn record_shrink_call(&mut self) {
        self.shrink_calls += 1;
    }

    #[inline]
    fn record_shrink_evicted(&mut self, count: u64) {
        self.shrink_evicted += count;
    }

    #[inline]
    fn record_expire_call(&mut self) {
        self.expire_calls += 1;
    }

    #[inline]
    fn record_expired(&mut self, count: u64) {
        self.expired_entries += count;
    }

    #[inline]
    fn record_clear(&mut self) {
        self.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut metrics = TtlLruMetrics::default();
        metrics.record_get_hit();
        metrics.record_get_hit();
        metrics.record_get_miss();
        metrics.record_shrink_evicted(3);
        metrics.record_shrink_evicted(2);
        metrics.record_expired(4);

        assert_eq!(metrics.get_hits, 2);
        assert_eq!(metrics.get_misses, 1);
        assert_eq!(metrics.shrink_evicted, 5);
        assert_eq!(metrics.expired_entries, 4);
        assert_eq!(metrics.clears, 0);
    }
}
