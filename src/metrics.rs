//! Metrics collection for the delivery pipeline
//!
//! Thread-safe counters using atomic operations; a snapshot can be taken
//! at any time without stopping the world.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the delivery pipeline
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    // Outcome statistics
    total_requests: AtomicU64,
    delivered: AtomicU64,
    not_modified: AtomicU64,
    not_found: AtomicU64,
    pass_through: AtomicU64,

    // Cache statistics
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    // Byte statistics
    bytes_served: AtomicU64,
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub delivered: u64,
    pub not_modified: u64,
    pub not_found: u64,
    pub pass_through: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub bytes_served: u64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivered(&self, bytes: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_not_modified(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.not_modified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass_through(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.pass_through.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            pass_through: self.pass_through.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            bytes_served: self.bytes_served.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_counters() {
        let metrics = DeliveryMetrics::new();
        metrics.record_delivered(100);
        metrics.record_delivered(50);
        metrics.record_not_modified();
        metrics.record_not_found();
        metrics.record_pass_through();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 5);
        assert_eq!(snap.delivered, 2);
        assert_eq!(snap.not_modified, 1);
        assert_eq!(snap.not_found, 1);
        assert_eq!(snap.pass_through, 1);
        assert_eq!(snap.bytes_served, 150);
    }

    #[test]
    fn test_cache_counters() {
        let metrics = DeliveryMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let snap = metrics.snapshot();
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.total_requests, 0);
    }
}
