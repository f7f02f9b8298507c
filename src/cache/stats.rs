//! Cache operation counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache and store traffic.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Reads served from the in-memory mirror.
    pub cache_reads: AtomicU64,
    /// Reads forwarded to the backing store.
    pub store_reads: AtomicU64,
    /// Mutations applied to the in-memory mirror.
    pub cache_writes: AtomicU64,
    /// Mutations that reached the backing store.
    pub store_writes: AtomicU64,
    /// Store-bound mutations that failed on the fire-and-forget lane.
    pub store_write_failures: AtomicU64,
}

impl CacheStats {
    /// Create new stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of reads served from the mirror (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.cache_reads.load(Ordering::Relaxed);
        let misses = self.store_reads.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.cache_reads.store(0, Ordering::Relaxed);
        self.store_reads.store(0, Ordering::Relaxed);
        self.cache_writes.store(0, Ordering::Relaxed);
        self.store_writes.store(0, Ordering::Relaxed);
        self.store_write_failures.store(0, Ordering::Relaxed);
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            cache_reads: AtomicU64::new(self.cache_reads.load(Ordering::Relaxed)),
            store_reads: AtomicU64::new(self.store_reads.load(Ordering::Relaxed)),
            cache_writes: AtomicU64::new(self.cache_writes.load(Ordering::Relaxed)),
            store_writes: AtomicU64::new(self.store_writes.load(Ordering::Relaxed)),
            store_write_failures: AtomicU64::new(
                self.store_write_failures.load(Ordering::Relaxed),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.cache_reads.store(3, Ordering::Relaxed);
        stats.store_reads.store(1, Ordering::Relaxed);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let stats = CacheStats::new();
        stats.cache_reads.store(5, Ordering::Relaxed);
        stats.store_write_failures.store(2, Ordering::Relaxed);
        stats.reset();
        assert_eq!(stats.cache_reads.load(Ordering::Relaxed), 0);
        assert_eq!(stats.store_write_failures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_clone_snapshots_counters() {
        let stats = CacheStats::new();
        stats.store_writes.store(7, Ordering::Relaxed);
        let snapshot = stats.clone();
        stats.store_writes.store(9, Ordering::Relaxed);
        assert_eq!(snapshot.store_writes.load(Ordering::Relaxed), 7);
    }
}
