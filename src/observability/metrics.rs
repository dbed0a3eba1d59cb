//! Compile counters
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters describing compiler activity
///
/// Shared by reference between concurrent compiles. Relaxed ordering: the
/// counters never feed back into compilation.
#[derive(Debug, Default)]
pub struct CompileMetrics {
    /// Search queries compiled successfully
    queries_compiled: AtomicU64,
    /// Aggregations compiled successfully
    aggregations_compiled: AtomicU64,
    /// Compiles rejected with an error
    compile_failures: AtomicU64,
    /// Aggregation stage calls passed over without translation
    stages_skipped: AtomicU64,
}

impl CompileMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_compiled(&self) {
        self.queries_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_aggregations_compiled(&self) {
        self.aggregations_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compile_failures(&self) {
        self.compile_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stages_skipped(&self) {
        self.stages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_compiled: self.queries_compiled.load(Ordering::Relaxed),
            aggregations_compiled: self.aggregations_compiled.load(Ordering::Relaxed),
            compile_failures: self.compile_failures.load(Ordering::Relaxed),
            stages_skipped: self.stages_skipped.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_compiled: u64,
    pub aggregations_compiled: u64,
    pub compile_failures: u64,
    pub stages_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = CompileMetrics::new().snapshot();
        assert_eq!(snapshot.queries_compiled, 0);
        assert_eq!(snapshot.aggregations_compiled, 0);
        assert_eq!(snapshot.compile_failures, 0);
        assert_eq!(snapshot.stages_skipped, 0);
    }

    #[test]
    fn test_increment_counters() {
        let metrics = CompileMetrics::new();

        metrics.increment_queries_compiled();
        metrics.increment_queries_compiled();
        metrics.increment_aggregations_compiled();
        metrics.increment_compile_failures();
        metrics.increment_stages_skipped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queries_compiled, 2);
        assert_eq!(snapshot.aggregations_compiled, 1);
        assert_eq!(snapshot.compile_failures, 1);
        assert_eq!(snapshot.stages_skipped, 1);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(CompileMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.increment_queries_compiled();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().queries_compiled, 1000);
    }
}
