//! Engine-level throughput and latency counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomic counters the engine bumps on every submission.
#[derive(Debug, Default)]
pub(crate) struct EngineCounters {
    orders_processed: AtomicU64,
    total_latency_ns: AtomicU64,
}

impl EngineCounters {
    pub(crate) fn record(&self, elapsed: Duration) {
        self.orders_processed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, total_volume: u64, trade_count: u64) -> PerformanceMetrics {
        let orders_processed = self.orders_processed.load(Ordering::Relaxed);
        let total_latency_ns = self.total_latency_ns.load(Ordering::Relaxed);
        PerformanceMetrics {
            orders_processed,
            average_latency_ns: if orders_processed > 0 {
                total_latency_ns as f64 / orders_processed as f64
            } else {
                0.0
            },
            total_volume,
            trade_count,
        }
    }
}

/// Aggregated engine statistics: submissions processed with their mean
/// processing latency, plus volume and trade counts summed across books.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub orders_processed: u64,
    pub average_latency_ns: f64,
    pub total_volume: u64,
    pub trade_count: u64,
}
