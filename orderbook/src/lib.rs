//! Multi-symbol limit order book with price-time priority matching.
//!
//! Core features:
//! - Price-time priority matching (best price first, then FIFO within a level)
//! - Limit, market and stop orders with partial fills
//! - Cancel and cancel-replace; replacements lose queue priority
//! - Per-symbol trade and top-of-book callbacks
//! - Thread-safe engine: submit, cancel, modify and query from many threads
//! - Atomic throughput and latency counters
//!
//! The [`Engine`] is the entry point: it allocates order ids, creates a
//! [`Book`] per symbol on first use and routes cancels and modifies by id.
//! Books can also be driven directly when only one symbol matters.
//!
//! ```
//! use orderbook::{Engine, Side};
//!
//! let engine = Engine::new();
//! engine.submit_limit(100, Side::Sell, 50, 10_000);
//! let buy = engine.submit_limit(100, Side::Buy, 50, 10_000);
//!
//! assert!(engine.order(buy).unwrap().is_filled());
//! assert_eq!(engine.performance_metrics().total_volume, 50);
//! ```

pub mod book;
pub mod engine;
pub mod metrics;
pub mod price_level;
pub mod types;

pub use book::{Book, SnapshotCallback, TradeCallback};
pub use engine::Engine;
pub use metrics::PerformanceMetrics;
pub use price_level::PriceLevel;
pub use types::{MarketSnapshot, Order, OrderStatus, OrderType, SharedOrder, Side, Trade};
