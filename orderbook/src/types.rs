//! Core data types for the matching engine.
//!
//! All prices are integer ticks and all quantities integer units - no
//! floating-point arithmetic happens inside matching. Timestamps are
//! microseconds since epoch and are diagnostic only: priority comes from
//! insertion order into a price level, never from clock readings.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Order side - Buy or Sell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Order execution type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at the limit price or better, rest the remainder
    Limit,
    /// Execute immediately at the best available prices, never rests
    Market,
    /// Accepted and matched exactly like a limit order; no trigger table yet
    Stop,
}

/// Order lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Terminal orders accept no further mutation.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Complete order record: immutable identity plus mutable fill state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub symbol_id: u32,
    pub side: Side,
    pub order_type: OrderType,
    /// Original size in units; zero is rejected at submission
    pub quantity: u64,
    /// Price in integer ticks; meaningful for limit orders, 0 for market
    pub price: u64,
    /// Carried for stop orders; unused by the matcher
    pub stop_price: u64,
    /// Microseconds since epoch at creation
    pub timestamp: u64,
    pub status: OrderStatus,
    /// Monotonically non-decreasing, bounded by `quantity`
    pub filled_quantity: u64,
}

impl Order {
    pub fn new(
        order_id: u64,
        symbol_id: u32,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: u64,
        stop_price: u64,
    ) -> Self {
        Order {
            order_id,
            symbol_id,
            side,
            order_type,
            quantity,
            price,
            stop_price,
            timestamp: now_micros(),
            status: OrderStatus::New,
            filled_quantity: 0,
        }
    }

    /// Quantity still open for execution.
    pub fn remaining(&self) -> u64 {
        self.quantity - self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }
}

/// An order shared between a book's order index and, while resting, its
/// price level. Mutation happens under the owning book's ladder lock.
pub type SharedOrder = Arc<RwLock<Order>>;

/// Trade execution record. `price` is always the resting order's price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: u64,
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub symbol_id: u32,
    pub quantity: u64,
    pub price: u64,
    /// Microseconds since epoch at execution
    pub timestamp: u64,
}

/// Top-of-book snapshot. Prices and quantities are zero for empty sides;
/// last-trade fields are zero until the first execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol_id: u32,
    pub timestamp: u64,
    pub best_bid_price: u64,
    pub best_bid_quantity: u64,
    pub best_ask_price: u64,
    pub best_ask_quantity: u64,
    pub last_trade_price: u64,
    pub last_trade_quantity: u64,
    /// Cumulative traded volume for the symbol
    pub volume: u64,
}

impl MarketSnapshot {
    /// Snapshot of an empty or unknown book.
    pub fn empty(symbol_id: u32) -> Self {
        MarketSnapshot {
            symbol_id,
            timestamp: now_micros(),
            best_bid_price: 0,
            best_bid_quantity: 0,
            best_ask_price: 0,
            best_ask_quantity: 0,
            last_trade_price: 0,
            last_trade_quantity: 0,
            volume: 0,
        }
    }
}

/// Microseconds since the Unix epoch.
pub(crate) fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_starts_new_and_unfilled() {
        let order = Order::new(1, 100, Side::Buy, OrderType::Limit, 1000, 5000, 0);

        assert_eq!(order.order_id, 1);
        assert_eq!(order.symbol_id, 100);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.filled_quantity, 0);
        assert_eq!(order.remaining(), 1000);
        assert!(!order.is_filled());
        assert!(order.timestamp > 0);
    }

    #[test]
    fn fill_accounting() {
        let mut order = Order::new(2, 100, Side::Sell, OrderType::Limit, 500, 5100, 0);
        order.filled_quantity = 200;
        assert_eq!(order.remaining(), 300);
        assert!(!order.is_filled());

        order.filled_quantity = 500;
        assert!(order.is_filled());
        assert_eq!(order.remaining(), 0);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }
}
