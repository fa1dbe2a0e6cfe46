//! FIFO price level: the queue of resting orders at a single price.

use crate::types::{OrderStatus, SharedOrder};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// All live resting orders at one price, in arrival order.
///
/// The queue is never reordered; fills consume from the front, cancels
/// remove in place. `total_quantity` tracks the sum of live remainders so
/// depth queries never walk the queue. The level carries its own lock so
/// snapshot reads only contend with mutations of this one price.
pub struct PriceLevel {
    inner: Mutex<LevelInner>,
}

struct LevelInner {
    orders: VecDeque<SharedOrder>,
    total_quantity: u64,
}

impl PriceLevel {
    pub fn new() -> Self {
        PriceLevel {
            inner: Mutex::new(LevelInner {
                orders: VecDeque::new(),
                total_quantity: 0,
            }),
        }
    }

    /// Appends an order at the tail of the queue.
    ///
    /// The caller guarantees the order is live and not yet in any level.
    /// Accounts in remaining units, so a partially filled arrival only
    /// contributes what is still open.
    pub fn push(&self, order: SharedOrder) {
        let remaining = order.read().remaining();
        let mut inner = self.inner.lock();
        inner.orders.push_back(order);
        inner.total_quantity += remaining;
    }

    /// Removes the order with the given id, if present. Returns whether
    /// anything was removed.
    pub fn remove(&self, order_id: u64) -> bool {
        let mut inner = self.inner.lock();
        let Some(position) = inner
            .orders
            .iter()
            .position(|order| order.read().order_id == order_id)
        else {
            return false;
        };
        if let Some(order) = inner.orders.remove(position) {
            let remaining = order.read().remaining();
            inner.total_quantity = inner.total_quantity.saturating_sub(remaining);
        }
        true
    }

    /// The oldest order that is neither filled nor cancelled, or `None`.
    ///
    /// Cancels remove orders eagerly; the status guard is defensive against
    /// a cancel landing between fills of the same matching pass.
    pub fn peek_live(&self) -> Option<SharedOrder> {
        let inner = self.inner.lock();
        inner
            .orders
            .iter()
            .find(|order| {
                let status = order.read().status;
                status != OrderStatus::Filled && status != OrderStatus::Cancelled
            })
            .cloned()
    }

    /// Records a fill of `quantity` units against the order with the given
    /// id, dropping it from the queue when `remove` is set (fully filled).
    pub fn apply_fill(&self, order_id: u64, quantity: u64, remove: bool) {
        let mut inner = self.inner.lock();
        inner.total_quantity = inner.total_quantity.saturating_sub(quantity);
        if remove {
            if let Some(position) = inner
                .orders
                .iter()
                .position(|order| order.read().order_id == order_id)
            {
                inner.orders.remove(position);
            }
        }
    }

    /// Sum of remaining quantity over the live orders at this price.
    pub fn total_quantity(&self) -> u64 {
        self.inner.lock().total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().orders.is_empty()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
