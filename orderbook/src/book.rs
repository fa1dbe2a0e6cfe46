//! Per-symbol order book: two price ladders, the order index, the matching
//! loop and the notification fanout.

use crate::price_level::PriceLevel;
use crate::types::{
    now_micros, MarketSnapshot, Order, OrderStatus, OrderType, SharedOrder, Side, Trade,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-symbol trade subscriber.
pub type TradeCallback = Box<dyn Fn(&Trade) + Send + Sync>;
/// Per-symbol top-of-book subscriber.
pub type SnapshotCallback = Box<dyn Fn(&MarketSnapshot) + Send + Sync>;

/// The two price ladders of a book, guarded together by the primary lock so
/// matching is atomic with respect to readers.
struct Ladders {
    /// Buy side, iterated best-first in descending price
    bids: BTreeMap<u64, PriceLevel>,
    /// Sell side, iterated best-first in ascending price
    asks: BTreeMap<u64, PriceLevel>,
}

impl Ladders {
    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<u64, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// Order book for a single symbol with price-time priority matching.
///
/// Lock discipline: `order_index` before `ladders`, never both across a
/// callback. A whole `add`/`cancel`/`modify` runs under the ladder write
/// lock, so concurrent snapshots see either pre- or post-state, never a
/// half-matched book.
///
/// Trade callbacks fire on the mutating thread while the ladder lock is
/// still held, in `trade_id` order; the market-data callback fires after
/// the lock is released with a snapshot captured at release time. Callbacks
/// must be short and must not call back into the same book.
pub struct Book {
    symbol_id: u32,
    ladders: RwLock<Ladders>,
    order_index: RwLock<HashMap<u64, SharedOrder>>,
    next_trade_id: AtomicU64,
    total_volume: AtomicU64,
    trade_count: AtomicU64,
    last_trade_price: AtomicU64,
    last_trade_quantity: AtomicU64,
    trade_callbacks: Mutex<Vec<TradeCallback>>,
    snapshot_callbacks: Mutex<Vec<SnapshotCallback>>,
}

impl Book {
    pub fn new(symbol_id: u32) -> Self {
        Book {
            symbol_id,
            ladders: RwLock::new(Ladders {
                bids: BTreeMap::new(),
                asks: BTreeMap::new(),
            }),
            order_index: RwLock::new(HashMap::new()),
            next_trade_id: AtomicU64::new(1),
            total_volume: AtomicU64::new(0),
            trade_count: AtomicU64::new(0),
            last_trade_price: AtomicU64::new(0),
            last_trade_quantity: AtomicU64::new(0),
            trade_callbacks: Mutex::new(Vec::new()),
            snapshot_callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn symbol_id(&self) -> u32 {
        self.symbol_id
    }

    /// Submits an order to the book and returns its post-submission status.
    ///
    /// Limit (and stop) orders match against the opposite ladder up to their
    /// price, then rest any remainder. Market orders sweep the opposite
    /// ladder unbounded and never rest; with no liquidity at all they come
    /// back `Rejected`. A zero quantity is rejected before matching.
    pub fn add(&self, mut order: Order) -> OrderStatus {
        let order_id = order.order_id;
        let order_type = order.order_type;

        // Ids are engine-assigned and unique; a live duplicate only shows up
        // under misuse and must not clobber the resting record. Checked
        // before any insertion, so a rejected submission cannot either.
        {
            let index = self.order_index.read();
            if let Some(existing) = index.get(&order_id) {
                if !existing.read().status.is_terminal() {
                    warn!(order_id, symbol_id = self.symbol_id, "rejected duplicate live order id");
                    return OrderStatus::Rejected;
                }
            }
        }

        if order.quantity == 0 {
            debug!(order_id, symbol_id = self.symbol_id, "rejected zero-quantity order");
            order.status = OrderStatus::Rejected;
            self.order_index
                .write()
                .insert(order_id, Arc::new(RwLock::new(order)));
            let snapshot = self.snapshot();
            self.notify_snapshot(&snapshot);
            return OrderStatus::Rejected;
        }

        let shared: SharedOrder = Arc::new(RwLock::new(order));
        self.order_index.write().insert(order_id, shared.clone());

        let snapshot = {
            let mut ladders = self.ladders.write();
            match order_type {
                OrderType::Market => self.run_market(&shared, &mut ladders),
                OrderType::Limit | OrderType::Stop => self.run_limit(&shared, &mut ladders),
            }
            self.snapshot_locked(&ladders)
        };
        self.notify_snapshot(&snapshot);

        let status = shared.read().status;
        status
    }

    /// Cancels a live order. Returns `false` for unknown ids and orders
    /// already in a terminal state; in-flight matches are never interrupted.
    pub fn cancel(&self, order_id: u64) -> bool {
        let Some(order) = self.order_index.read().get(&order_id).cloned() else {
            return false;
        };

        let snapshot = {
            let mut ladders = self.ladders.write();
            let mut removed = false;
            {
                let mut o = order.write();
                if o.status.is_terminal() {
                    return false;
                }
                o.status = OrderStatus::Cancelled;
                let (side, price) = (o.side, o.price);
                drop(o);

                let book_side = ladders.side_mut(side);
                let mut level_empty = false;
                if let Some(level) = book_side.get(&price) {
                    removed = level.remove(order_id);
                    level_empty = level.is_empty();
                }
                if level_empty {
                    book_side.remove(&price);
                }
            }
            // Market remainders and the like were never resting; the book
            // did not change, so subscribers hear nothing.
            removed.then(|| self.snapshot_locked(&ladders))
        };
        if let Some(snapshot) = &snapshot {
            self.notify_snapshot(snapshot);
        }
        true
    }

    /// Cancel-and-replace keeping the same order id.
    ///
    /// The replacement is a fresh arrival: it joins the tail of its level
    /// (losing time priority), carries `new_quantity` as its full size with
    /// zero filled, and keeps the original price unless `new_price` is
    /// nonzero. Fails without touching the resting order when the id is
    /// unknown, the order is terminal, or `new_quantity` is zero.
    pub fn modify(&self, order_id: u64, new_quantity: u64, new_price: u64) -> bool {
        if new_quantity == 0 {
            return false;
        }
        let Some(order) = self.order_index.read().get(&order_id).cloned() else {
            return false;
        };
        let (symbol_id, side, order_type, price, stop_price, status) = {
            let o = order.read();
            (o.symbol_id, o.side, o.order_type, o.price, o.stop_price, o.status)
        };
        if status.is_terminal() {
            return false;
        }
        // Lost the race to a fill or a concurrent cancel.
        if !self.cancel(order_id) {
            return false;
        }

        let replacement = Order::new(
            order_id,
            symbol_id,
            side,
            order_type,
            new_quantity,
            if new_price > 0 { new_price } else { price },
            stop_price,
        );
        self.add(replacement);
        true
    }

    /// Top-of-book snapshot taken under the reader lock.
    pub fn snapshot(&self) -> MarketSnapshot {
        self.snapshot_locked(&self.ladders.read())
    }

    /// Up to `depth` (price, aggregate quantity) pairs, best bid first.
    pub fn bid_levels(&self, depth: usize) -> Vec<(u64, u64)> {
        let ladders = self.ladders.read();
        ladders
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(&price, level)| (price, level.total_quantity()))
            .collect()
    }

    /// Up to `depth` (price, aggregate quantity) pairs, best ask first.
    pub fn ask_levels(&self, depth: usize) -> Vec<(u64, u64)> {
        let ladders = self.ladders.read();
        ladders
            .asks
            .iter()
            .take(depth)
            .map(|(&price, level)| (price, level.total_quantity()))
            .collect()
    }

    /// A point-in-time copy of the order record, terminal or not.
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.order_index
            .read()
            .get(&order_id)
            .map(|order| order.read().clone())
    }

    pub fn order_status(&self, order_id: u64) -> Option<OrderStatus> {
        self.order_index
            .read()
            .get(&order_id)
            .map(|order| order.read().status)
    }

    pub fn total_volume(&self) -> u64 {
        self.total_volume.load(Ordering::Relaxed)
    }

    pub fn trade_count(&self) -> u64 {
        self.trade_count.load(Ordering::Relaxed)
    }

    /// Drops terminal orders from the index and returns how many went.
    /// Resting and partially filled live orders are untouched.
    pub fn purge_terminal(&self) -> usize {
        let mut index = self.order_index.write();
        let before = index.len();
        index.retain(|_, order| !order.read().status.is_terminal());
        before - index.len()
    }

    pub fn register_trade_callback(&self, callback: impl Fn(&Trade) + Send + Sync + 'static) {
        self.trade_callbacks.lock().push(Box::new(callback));
    }

    pub fn register_snapshot_callback(
        &self,
        callback: impl Fn(&MarketSnapshot) + Send + Sync + 'static,
    ) {
        self.snapshot_callbacks.lock().push(Box::new(callback));
    }

    fn run_limit(&self, incoming: &SharedOrder, ladders: &mut Ladders) {
        let (side, limit_price) = {
            let o = incoming.read();
            (o.side, o.price)
        };
        self.match_incoming(incoming, ladders, side, Some(limit_price));

        let resting = {
            let mut o = incoming.write();
            if o.remaining() > 0 {
                o.status = if o.filled_quantity > 0 {
                    OrderStatus::PartiallyFilled
                } else {
                    OrderStatus::New
                };
                true
            } else {
                o.status = OrderStatus::Filled;
                false
            }
        };
        if resting {
            let price = incoming.read().price;
            ladders
                .side_mut(side)
                .entry(price)
                .or_default()
                .push(incoming.clone());
        }
    }

    fn run_market(&self, incoming: &SharedOrder, ladders: &mut Ladders) {
        let side = incoming.read().side;
        self.match_incoming(incoming, ladders, side, None);

        let mut o = incoming.write();
        o.status = if o.filled_quantity == 0 {
            OrderStatus::Rejected
        } else if o.is_filled() {
            OrderStatus::Filled
        } else {
            // No liquidity left on the opposite side; market remainders are
            // terminal, they never rest.
            OrderStatus::PartiallyFilled
        };
    }

    /// Core price-time priority loop.
    ///
    /// Consumes the opposite ladder best-first while the incoming order has
    /// remaining quantity and the price bound (`None` for market orders)
    /// still crosses. Within a level, fills strictly follow arrival order.
    /// Every trade prints at the resting order's price. The caller holds the
    /// ladder write lock.
    fn match_incoming(
        &self,
        incoming: &SharedOrder,
        ladders: &mut Ladders,
        side: Side,
        limit_price: Option<u64>,
    ) {
        loop {
            if incoming.read().remaining() == 0 {
                break;
            }

            let opposite = match side {
                Side::Buy => &mut ladders.asks,
                Side::Sell => &mut ladders.bids,
            };
            let best_price = match side {
                Side::Buy => opposite.keys().next().copied(),
                Side::Sell => opposite.keys().next_back().copied(),
            };
            let Some(best_price) = best_price else {
                break;
            };

            let crosses = match (side, limit_price) {
                (_, None) => true,
                (Side::Buy, Some(limit)) => best_price <= limit,
                (Side::Sell, Some(limit)) => best_price >= limit,
            };
            if !crosses {
                break;
            }

            {
                let Some(level) = opposite.get(&best_price) else {
                    break;
                };
                loop {
                    if incoming.read().remaining() == 0 {
                        break;
                    }
                    let Some(maker) = level.peek_live() else {
                        break;
                    };
                    let maker_id = maker.read().order_id;
                    let (fill, maker_done) = self.execute(incoming, &maker, best_price);
                    level.apply_fill(maker_id, fill, maker_done);
                }
            }

            let drained = opposite
                .get(&best_price)
                .map_or(false, |level| level.is_empty());
            if drained {
                opposite.remove(&best_price);
            } else if incoming.read().remaining() > 0 {
                // The level still queues orders but none are live; nothing
                // more can execute at this price.
                break;
            }
        }
    }

    /// Executes one fill between the incoming order and the resting maker
    /// at the maker's price. Returns the fill quantity and whether the maker
    /// is now fully filled.
    fn execute(&self, taker: &SharedOrder, maker: &SharedOrder, price: u64) -> (u64, bool) {
        let fill;
        let maker_done;
        let trade;
        {
            let mut t = taker.write();
            let mut m = maker.write();
            fill = t.remaining().min(m.remaining());
            t.filled_quantity += fill;
            m.filled_quantity += fill;
            maker_done = m.is_filled();
            m.status = if maker_done {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };

            let (buy_order_id, sell_order_id) = match t.side {
                Side::Buy => (t.order_id, m.order_id),
                Side::Sell => (m.order_id, t.order_id),
            };
            trade = Trade {
                trade_id: self.next_trade_id.fetch_add(1, Ordering::Relaxed),
                buy_order_id,
                sell_order_id,
                symbol_id: self.symbol_id,
                quantity: fill,
                price,
                timestamp: now_micros(),
            };
        }

        self.total_volume.fetch_add(fill, Ordering::Relaxed);
        self.trade_count.fetch_add(1, Ordering::Relaxed);
        self.last_trade_price.store(price, Ordering::Relaxed);
        self.last_trade_quantity.store(fill, Ordering::Relaxed);
        self.notify_trade(&trade);
        (fill, maker_done)
    }

    fn snapshot_locked(&self, ladders: &Ladders) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot::empty(self.symbol_id);
        snapshot.timestamp = now_micros();
        if let Some((&price, level)) = ladders.bids.iter().next_back() {
            snapshot.best_bid_price = price;
            snapshot.best_bid_quantity = level.total_quantity();
        }
        if let Some((&price, level)) = ladders.asks.iter().next() {
            snapshot.best_ask_price = price;
            snapshot.best_ask_quantity = level.total_quantity();
        }
        snapshot.last_trade_price = self.last_trade_price.load(Ordering::Relaxed);
        snapshot.last_trade_quantity = self.last_trade_quantity.load(Ordering::Relaxed);
        snapshot.volume = self.total_volume.load(Ordering::Relaxed);
        snapshot
    }

    fn notify_trade(&self, trade: &Trade) {
        for callback in self.trade_callbacks.lock().iter() {
            callback(trade);
        }
    }

    fn notify_snapshot(&self, snapshot: &MarketSnapshot) {
        for callback in self.snapshot_callbacks.lock().iter() {
            callback(snapshot);
        }
    }
}
