//! Multi-symbol engine: identity management, routing and aggregated
//! statistics over per-symbol books.

use crate::book::Book;
use crate::metrics::{EngineCounters, PerformanceMetrics};
use crate::types::{MarketSnapshot, Order, OrderStatus, OrderType, Side, Trade};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Thread-safe matching engine over any number of symbols.
///
/// Books are created lazily on first submission and live for the process
/// lifetime. Order ids are allocated from a single monotone counter, so an
/// id identifies an order across all symbols; a routing map keyed by id
/// makes cancel and modify O(1) instead of a scan across books.
///
/// Safe to call from many threads at once: the symbol registry sits behind
/// a reader-writer lock and each book serializes its own mutations.
pub struct Engine {
    books: RwLock<HashMap<u32, Arc<Book>>>,
    /// order id -> owning symbol, populated at submit
    order_owner: DashMap<u64, u32>,
    next_order_id: AtomicU64,
    counters: EngineCounters,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            books: RwLock::new(HashMap::new()),
            order_owner: DashMap::new(),
            next_order_id: AtomicU64::new(1),
            counters: EngineCounters::default(),
        }
    }

    /// Submits an order and returns its engine-assigned id.
    ///
    /// The id comes back regardless of the fill outcome; the post-submission
    /// status is observable through callbacks, [`Engine::order_status`] or
    /// [`Engine::order`]. Trades may be delivered to subscribers before this
    /// call returns to the submitting thread.
    pub fn submit(
        &self,
        symbol_id: u32,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: u64,
        stop_price: u64,
    ) -> u64 {
        let order_id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        let order = Order::new(order_id, symbol_id, side, order_type, quantity, price, stop_price);

        let book = self.book_for(symbol_id);
        self.order_owner.insert(order_id, symbol_id);

        let started = Instant::now();
        book.add(order);
        self.counters.record(started.elapsed());

        order_id
    }

    /// Limit-order shorthand for [`Engine::submit`].
    pub fn submit_limit(&self, symbol_id: u32, side: Side, quantity: u64, price: u64) -> u64 {
        self.submit(symbol_id, side, OrderType::Limit, quantity, price, 0)
    }

    /// Market-order shorthand for [`Engine::submit`].
    pub fn submit_market(&self, symbol_id: u32, side: Side, quantity: u64) -> u64 {
        self.submit(symbol_id, side, OrderType::Market, quantity, 0, 0)
    }

    /// Cancels the order wherever it rests. Returns `false` for unknown ids
    /// and orders already terminal.
    pub fn cancel(&self, order_id: u64) -> bool {
        let Some(book) = self.owning_book(order_id) else {
            return false;
        };
        book.cancel(order_id)
    }

    /// Cancel-and-replace with the same id; see [`Book::modify`]. The
    /// replacement loses time priority.
    pub fn modify(&self, order_id: u64, new_quantity: u64, new_price: u64) -> bool {
        let Some(book) = self.owning_book(order_id) else {
            return false;
        };
        book.modify(order_id, new_quantity, new_price)
    }

    /// Top-of-book snapshot; an empty snapshot for never-used symbols.
    pub fn market_data(&self, symbol_id: u32) -> MarketSnapshot {
        match self.book(symbol_id) {
            Some(book) => book.snapshot(),
            None => MarketSnapshot::empty(symbol_id),
        }
    }

    /// Up to `depth` bid levels, best first; empty for unknown symbols.
    pub fn bid_levels(&self, symbol_id: u32, depth: usize) -> Vec<(u64, u64)> {
        self.book(symbol_id)
            .map(|book| book.bid_levels(depth))
            .unwrap_or_default()
    }

    /// Up to `depth` ask levels, best first; empty for unknown symbols.
    pub fn ask_levels(&self, symbol_id: u32, depth: usize) -> Vec<(u64, u64)> {
        self.book(symbol_id)
            .map(|book| book.ask_levels(depth))
            .unwrap_or_default()
    }

    /// Subscribes to executions on a symbol. Silently a no-op if the symbol
    /// has never traded through this engine.
    pub fn register_trade_callback(
        &self,
        symbol_id: u32,
        callback: impl Fn(&Trade) + Send + Sync + 'static,
    ) {
        match self.book(symbol_id) {
            Some(book) => book.register_trade_callback(callback),
            None => warn!(symbol_id, "trade callback registration for unknown symbol ignored"),
        }
    }

    /// Subscribes to top-of-book updates on a symbol. Silently a no-op if
    /// the symbol has never traded through this engine.
    pub fn register_market_data_callback(
        &self,
        symbol_id: u32,
        callback: impl Fn(&MarketSnapshot) + Send + Sync + 'static,
    ) {
        match self.book(symbol_id) {
            Some(book) => book.register_snapshot_callback(callback),
            None => warn!(symbol_id, "market data callback registration for unknown symbol ignored"),
        }
    }

    /// A point-in-time copy of the order record, terminal or not.
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.owning_book(order_id)?.order(order_id)
    }

    pub fn order_status(&self, order_id: u64) -> Option<OrderStatus> {
        self.owning_book(order_id)?.order_status(order_id)
    }

    /// Aggregated throughput, latency, volume and trade counters.
    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let books = self.books.read();
        let mut total_volume = 0;
        let mut trade_count = 0;
        for book in books.values() {
            total_volume += book.total_volume();
            trade_count += book.trade_count();
        }
        self.counters.snapshot(total_volume, trade_count)
    }

    /// Evicts terminal orders from every book and the routing map. Status
    /// queries for purged ids return `None` afterwards; this is the eviction
    /// point for long-running processes.
    pub fn purge_terminal(&self) -> usize {
        let books = self.books.read();
        let purged = books.values().map(|book| book.purge_terminal()).sum();
        self.order_owner.retain(|order_id, symbol_id| {
            books
                .get(symbol_id)
                .and_then(|book| book.order_status(*order_id))
                .is_some()
        });
        purged
    }

    fn book(&self, symbol_id: u32) -> Option<Arc<Book>> {
        self.books.read().get(&symbol_id).cloned()
    }

    fn owning_book(&self, order_id: u64) -> Option<Arc<Book>> {
        let symbol_id = *self.order_owner.get(&order_id)?.value();
        self.book(symbol_id)
    }

    /// Returns the symbol's book, creating it on first use. Creation
    /// double-checks under the writer lock so racing submitters agree on a
    /// single instance.
    fn book_for(&self, symbol_id: u32) -> Arc<Book> {
        if let Some(book) = self.books.read().get(&symbol_id) {
            return book.clone();
        }
        let mut books = self.books.write();
        books
            .entry(symbol_id)
            .or_insert_with(|| {
                debug!(symbol_id, "creating order book");
                Arc::new(Book::new(symbol_id))
            })
            .clone()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
