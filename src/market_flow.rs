//! Synthetic order-flow generator.
//!
//! Several producer threads submit randomized limit and market orders for a
//! handful of symbols with different price and size characteristics,
//! exercising the engine the way a live feed would. The engine itself stays
//! oblivious to where the flow comes from.

use orderbook::{Engine, Side, Trade};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// Flow characteristics for one simulated symbol.
struct SymbolProfile {
    symbol_id: u32,
    base_price: u64,
    price_band: u64,
    min_quantity: u64,
    max_quantity: u64,
    /// Fraction of orders submitted as market orders
    market_ratio: f64,
}

/// A liquid large-cap, a volatile name, a penny-priced high-volume name and
/// a thinly traded expensive one.
const PROFILES: [SymbolProfile; 4] = [
    SymbolProfile { symbol_id: 100, base_price: 5000, price_band: 50, min_quantity: 100, max_quantity: 5000, market_ratio: 0.10 },
    SymbolProfile { symbol_id: 101, base_price: 3000, price_band: 90, min_quantity: 50, max_quantity: 3000, market_ratio: 0.15 },
    SymbolProfile { symbol_id: 102, base_price: 150, price_band: 15, min_quantity: 1000, max_quantity: 10000, market_ratio: 0.10 },
    SymbolProfile { symbol_id: 103, base_price: 25000, price_band: 375, min_quantity: 10, max_quantity: 100, market_ratio: 0.05 },
];

pub fn run_simulation(seconds: u64, threads: usize) {
    println!("=== Market Flow Simulation ({seconds}s, {threads} producer threads) ===");

    let engine = Arc::new(Engine::new());
    let trades_seen = Arc::new(AtomicU64::new(0));

    // Books exist only after the first submission; seed each symbol with a
    // starting spread so callbacks can register and flow crosses early.
    for profile in &PROFILES {
        engine.submit_limit(profile.symbol_id, Side::Buy, profile.min_quantity, profile.base_price - 1);
        engine.submit_limit(profile.symbol_id, Side::Sell, profile.min_quantity, profile.base_price + 1);

        let counter = trades_seen.clone();
        engine.register_trade_callback(profile.symbol_id, move |_trade: &Trade| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
    }

    let running = Arc::new(AtomicBool::new(true));
    let mut producers = Vec::new();
    for worker in 0..threads {
        let engine = engine.clone();
        let running = running.clone();
        producers.push(thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let mut generated = 0u64;
            while running.load(Ordering::Relaxed) {
                let profile = &PROFILES[(worker + generated as usize) % PROFILES.len()];
                submit_one(&engine, profile, &mut rng);
                generated += 1;
            }
            generated
        }));
    }

    // Report engine statistics while the producers run.
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let report_every = Duration::from_secs(2);
    let started = Instant::now();
    while Instant::now() < deadline {
        thread::sleep(report_every.min(deadline.saturating_duration_since(Instant::now())));
        let metrics = engine.performance_metrics();
        info!(
            orders = metrics.orders_processed,
            trades = metrics.trade_count,
            volume = metrics.total_volume,
            avg_latency_ns = metrics.average_latency_ns as u64,
            "simulation progress"
        );
    }

    running.store(false, Ordering::Relaxed);
    let generated: u64 = producers
        .into_iter()
        .map(|handle| handle.join().unwrap_or(0))
        .sum();

    let elapsed = started.elapsed();
    let metrics = engine.performance_metrics();
    println!("  Orders generated: {generated}");
    println!("  Orders processed: {}", metrics.orders_processed);
    println!("  Trades executed: {}", metrics.trade_count);
    println!("  Trade events delivered: {}", trades_seen.load(Ordering::Relaxed));
    println!("  Traded volume: {}", metrics.total_volume);
    println!(
        "  Average submission latency: {:.2} us",
        metrics.average_latency_ns / 1000.0
    );
    println!(
        "  Throughput: {:.0} orders/second",
        generated as f64 / elapsed.as_secs_f64()
    );

    for profile in &PROFILES {
        let snapshot = engine.market_data(profile.symbol_id);
        println!(
            "  Symbol {}: bid {} x {}, ask {} x {}, volume {}",
            profile.symbol_id,
            snapshot.best_bid_quantity,
            snapshot.best_bid_price,
            snapshot.best_ask_quantity,
            snapshot.best_ask_price,
            snapshot.volume
        );
    }
}

fn submit_one(engine: &Engine, profile: &SymbolProfile, rng: &mut impl Rng) {
    let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
    let quantity = rng.gen_range(profile.min_quantity..=profile.max_quantity);

    if rng.gen_bool(profile.market_ratio) {
        engine.submit_market(profile.symbol_id, side, quantity);
        return;
    }

    // Buys cluster just under the base price, sells just over, with jitter
    // across the band so levels build up and orders cross regularly.
    let jitter = rng.gen_range(0..=profile.price_band);
    let price = match side {
        Side::Buy => profile.base_price - profile.price_band / 2 + jitter,
        Side::Sell => profile.base_price + profile.price_band / 2 - jitter,
    };
    engine.submit_limit(profile.symbol_id, side, quantity, price);
}
