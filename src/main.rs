//! Matchbook driver: a walkthrough demo, a latency/throughput lab and a
//! synthetic multi-threaded market-flow simulator, all against the
//! in-process matching engine.

use clap::{Parser, Subcommand};
use orderbook::{Engine, Side, Trade};

mod market_flow;

#[derive(Parser)]
#[command(name = "matchbook")]
#[command(about = "Limit order book matching engine - demo and performance lab")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through order placement, matching, cancellation and snapshots
    Demo,
    /// Run the latency measurement suite
    Latency,
    /// Sustained mixed-workload throughput test
    Throughput {
        #[arg(short, long, default_value = "10")]
        seconds: u64,
    },
    /// Drive the engine with synthetic multi-threaded order flow
    Simulate {
        #[arg(short, long, default_value = "10")]
        seconds: u64,
        #[arg(short, long, default_value = "4")]
        threads: usize,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => run_basic_demo(),
        Commands::Latency => latency_test::run_latency_tests(),
        Commands::Throughput { seconds } => latency_test::run_throughput_test(seconds),
        Commands::Simulate { seconds, threads } => market_flow::run_simulation(seconds, threads),
    }
}

/// Demonstrates basic engine functionality with trade execution.
fn run_basic_demo() {
    const SYMBOL: u32 = 100;

    println!("=== Matchbook Demo ===");
    let engine = Engine::new();

    // Resting ask at 150.00 and bid at 149.50 (in ticks) create a spread.
    let ask = engine.submit_limit(SYMBOL, Side::Sell, 100, 15000);
    let bid = engine.submit_limit(SYMBOL, Side::Buy, 50, 14950);
    println!("Submitted ask #{ask}: 100 @ 15000");
    println!("Submitted bid #{bid}: 50 @ 14950");

    engine.register_trade_callback(SYMBOL, |trade: &Trade| {
        println!(
            "  Trade #{}: {} units @ {} (buy #{} / sell #{})",
            trade.trade_id, trade.quantity, trade.price, trade.buy_order_id, trade.sell_order_id
        );
    });

    let snapshot = engine.market_data(SYMBOL);
    println!(
        "Top of book: bid {} x {}, ask {} x {}",
        snapshot.best_bid_quantity,
        snapshot.best_bid_price,
        snapshot.best_ask_quantity,
        snapshot.best_ask_price
    );

    // Crossing bid executes against the resting ask at the ask's price.
    println!("Submitting crossing bid: 75 @ 15000");
    let crossing = engine.submit_limit(SYMBOL, Side::Buy, 75, 15000);
    println!(
        "Crossing bid status: {:?}",
        engine.order_status(crossing)
    );

    println!("Cancelling bid #{bid}: {}", engine.cancel(bid));

    println!("Ask depth: {:?}", engine.ask_levels(SYMBOL, 5));
    println!("Bid depth: {:?}", engine.bid_levels(SYMBOL, 5));

    let metrics = engine.performance_metrics();
    println!(
        "Processed {} orders, {} trades, volume {}, avg latency {:.0} ns",
        metrics.orders_processed,
        metrics.trade_count,
        metrics.total_volume,
        metrics.average_latency_ns
    );
}
