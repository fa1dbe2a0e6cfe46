use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orderbook::{Book, Engine, Order, OrderType, Side};

const SYMBOL: u32 = 100;

fn limit(id: u64, side: Side, quantity: u64, price: u64) -> Order {
    Order::new(id, SYMBOL, side, OrderType::Limit, quantity, price, 0)
}

fn bench_order_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_submission");

    for &num_orders in [100u64, 1000, 10000].iter() {
        group.bench_with_input(
            BenchmarkId::new("non_crossing_orders", num_orders),
            &num_orders,
            |b, &num_orders| {
                b.iter(|| {
                    let book = Book::new(SYMBOL);
                    for i in 0..num_orders {
                        let order = if i % 2 == 0 {
                            limit(i, Side::Buy, 100, 10000 - i)
                        } else {
                            limit(i, Side::Sell, 100, 10100 + i)
                        };
                        black_box(book.add(order));
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_order_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_matching");

    for &depth in [10u64, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("crossing_orders", depth),
            &depth,
            |b, &depth| {
                b.iter_batched(
                    || {
                        let book = Book::new(SYMBOL);
                        // Pre-populate both sides with resting orders.
                        for i in 0..depth {
                            book.add(limit(i, Side::Sell, 100, 10000 + i));
                            book.add(limit(i + depth, Side::Buy, 100, 9999 - i));
                        }
                        book
                    },
                    |book| {
                        // One large order sweeping the whole ask side.
                        let crossing =
                            limit(depth * 2, Side::Buy, depth * 50, 10000 + depth);
                        black_box(book.add(crossing))
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_market_data_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_data");

    let book = Book::new(SYMBOL);
    for i in 0..1000 {
        book.add(limit(i, Side::Sell, 100, 10000 + i));
        book.add(limit(i + 1000, Side::Buy, 100, 9999 - i));
    }

    group.bench_function("snapshot", |b| b.iter(|| black_box(book.snapshot())));

    group.bench_function("depth_10", |b| {
        b.iter(|| {
            black_box(book.bid_levels(10));
            black_box(book.ask_levels(10));
        })
    });

    group.finish();
}

fn bench_order_cancellation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancellation");

    for &num_orders in [100u64, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("cancel_half", num_orders),
            &num_orders,
            |b, &num_orders| {
                b.iter_batched(
                    || {
                        let book = Book::new(SYMBOL);
                        for i in 0..num_orders {
                            book.add(limit(i, Side::Buy, 100, 10000));
                        }
                        book
                    },
                    |book| {
                        for id in (0..num_orders).step_by(2) {
                            black_box(book.cancel(id));
                        }
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_engine_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    group.bench_function("submit_non_crossing", |b| {
        b.iter_batched(
            Engine::new,
            |engine| {
                for i in 0..1000u64 {
                    let (side, price) = if i % 2 == 0 {
                        (Side::Buy, 9999 - (i % 100))
                    } else {
                        (Side::Sell, 10100 + (i % 100))
                    };
                    black_box(engine.submit_limit(SYMBOL, side, 100, price));
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("rapid_order_flow", |b| {
        b.iter(|| {
            let engine = Engine::new();

            // Submit, match, query in the mix a live feed would produce.
            for _ in 0..100 {
                for i in 0..5 {
                    engine.submit_limit(SYMBOL, Side::Sell, 100, 10000 + i);
                    engine.submit_limit(SYMBOL, Side::Buy, 100, 9999 - i);
                }
                black_box(engine.submit_limit(SYMBOL, Side::Buy, 300, 10002));
                black_box(engine.market_data(SYMBOL));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_order_submission,
    bench_order_matching,
    bench_market_data_access,
    bench_order_cancellation,
    bench_engine_submit
);

criterion_main!(benches);
