use criterion::{Criterion, criterion_group, criterion_main};
use order_book_engine::engine::{Engine, EngineConfig};
use order_book_engine::order::Order;
use order_book_engine::types::{OrderType, Side};

fn seeded_engine(depth: u32, orders_per_level: u32) -> Engine {
    let engine = Engine::new(EngineConfig::default());
    let mut id = 1u64;
    for price in 1..=depth as i32 {
        for _ in 0..orders_per_level {
            engine.add_order(Order::new(OrderType::GoodTillCancel, id, Side::Sell, price, 1));
            id += 1;
            engine.add_order(Order::new(OrderType::GoodTillCancel, id, Side::Buy, price, 1));
            id += 1;
        }
    }
    engine
}

fn bench_match_order(c: &mut Criterion) {
    let depth = 100;
    let orders_per_level = 10;

    c.bench_function("market order sweeps half the book", |b| {
        b.iter_batched(
            || seeded_engine(depth, orders_per_level),
            |engine| {
                let market_buy = Order::market(0, Side::Buy, depth * orders_per_level / 2);
                engine.add_order(market_buy);
            },
            criterion::BatchSize::SmallInput,
        )
    });

    c.bench_function("crossing limit order sweeps the book", |b| {
        b.iter_batched(
            || seeded_engine(depth, orders_per_level),
            |engine| {
                let limit_sell = Order::new(
                    OrderType::GoodTillCancel,
                    1,
                    Side::Sell,
                    (depth / 2) as i32,
                    depth * orders_per_level,
                );
                engine.add_order(limit_sell);
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_match_order);
criterion_main!(benches);
