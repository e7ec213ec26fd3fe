//! Benchmarks for MBO → MBP-10 reconstruction performance.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mbo_mbp_reconstructor::{BookEngine, BookEvent, ConvertConfig, Converter, EngineConfig, Side};

const HEADER: &str = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol";

/// Price text for tick `i` around 100.00, 0.01 increments.
fn price_text(i: usize, is_bid: bool) -> String {
    let cents = if is_bid { 10_000 - (i % 20) } else { 10_001 + (i % 20) };
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn create_test_prices(count: usize) -> Vec<(u64, Side, String, i64)> {
    (0..count)
        .map(|i| {
            let is_bid = i % 2 == 0;
            let side = if is_bid { Side::Bid } else { Side::Ask };
            ((i + 1) as u64, side, price_text(i, is_bid), ((i % 100) + 1) as i64)
        })
        .collect()
}

fn create_test_csv(count: usize) -> String {
    let mut csv = String::from(HEADER);
    for (order_id, side, price, size) in create_test_prices(count) {
        let side = if side.is_bid() { 'B' } else { 'A' };
        csv.push_str(&format!(
            "\n{order_id},{order_id},160,2,1108,A,{side},{price},{size},0,{order_id},130,0,{order_id},ARL"
        ));
        if order_id % 3 == 0 {
            csv.push_str(&format!(
                "\n{order_id},{order_id},160,2,1108,C,{side},{price},{size},0,{order_id},130,0,{order_id},ARL"
            ));
        }
    }
    csv.push('\n');
    csv
}

fn bench_reconstruction(c: &mut Criterion) {
    let orders = create_test_prices(10_000);

    let mut group = c.benchmark_group("reconstruction");
    group.throughput(Throughput::Elements(orders.len() as u64));

    group.bench_function("process_events", |b| {
        b.iter(|| {
            let mut book = BookEngine::with_config(EngineConfig::new().with_logging(false));
            for (order_id, side, price, size) in &orders {
                let event = BookEvent::add(*order_id, *side, price, *size);
                black_box(book.process(&event).bids[0].size);
            }
        })
    });

    group.bench_function("add_cancel_churn", |b| {
        b.iter(|| {
            let mut book = BookEngine::with_config(EngineConfig::new().with_logging(false));
            for (order_id, side, price, size) in &orders {
                book.apply(&BookEvent::add(*order_id, *side, price, *size));
                if order_id % 2 == 0 {
                    book.apply(&BookEvent::cancel(*order_id, *size));
                }
            }
            black_box(book.order_count())
        })
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut book = BookEngine::with_config(EngineConfig::new().with_logging(false));
    for (order_id, side, price, size) in &create_test_prices(1_000) {
        book.apply(&BookEvent::add(*order_id, *side, price, *size));
    }

    c.bench_function("snapshot_top10", |b| {
        b.iter(|| black_box(book.snapshot().asks[9].count))
    });
}

fn bench_convert(c: &mut Criterion) {
    let input = create_test_csv(10_000);
    let rows = input.lines().count() as u64 - 1;

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Elements(rows));

    group.bench_function("csv_to_mbp10", |b| {
        b.iter(|| {
            let mut output = Vec::with_capacity(input.len() * 4);
            let config = ConvertConfig::new().with_engine_config(EngineConfig::new().with_logging(false));
            let summary = Converter::new(config)
                .run(input.as_bytes(), &mut output)
                .unwrap();
            black_box(summary.rows_written)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_reconstruction, bench_snapshot, bench_convert);
criterion_main!(benches);
