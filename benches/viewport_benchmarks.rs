use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;
use stock_viewport::domain::market_data::{Bar, OHLCV, Price, Timestamp, Volume};
use stock_viewport::{ViewportStateManager, ZoomLimits};

/// Synthetic daily bars with a slow drift.
fn generate_bars(count: usize) -> Vec<Bar> {
    let mut price = 100.0;
    (0..count)
        .map(|i| {
            let open = price;
            let close = open + (i as f64 * 0.3).sin();
            let high = open.max(close) + 0.5;
            let low = open.min(close) - 0.5;
            price = close;
            Bar::new(
                Timestamp::from_millis(1_600_000_000_000 + i as u64 * 86_400_000),
                OHLCV::new(Price::from(open), Price::from(high), Price::from(low), Price::from(close), Volume::from(1_000.0)),
            )
        })
        .collect()
}

fn loaded_manager(count: usize) -> ViewportStateManager {
    let mut m = ViewportStateManager::with_geometry(8.0, 1_200.0, ZoomLimits::DEFAULT);
    m.set_data(generate_bars(count));
    m
}

fn bench_gestures(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_gestures");
    group.measurement_time(Duration::from_secs(5));

    for size in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("pan", size), &size, |b, &size| {
            let mut m = loaded_manager(size);
            b.iter(|| {
                m.handle_pan(black_box(-13.0));
                m.handle_pan(black_box(13.0));
            })
        });

        group.bench_with_input(BenchmarkId::new("zoom", size), &size, |b, &size| {
            let mut m = loaded_manager(size);
            b.iter(|| {
                m.perform_zoom_default(0.0, black_box(1.1));
                m.perform_zoom_default(0.0, black_box(1.0 / 1.1));
            })
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport_queries");
    let mut m = loaded_manager(100_000);
    m.handle_pan(-40_000.0);

    group.bench_function("visible_data", |b| b.iter(|| black_box(m.visible_data().len())));
    group.bench_function("x_to_index", |b| {
        b.iter(|| {
            for x in (0..1_200).step_by(7) {
                black_box(m.x_to_index(x as f64));
            }
        })
    });
    group.bench_function("set_data_100k", |b| {
        let bars = generate_bars(100_000);
        b.iter(|| m.set_data(black_box(bars.clone())))
    });
    group.finish();
}

criterion_group!(benches, bench_gestures, bench_queries);
criterion_main!(benches);
