//! Performance benchmarks for the registry.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use typebus::Registry;

#[derive(Clone)]
struct Tick(u64);

fn registry_with_handlers(count: usize, sink: &Arc<AtomicU64>) -> Registry {
    let registry = Registry::new();
    for _ in 0..count {
        let sink = Arc::clone(sink);
        registry.subscribe::<Tick, _>(move |event: &Tick| {
            sink.fetch_add(event.0, Ordering::Relaxed);
        });
    }
    registry
}

/// Benchmark synchronous fan-out with varying subscriber counts
fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fan_out");

    for handlers in [1, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("handlers", handlers),
            &handlers,
            |b, &count| {
                let sink = Arc::new(AtomicU64::new(0));
                let registry = registry_with_handlers(count, &sink);

                b.iter(|| {
                    registry.publish(black_box(&Tick(1))).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark lookup miss (no subscribers)
fn bench_publish_no_handlers(c: &mut Criterion) {
    let registry = Registry::new();

    c.bench_function("publish_no_handlers", |b| {
        b.iter(|| black_box(registry.publish(&Tick(1)).is_err()));
    });
}

/// Benchmark subscribe followed by unsubscribe against a populated table
fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let sink = Arc::new(AtomicU64::new(0));
    let registry = registry_with_handlers(100, &sink);

    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            let id = registry.subscribe::<Tick, _>(|_: &Tick| {});
            black_box(registry.unsubscribe::<Tick>(id));
        });
    });
}

criterion_group!(
    benches,
    bench_publish_fan_out,
    bench_publish_no_handlers,
    bench_subscribe_unsubscribe,
);
criterion_main!(benches);
