//! Benchmarks for observer dispatch.
//!
//! Run with: cargo bench -p observable --bench notify_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use observable::{InfiniteSubscription, ObserverRegistry, Subject, Value};

const FAN_OUT: &[usize] = &[1, 16, 256];

// =============================================================================
// Subject notify
// =============================================================================

fn bench_subject_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("subject/notify");

    for &observers in FAN_OUT {
        group.throughput(Throughput::Elements(observers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(observers), &observers, |b, &n| {
            let subject = Subject::<u64>::new();
            let sink = Arc::new(AtomicU64::new(0));
            let _subs: Vec<InfiniteSubscription> = (0..n)
                .map(|_| {
                    let sink = Arc::clone(&sink);
                    subject.subscribe(move |v: &u64| {
                        sink.fetch_add(*v, Ordering::Relaxed);
                    })
                })
                .collect();
            b.iter(|| subject.notify(black_box(&1)));
        });
    }

    group.finish();
}

// =============================================================================
// Registry churn
// =============================================================================

fn bench_registry_insert_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    group.bench_function("insert_remove", |b| {
        let registry = ObserverRegistry::new();
        let _anchor = registry.insert(0_u64);
        b.iter(|| {
            let id = registry.insert(black_box(1_u64));
            black_box(registry.remove(id));
        });
    });

    group.finish();
}

// =============================================================================
// Value set
// =============================================================================

fn bench_value_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("value/set");

    group.bench_function("changed", |b| {
        let value = Value::new(0_u64);
        let sink = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&sink);
        let _sub = value.subscribe(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let mut next = 0_u64;
        b.iter(|| {
            next = next.wrapping_add(1);
            value.set(black_box(next)).ok();
        });
    });

    group.bench_function("unchanged", |b| {
        let value = Value::new(7_u64);
        let _sub = value.subscribe(|| {});
        b.iter(|| value.set(black_box(7)).ok());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_subject_notify,
    bench_registry_insert_remove,
    bench_value_set
);
criterion_main!(benches);
