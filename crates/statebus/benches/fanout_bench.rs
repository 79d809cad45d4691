//! Benchmarks for update fan-out and change detection.
//!
//! Run with: cargo bench -p statebus --bench fanout_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use statebus::{NotifyPolicy, StateContainer};
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

fn container_with_subscribers(count: usize) -> (StateContainer<u64>, Vec<statebus::Subscription>) {
    let container = StateContainer::new(0u64);
    let guards = (0..count)
        .map(|_| {
            let sink = Rc::new(Cell::new(0u64));
            container.subscribe_guard(move || sink.set(sink.get() + 1))
        })
        .collect();
    (container, guards)
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("set/fanout");

    for subscribers in [1usize, 10, 100, 1000] {
        group.throughput(Throughput::Elements(subscribers as u64));
        let (container, _guards) = container_with_subscribers(subscribers);
        let mut next = 0u64;
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &(),
            |b, _| {
                b.iter(|| {
                    next = next.wrapping_add(1);
                    container.set(black_box(next)).unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_noop_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("set/noop");

    let (container, _guards) = container_with_subscribers(100);
    container.set(42).unwrap();
    group.bench_function("on_change_equal_value", |b| {
        b.iter(|| container.set(black_box(42)).unwrap());
    });

    let always = StateContainer::with_policy(42u64, NotifyPolicy::Always);
    group.bench_function("always_equal_value", |b| {
        b.iter(|| always.set(black_box(42)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_fanout, bench_noop_detection);
criterion_main!(benches);
