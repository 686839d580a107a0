#![allow(clippy::all)]

//! Queue and Registry Benchmarks
//!
//! Benchmarks for priority queue throughput and handler resolution.

use cadence::*;
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::Value;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn event(priority: Priority) -> Arc<Event> {
    Arc::new(Event::new(
        EventType::UserAction,
        None,
        EmitOptions::new().with_priority(priority),
    ))
}

// =============================================================================
// Priority Queue Benchmarks
// =============================================================================

fn bench_priority_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue");

    for size in [100usize, 1_000, 10_000] {
        let events: Vec<Arc<Event>> = (0..size)
            .map(|i| event(Priority::BY_URGENCY[i % 4]))
            .collect();

        group.bench_with_input(BenchmarkId::new("enqueue", size), &events, |b, events| {
            b.iter_batched(
                PriorityQueue::new,
                |mut queue| {
                    for event in events {
                        queue.enqueue(Arc::clone(event));
                    }
                    queue
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("drain", size), &events, |b, events| {
            b.iter_batched(
                || {
                    let mut queue = PriorityQueue::new();
                    events.iter().for_each(|e| queue.enqueue(Arc::clone(e)));
                    queue
                },
                |mut queue| {
                    while !queue.is_empty() {
                        black_box(queue.drain(50));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// =============================================================================
// Registry Benchmarks
// =============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for handlers in [1usize, 10, 100] {
        let registry = HandlerRegistry::new();
        for i in 0..handlers {
            let event_type = EventType::ALL[i % EventType::ALL.len()];
            let handler = Handler::new(
                Some(event_type),
                Arc::new(handler_fn(|_e| async { Ok(Value::Null) })),
                HandlerOptions::default(),
                3,
                Duration::from_secs(5),
            )
            .unwrap();
            registry.register(handler).unwrap();
        }
        registry
            .register(
                Handler::new(
                    None,
                    Arc::new(handler_fn(|_e| async { Ok(Value::Null) })),
                    HandlerOptions::default(),
                    3,
                    Duration::from_secs(5),
                )
                .unwrap(),
            )
            .unwrap();

        let target = Event::new(EventType::ALL[0], None, EmitOptions::default());
        group.bench_with_input(BenchmarkId::new("resolve", handlers), &target, |b, target| {
            b.iter(|| black_box(registry.resolve(target)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_priority_queue, bench_registry);
criterion_main!(benches);
