#![allow(clippy::all)]

//! Dispatch Benchmarks
//!
//! End-to-end cost of emitting events and draining them through handlers.

use cadence::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;
use std::time::Duration;

fn system_with_handlers(handlers: usize) -> EventSystem {
    let events = EventSystem::builder()
        .tick_interval(Duration::from_secs(3600))
        .batch_size(100)
        .build()
        .unwrap();
    for _ in 0..handlers {
        events
            .on(
                EventType::ComputeJobCompleted,
                handler_fn(|_e| async { Ok(Value::Null) }),
                HandlerOptions::default(),
            )
            .unwrap();
    }
    events
}

fn bench_emit(c: &mut Criterion) {
    let events = system_with_handlers(0);

    c.bench_function("emit", |b| {
        b.iter(|| {
            let id = events.emit(
                EventType::UserAction,
                json!({"action": "click"}),
                EmitOptions::default(),
            );
            events.clear_queue();
            black_box(id)
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("dispatch");

    for handlers in [1usize, 4, 16] {
        let events = system_with_handlers(handlers);

        group.bench_with_input(
            BenchmarkId::new("batch_of_100", handlers),
            &events,
            |b, events| {
                b.to_async(&runtime).iter(|| async {
                    for i in 0..100 {
                        events
                            .compute()
                            .job_completed(JobEvent::new(format!("job-{i}")));
                    }
                    black_box(events.dispatch_once().await)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_emit, bench_dispatch);
criterion_main!(benches);
