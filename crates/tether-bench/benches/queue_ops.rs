//! Criterion micro-benchmarks for scheduling and draining mutations.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tether_bench::{bench_context, populated_host};
use tether_core::{MutationKind, Vector3};
use tether_engine::StagingMode;

const BATCH: usize = 256;

fn bench_schedule_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_and_drain_256");
    for (label, staging) in [
        ("single_slot", StagingMode::SingleSlot),
        ("inline", StagingMode::Inline),
    ] {
        let (host, entities) = populated_host(BATCH);
        let (ctx, mut executor) = bench_context(host, staging);
        executor.bind_current_thread();
        group.bench_function(label, |b| {
            b.iter(|| {
                for (i, entity) in entities.iter().enumerate() {
                    let v = Vector3::new(i as f32, 1.0, 0.0);
                    ctx.queue()
                        .schedule(MutationKind::SetVelocity, entity.clone(), Some(v))
                        .unwrap();
                }
                black_box(executor.drain_and_execute().unwrap().applied())
            })
        });
    }
    group.finish();
}

fn bench_custom_actions(c: &mut Criterion) {
    let (host, _) = populated_host(1);
    let (ctx, mut executor) = bench_context(host, StagingMode::SingleSlot);
    executor.bind_current_thread();
    c.bench_function("custom_actions_256", |b| {
        b.iter_batched(
            || {
                for _ in 0..BATCH {
                    ctx.queue().schedule_action("noop", |_| Ok(())).unwrap();
                }
            },
            |()| black_box(executor.drain_and_execute().unwrap().receipts.len()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_schedule_and_drain, bench_custom_actions);
criterion_main!(benches);
