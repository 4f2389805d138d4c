//! Benchmarks for the event loop and cyclic pools.
//!
//! Benchmarks cover:
//! - Event queue throughput with mixed due times and priorities
//! - Cyclic pool churn on a simulated clock

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use stress_scheduler::config::CyclicPoolConfig;
use stress_scheduler::core::{Event, EventLoop, Priority, ProcessGroupManager};
use stress_scheduler::infra::RecordingLauncher;
use stress_scheduler::policy::{CyclicPoolPolicy, SchedulingPolicy, Workload};
use stress_scheduler::util::{SimulatedClock, StdRandom};

// ============================================================================
// Event Queue Benchmarks
// ============================================================================

fn bench_schedule_and_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_schedule_drain");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut el = EventLoop::new(SimulatedClock::new());
                for i in 0..size {
                    let priority = match i % 3 {
                        0 => Priority::START,
                        1 => Priority::STOP,
                        _ => Priority::ONESHOT,
                    };
                    // scatter due times so the heap actually reorders
                    let at = Duration::from_millis((i * 7_919) % 10_000);
                    el.schedule(Event::new(at, priority, "bench", |_| Ok(())));
                }
                black_box(el.run_forever().unwrap());
            });
        });
    }
    group.finish();
}

// ============================================================================
// Cyclic Pool Benchmarks
// ============================================================================

fn bench_pool_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("cyclic_pool_churn");

    for slots in [10_u64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(slots), &slots, |b, &slots| {
            b.iter(|| {
                let manager = ProcessGroupManager::new(Arc::new(RecordingLauncher::new()));
                let mut el = EventLoop::new(SimulatedClock::new());
                let pool = CyclicPoolPolicy::new(
                    CyclicPoolConfig::dummy(slots),
                    Workload::Sleeper,
                    StdRandom::seeded(1),
                )
                .unwrap();
                pool.ready(&mut el, &manager).unwrap();
                black_box(el.run_until(Duration::from_secs(120)).unwrap());
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(queue_benches, bench_schedule_and_drain);

criterion_group!(pool_benches, bench_pool_churn);

criterion_main!(queue_benches, pool_benches);
