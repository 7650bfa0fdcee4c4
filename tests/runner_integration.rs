use std::time::Duration;

use boxing_bench::bench::{BenchmarkRunner, RunnerConfig, tracking_active};
use boxing_bench::core::{Strategy, TypeTag};

fn runner() -> BenchmarkRunner {
    BenchmarkRunner::new(RunnerConfig {
        min_duration: Duration::from_millis(2),
        max_iterations: 100_000,
    })
}

#[test]
fn typed_int32_hundred_thousand_appends() {
    let result = runner().run(Strategy::Typed, TypeTag::Int32, 100_000);
    assert_eq!(result.container_len, 100_000);
    assert!(result.throughput > 0.0);
    assert!(result.ns_per_op() > 0.0);
}

#[test]
fn allocation_counts_need_the_tracking_allocator() {
    // This test binary does not install the tracking allocator.
    assert!(!tracking_active());
    let result = runner().run(Strategy::Boxed, TypeTag::Int8, 1_000);
    assert_eq!(result.allocations, None);
    assert_eq!(result.allocs_per_op(), None);
}

#[test]
fn repeated_runs_are_independent_samples() {
    let results = runner().run_repeated(Strategy::Generic, TypeTag::Int16, 3);
    assert_eq!(results.len(), 3);
    for r in &results {
        assert_eq!(r.container_len as u64, r.iterations);
        assert!(r.iterations <= 100_000);
    }
}
