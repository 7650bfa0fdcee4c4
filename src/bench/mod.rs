//! In-process throughput benchmarks.

pub mod alloc;
pub mod lists;
pub mod runner;

pub use alloc::{TrackingAllocator, current_allocation, reset_allocation_counter, tracking_active};
pub use runner::{
    BenchmarkRunner, MAX_BENCH_ITERATIONS, MIN_BENCH_DURATION, RunnerConfig, measure,
};
