//! Append-loop throughput benchmarks.
//!
//! Each run allocates one empty container for the strategy, appends `n`
//! freshly constructed values and times only the loop. Runs are serialized
//! process-wide so parallel callers never share the CPU with a measurement.

use std::hint::black_box;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::alloc::{current_allocation, reset_allocation_counter, tracking_active};
use super::lists::{BoxedList, Int8List, Int16List, Int32List, Int64List, IntList, List};
use crate::core::{BenchmarkResult, Strategy, TypeTag};

/// Calibration target for one measured run.
pub const MIN_BENCH_DURATION: Duration = Duration::from_millis(500);

/// Upper bound on appends per run.
pub const MAX_BENCH_ITERATIONS: u64 = 50_000_000;

static RUN_LOCK: Mutex<()> = Mutex::new(());

/// Time `f` and nothing else.
#[inline]
pub fn measure<F: FnOnce()>(f: F) -> Duration {
    let start = Instant::now();
    f();
    start.elapsed()
}

/// Element types that can be fabricated from a loop counter.
pub trait Synthetic: Copy + 'static {
    fn synthesize(i: u64) -> Self;
}

macro_rules! impl_synthetic {
    ($($t:ty),*) => {
        $(impl Synthetic for $t {
            #[inline(always)]
            fn synthesize(i: u64) -> Self {
                i as $t
            }
        })*
    };
}

impl_synthetic!(isize, i8, i16, i32, i64);

#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub min_duration: Duration,
    pub max_iterations: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            min_duration: MIN_BENCH_DURATION,
            max_iterations: MAX_BENCH_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkRunner {
    config: RunnerConfig,
}

impl BenchmarkRunner {
    pub fn new(config: RunnerConfig) -> Self {
        BenchmarkRunner { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Append `n` values of `tag` to a fresh container for `strategy`.
    pub fn run(&self, strategy: Strategy, tag: TypeTag, n: u64) -> BenchmarkResult {
        let _guard = RUN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        run_once(strategy, tag, n)
    }

    /// Grow `n` until one run lasts at least `min_duration`, then return
    /// that run.
    pub fn run_calibrated(&self, strategy: Strategy, tag: TypeTag) -> BenchmarkResult {
        let _guard = RUN_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let max = self.config.max_iterations.max(1);
        let goal_ns = self.config.min_duration.as_nanos();
        let mut n: u64 = 1;
        let mut result = run_once(strategy, tag, n);

        while result.elapsed() < self.config.min_duration && n < max {
            let prev = n;
            let prev_ns = result.elapsed_ns.max(1);
            // Predict the count that reaches the goal, overshoot by 20%, and
            // never grow more than 100x per step.
            let predicted = (goal_ns * prev as u128 / prev_ns).min(u64::MAX as u128) as u64;
            n = predicted.saturating_add(predicted / 5);
            n = n.min(prev.saturating_mul(100));
            n = n.max(prev + 1);
            n = n.min(max);
            debug!(%strategy, %tag, n, "calibrating");
            result = run_once(strategy, tag, n);
        }

        info!(
            %strategy,
            %tag,
            iterations = result.iterations,
            ns_per_op = result.ns_per_op(),
            "benchmark done"
        );
        result
    }

    /// `samples` independent calibrated runs.
    pub fn run_repeated(
        &self,
        strategy: Strategy,
        tag: TypeTag,
        samples: usize,
    ) -> Vec<BenchmarkResult> {
        (0..samples)
            .map(|_| self.run_calibrated(strategy, tag))
            .collect()
    }
}

macro_rules! typed {
    ($list:ty, $t:ty, $n:expr) => {{
        let n: u64 = $n;
        let mut list = <$list>::new();
        let elapsed = measure(|| {
            for i in 0..n {
                list.add(<$t as Synthetic>::synthesize(i));
            }
        });
        black_box(&list);
        (elapsed, list.len())
    }};
}

fn run_once(strategy: Strategy, tag: TypeTag, n: u64) -> BenchmarkResult {
    let track = tracking_active();
    if track {
        reset_allocation_counter();
    }

    let (elapsed, len) = match strategy {
        Strategy::Boxed => match tag {
            TypeTag::Int => boxed::<isize>(n),
            TypeTag::Int8 => boxed::<i8>(n),
            TypeTag::Int16 => boxed::<i16>(n),
            TypeTag::Int32 => boxed::<i32>(n),
            TypeTag::Int64 => boxed::<i64>(n),
        },
        Strategy::Generic => match tag {
            TypeTag::Int => generic::<isize>(n),
            TypeTag::Int8 => generic::<i8>(n),
            TypeTag::Int16 => generic::<i16>(n),
            TypeTag::Int32 => generic::<i32>(n),
            TypeTag::Int64 => generic::<i64>(n),
        },
        Strategy::Typed => match tag {
            TypeTag::Int => typed!(IntList, isize, n),
            TypeTag::Int8 => typed!(Int8List, i8, n),
            TypeTag::Int16 => typed!(Int16List, i16, n),
            TypeTag::Int32 => typed!(Int32List, i32, n),
            TypeTag::Int64 => typed!(Int64List, i64, n),
        },
    };

    let mut result = BenchmarkResult::new(strategy, tag, n, elapsed, len);
    if track {
        let (bytes, count) = current_allocation();
        result.allocations = Some(count);
        result.allocated_bytes = Some(bytes);
    }
    result
}

fn boxed<T: Synthetic>(n: u64) -> (Duration, usize) {
    let mut list = BoxedList::new();
    let elapsed = measure(|| {
        for i in 0..n {
            list.add(Box::new(T::synthesize(i)));
        }
    });
    black_box(&list);
    (elapsed, list.len())
}

fn generic<T: Synthetic>(n: u64) -> (Duration, usize) {
    let mut list = List::<T>::new();
    let elapsed = measure(|| {
        for i in 0..n {
            list.add(T::synthesize(i));
        }
    });
    black_box(&list);
    (elapsed, list.len())
}
