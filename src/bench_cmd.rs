use tracing::{debug, info, warn};

use crate::BenchResult;
use crate::bench::{BenchmarkRunner, tracking_active};
use crate::config::{BenchConfig, OutputArgs};
use crate::core::{EnvironmentInfo, TypeSetCatalog};
use crate::engine::CancelToken;
use crate::report::{BenchReport, ResultAggregator};
use crate::run_cmd::emit;

/// Run every configured (strategy, tag) benchmark and record the samples.
///
/// Cancellation is checked between benchmarks; cells not reached stay `not run`.
pub fn run_benchmarks(config: &BenchConfig, cancel: &CancelToken, aggregator: &mut ResultAggregator) {
    let runner = BenchmarkRunner::new(config.runner);
    let cells = config.cells();
    aggregator.expect_benchmarks(&cells);

    if !tracking_active() {
        debug!("allocation tracking not installed; allocs/op will be empty");
    }
    info!(
        benchmarks = cells.len(),
        samples = config.samples,
        min_ms = config.runner.min_duration.as_millis() as u64,
        "running throughput benchmarks"
    );

    for (strategy, tag) in cells {
        if cancel.is_cancelled() {
            warn!("cancelled; skipping remaining benchmarks");
            break;
        }
        for result in runner.run_repeated(strategy, tag, config.samples) {
            aggregator.record(result);
        }
    }
}

pub fn run(config: BenchConfig, output: OutputArgs) -> BenchResult<()> {
    let cancel = CancelToken::new();
    let mut aggregator = ResultAggregator::new(TypeSetCatalog::standard());
    run_benchmarks(&config, &cancel, &mut aggregator);

    let report = BenchReport::new(EnvironmentInfo::detect(), aggregator.report());
    emit(&report, &output)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bench::RunnerConfig;
    use crate::core::{Strategy, TypeTag};
    use crate::report::{Metric, Unavailable};

    fn config() -> BenchConfig {
        BenchConfig {
            strategies: vec![Strategy::Boxed, Strategy::Typed],
            tags: vec![TypeTag::Int, TypeTag::Int32],
            samples: 2,
            runner: RunnerConfig {
                min_duration: Duration::from_millis(2),
                max_iterations: 50_000,
            },
        }
    }

    #[test]
    fn test_benchmarks_fill_throughput_rows() {
        let mut agg = ResultAggregator::new(TypeSetCatalog::standard());
        run_benchmarks(&config(), &CancelToken::new(), &mut agg);
        let table = agg.report();

        let tp = table
            .get(Strategy::Typed, 4, Metric::Throughput)
            .and_then(|c| c.measured().cloned())
            .unwrap();
        assert_eq!(tp.samples, 2);
        assert!(tp.mean > 0.0);
        assert!(table.get(Strategy::Boxed, 1, Metric::AllocsPerOp).is_some());
    }

    #[test]
    fn test_cancelled_benchmarks_are_not_run() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut agg = ResultAggregator::new(TypeSetCatalog::standard());
        run_benchmarks(&config(), &cancel, &mut agg);
        let table = agg.report();
        assert_eq!(table.len(), 4);
        assert!(
            table
                .cells()
                .all(|(_, v)| v.reason() == Some(Unavailable::NotRun))
        );
    }
}
