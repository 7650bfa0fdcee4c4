use std::path::Path;

use tracing::{info, warn};

use crate::BenchResult;
use crate::config::{BuildConfig, OutputArgs};
use crate::core::EnvironmentInfo;
use crate::engine::{ArtifactProbe, BuildOrchestrator, CancelToken, Compiler};
use crate::report::{BenchReport, ResultAggregator};
use crate::run_cmd::emit;

/// Build the matrix into `out_dir` and record builds and artifact sizes.
///
/// Build failures are recorded, not returned. Only matrix generation and
/// worker pool setup can fail here.
pub fn run_builds(
    config: &BuildConfig,
    compiler: &dyn Compiler,
    out_dir: &Path,
    cancel: &CancelToken,
    aggregator: &mut ResultAggregator,
) -> BenchResult<()> {
    let jobs = config.matrix(out_dir).generate()?;
    aggregator.expect_jobs(&jobs);
    info!(
        jobs = jobs.len(),
        parallelism = config.parallelism,
        compiler = compiler.name(),
        out_dir = %out_dir.display(),
        "building matrix"
    );

    let orchestrator = BuildOrchestrator::new(compiler)
        .with_timeout(config.timeout)
        .with_cancel_token(cancel.clone());

    for round in 0..config.repetitions {
        if cancel.is_cancelled() {
            warn!(round, "cancelled; skipping remaining build rounds");
            break;
        }
        let results = orchestrator.execute_all(&jobs, config.parallelism)?;
        for result in results {
            if result.success {
                match ArtifactProbe::probe(&result) {
                    Ok(metric) => aggregator.record(metric),
                    Err(e) => warn!(job = %result.job.label(), error = %e, "probe failed"),
                }
            }
            aggregator.record(result);
        }
    }
    Ok(())
}

pub fn run(config: BuildConfig, output: OutputArgs) -> BenchResult<()> {
    let compiler = config.compiler()?;
    let dir = config.artifact_dir()?;
    let cancel = CancelToken::new();
    let mut aggregator = ResultAggregator::new(config.catalog());

    run_builds(&config, &compiler, dir.path(), &cancel, &mut aggregator)?;

    let env = EnvironmentInfo::detect().with_compiler_version(compiler.version());
    let report = BenchReport::new(env, aggregator.report());
    emit(&report, &output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildArgs, CompilerArgs, MatrixArgs};
    use crate::core::{ArtifactKind, Strategy};
    use crate::engine::{CompilerPreset, MockCompiler};
    use crate::report::{Metric, Unavailable};

    fn config(repetitions: usize) -> BuildConfig {
        BuildConfig::from_args(
            CompilerArgs {
                compiler: CompilerPreset::Go,
                compiler_path: None,
                template: None,
                source_root: "/src".into(),
            },
            MatrixArgs {
                kinds: Vec::new(),
                baseline: false,
                out_dir: None,
            },
            BuildArgs {
                jobs: Some(3),
                build_repetitions: repetitions,
                ..BuildArgs::default()
            },
        )
    }

    #[test]
    fn test_every_cell_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockCompiler::new().failing_on("generic-2-types.a");
        let mut agg = ResultAggregator::new(config(1).catalog());
        run_builds(&config(1), &mock, dir.path(), &CancelToken::new(), &mut agg).unwrap();

        let table = agg.report();
        // 11 (strategy, k) rows x 2 kinds x {size, build time}
        assert_eq!(table.len(), 44);

        let size = |s: Strategy, k: usize, kind: ArtifactKind| {
            table
                .get(s, k, Metric::ArtifactSize(kind))
                .and_then(|c| c.measured())
                .map(|m| m.mean)
        };
        assert_eq!(size(Strategy::Boxed, 0, ArtifactKind::Executable), Some(1024.0));
        assert_eq!(size(Strategy::Typed, 5, ArtifactKind::Library), Some(1024.0 + 5.0 * 256.0));
        assert_eq!(
            table
                .get(Strategy::Generic, 2, Metric::ArtifactSize(ArtifactKind::Library))
                .and_then(|c| c.reason()),
            Some(Unavailable::BuildFailed)
        );
    }

    #[test]
    fn test_repetitions_add_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockCompiler::new();
        let mut agg = ResultAggregator::new(config(2).catalog());
        run_builds(&config(2), &mock, dir.path(), &CancelToken::new(), &mut agg).unwrap();
        assert_eq!(mock.invocations().len(), 44);
        let stat = agg
            .report()
            .get(Strategy::Boxed, 0, Metric::ArtifactSize(ArtifactKind::Library))
            .and_then(|c| c.measured().cloned())
            .unwrap();
        assert_eq!(stat.samples, 2);
    }

    #[test]
    fn test_cancelled_run_still_reports_every_cell() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockCompiler::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut agg = ResultAggregator::new(config(1).catalog());
        run_builds(&config(1), &mock, dir.path(), &cancel, &mut agg).unwrap();
        let table = agg.report();
        assert_eq!(table.len(), 44);
        assert!(table.cells().all(|(_, v)| v.reason().is_some()));
    }
}
