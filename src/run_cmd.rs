use std::io::Write;

use tracing::{info, warn};

use crate::bench_cmd::run_benchmarks;
use crate::build_cmd::run_builds;
use crate::config::{BenchConfig, BuildConfig, OutputArgs};
use crate::core::EnvironmentInfo;
use crate::engine::{CancelToken, Compiler, interrupted};
use crate::report::{BenchReport, ResultAggregator, render_markdown};
use crate::storage::{CsvExporter, write_snapshot};
use crate::{BenchError, BenchResult};

/// Write a finished report to every requested output. Markdown goes to stdout
/// unless a path is given.
pub fn emit(report: &BenchReport, output: &OutputArgs) -> BenchResult<()> {
    if interrupted() {
        warn!("interrupted; report is partial");
    }

    let markdown = render_markdown(report);
    match &output.markdown {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, markdown)?;
            info!(path = %path.display(), "wrote markdown report");
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(markdown.as_bytes())
                .map_err(|e| BenchError::Message(format!("failed to write report: {e}")))?;
        }
    }

    if let Some(path) = &output.csv {
        CsvExporter::new().export(&report.table, path)?;
        info!(path = %path.display(), "wrote CSV table");
    }
    if let Some(path) = &output.json {
        write_snapshot(report, path)?;
        info!(path = %path.display(), "wrote JSON snapshot");
    }
    Ok(())
}

/// Build the matrix, then run the throughput benchmarks, into one report.
pub fn run(build: BuildConfig, bench: BenchConfig, output: OutputArgs) -> BenchResult<()> {
    let compiler = build.compiler()?;
    let dir = build.artifact_dir()?;
    let cancel = CancelToken::new();
    let mut aggregator = ResultAggregator::new(build.catalog());

    run_builds(&build, &compiler, dir.path(), &cancel, &mut aggregator)?;
    run_benchmarks(&bench, &cancel, &mut aggregator);

    let env = EnvironmentInfo::detect().with_compiler_version(compiler.version());
    let report = BenchReport::new(env, aggregator.report());
    emit(&report, &output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BenchArgs, BuildArgs, CompilerArgs, MatrixArgs};
    use crate::core::{Strategy, TypeTag};
    use crate::engine::CompilerPreset;
    use crate::report::ResultTable;

    #[test]
    fn test_run_builds_and_benches_into_one_report() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("cc.sh");
        std::fs::write(&script, "printf '%s' \"$1\" > \"$2\"\n").unwrap();

        let build = BuildConfig::from_args(
            CompilerArgs {
                compiler: CompilerPreset::Go,
                compiler_path: Some("sh".into()),
                template: Some(format!("{} {{selector}} {{output}}", script.display())),
                source_root: ".".into(),
            },
            MatrixArgs {
                kinds: Vec::new(),
                baseline: false,
                out_dir: Some(dir.path().join("out")),
            },
            BuildArgs {
                jobs: Some(2),
                ..BuildArgs::default()
            },
        );
        let bench = BenchConfig::from_args(BenchArgs {
            strategies: vec![Strategy::Typed],
            tags: vec![TypeTag::Int32],
            samples: 1,
            min_time_ms: 1,
            max_iterations: 1_000,
        });
        let output = OutputArgs {
            markdown: Some(dir.path().join("report.md")),
            csv: Some(dir.path().join("report.csv")),
            json: None,
        };

        run(build, bench, output.clone()).unwrap();

        let md = std::fs::read_to_string(output.markdown.unwrap()).unwrap();
        assert!(md.contains("### Results"));
        assert!(!md.contains("### Unavailable"));
        let csv = std::fs::read_to_string(output.csv.unwrap()).unwrap();
        // int32 enters the catalog at 4 types; "int,int8,int16,int32" is 20 bytes
        let row = csv.lines().find(|l| l.starts_with("typed,4,")).unwrap();
        assert!(row.starts_with("typed,4,20.000,20.000,"));
    }

    #[test]
    fn test_emit_writes_requested_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputArgs {
            markdown: Some(dir.path().join("md").join("report.md")),
            csv: Some(dir.path().join("report.csv")),
            json: Some(dir.path().join("report.json")),
        };
        let report = BenchReport::new(EnvironmentInfo::default(), ResultTable::default());
        emit(&report, &output).unwrap();
        for path in [&output.markdown, &output.csv, &output.json] {
            assert!(path.as_ref().unwrap().exists());
        }
        let md = std::fs::read_to_string(output.markdown.unwrap()).unwrap();
        assert!(md.starts_with("## boxing-bench report"));
    }
}
