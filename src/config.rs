//! Harness configuration, assembled from command-line arguments.
//!
//! There is no configuration file. Every knob has a compile-time default and
//! a flag to override it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tempfile::TempDir;

use crate::bench::{MAX_BENCH_ITERATIONS, MIN_BENCH_DURATION, RunnerConfig};
use crate::core::{ArtifactKind, Strategy, TypeSetCatalog, TypeTag};
use crate::engine::{
    CommandCompiler, CompilerPreset, DEFAULT_BUILD_TIMEOUT, MatrixGenerator, default_parallelism,
};
use crate::{BenchError, BenchResult};

/// Which compiler to drive and where its inputs live.
#[derive(Debug, Clone, Args)]
pub struct CompilerArgs {
    /// Compiler preset: go or rustc
    #[arg(long, default_value = "go")]
    pub compiler: CompilerPreset,
    /// Compiler binary (defaults to the preset's program on PATH)
    #[arg(long)]
    pub compiler_path: Option<PathBuf>,
    /// Custom argument template, shell-quoted
    /// (placeholders: {selector},{cfg},{output},{target},{crate_type},{kind})
    #[arg(long)]
    pub template: Option<String>,
    /// Root of the list sources
    #[arg(long, default_value = ".")]
    pub source_root: PathBuf,
}

/// Shape of the build matrix.
#[derive(Debug, Clone, Args)]
pub struct MatrixArgs {
    /// Artifact kinds to build (bin, pkg); both by default
    #[arg(long = "kind", value_delimiter = ',')]
    pub kinds: Vec<ArtifactKind>,
    /// Also build zero-type baselines for generic and typed
    #[arg(long)]
    pub baseline: bool,
    /// Directory for artifacts (a temporary directory otherwise)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// Build execution limits.
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Per-build timeout in seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_BUILD_TIMEOUT.as_secs())]
    pub timeout: u64,
    /// Concurrent compiler processes (default: available cores)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
    /// Build every cell this many times
    #[arg(long, default_value_t = 1)]
    pub build_repetitions: usize,
}

impl Default for BuildArgs {
    fn default() -> Self {
        BuildArgs {
            timeout: DEFAULT_BUILD_TIMEOUT.as_secs(),
            jobs: None,
            build_repetitions: 1,
        }
    }
}

/// Throughput benchmark selection.
#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    /// Strategies to benchmark; all by default
    #[arg(long = "strategy", value_delimiter = ',')]
    pub strategies: Vec<Strategy>,
    /// Element types to benchmark; all by default
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<TypeTag>,
    /// Calibrated samples per (strategy, tag)
    #[arg(long, default_value_t = 1)]
    pub samples: usize,
    /// Minimum measured duration per run, in milliseconds
    #[arg(long, default_value_t = MIN_BENCH_DURATION.as_millis() as u64)]
    pub min_time_ms: u64,
    /// Maximum appends per run
    #[arg(long, default_value_t = MAX_BENCH_ITERATIONS)]
    pub max_iterations: u64,
}

/// Where the report goes.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Write the markdown report here instead of stdout
    #[arg(long)]
    pub markdown: Option<PathBuf>,
    /// Write a CSV table to this file
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Write a JSON snapshot to this file
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub preset: CompilerPreset,
    pub compiler_path: Option<PathBuf>,
    pub template: Option<String>,
    pub source_root: PathBuf,
    pub kinds: Vec<ArtifactKind>,
    pub include_baseline: bool,
    pub out_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub parallelism: usize,
    pub repetitions: usize,
}

impl BuildConfig {
    pub fn from_args(compiler: CompilerArgs, matrix: MatrixArgs, build: BuildArgs) -> Self {
        let kinds = if matrix.kinds.is_empty() {
            ArtifactKind::ALL.to_vec()
        } else {
            matrix.kinds
        };
        BuildConfig {
            preset: compiler.compiler,
            compiler_path: compiler.compiler_path,
            template: compiler.template,
            source_root: compiler.source_root,
            kinds,
            include_baseline: matrix.baseline,
            out_dir: matrix.out_dir,
            timeout: Duration::from_secs(build.timeout),
            parallelism: build.jobs.unwrap_or_else(default_parallelism).max(1),
            repetitions: build.build_repetitions.max(1),
        }
    }

    pub fn catalog(&self) -> TypeSetCatalog {
        TypeSetCatalog::standard()
    }

    pub fn matrix(&self, out_dir: &Path) -> MatrixGenerator {
        MatrixGenerator::new(self.catalog(), self.preset, &self.source_root, out_dir)
            .with_kinds(&self.kinds)
            .with_baseline(self.include_baseline)
    }

    pub fn compiler(&self) -> BenchResult<CommandCompiler> {
        let mut compiler = CommandCompiler::from_preset(self.preset);
        if let Some(path) = &self.compiler_path {
            compiler = compiler.with_program(path);
        }
        if let Some(template) = &self.template {
            compiler = compiler.with_args_str(template)?;
        }
        Ok(compiler)
    }

    /// The artifact directory for this run; a fresh temporary one unless given.
    pub fn artifact_dir(&self) -> BenchResult<ArtifactDir> {
        match &self.out_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok(ArtifactDir::Fixed(dir.clone()))
            }
            None => {
                let tmp = tempfile::Builder::new()
                    .prefix("boxing-bench-")
                    .tempdir()
                    .map_err(|e| BenchError::Message(format!("failed to create temp dir: {e}")))?;
                Ok(ArtifactDir::Temp(tmp))
            }
        }
    }
}

/// Artifact directory; a temporary one is removed on drop.
#[derive(Debug)]
pub enum ArtifactDir {
    Fixed(PathBuf),
    Temp(TempDir),
}

impl ArtifactDir {
    pub fn path(&self) -> &Path {
        match self {
            ArtifactDir::Fixed(p) => p,
            ArtifactDir::Temp(t) => t.path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub strategies: Vec<Strategy>,
    pub tags: Vec<TypeTag>,
    pub samples: usize,
    pub runner: RunnerConfig,
}

impl BenchConfig {
    pub fn from_args(args: BenchArgs) -> Self {
        let mut strategies = if args.strategies.is_empty() {
            Strategy::ALL.to_vec()
        } else {
            args.strategies
        };
        strategies.sort();
        strategies.dedup();
        let mut tags = if args.tags.is_empty() {
            TypeTag::ALL.to_vec()
        } else {
            args.tags
        };
        tags.sort();
        tags.dedup();
        BenchConfig {
            strategies,
            tags,
            samples: args.samples.max(1),
            runner: RunnerConfig {
                min_duration: Duration::from_millis(args.min_time_ms),
                max_iterations: args.max_iterations.max(1),
            },
        }
    }

    /// Every (strategy, tag) pair to benchmark, strategy-major.
    pub fn cells(&self) -> Vec<(Strategy, TypeTag)> {
        self.strategies
            .iter()
            .flat_map(|s| self.tags.iter().map(move |t| (*s, *t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        compiler: CompilerArgs,
        #[command(flatten)]
        matrix: MatrixArgs,
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        bench: BenchArgs,
    }

    fn parse(args: &[&str]) -> TestCli {
        TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        let build = BuildConfig::from_args(cli.compiler, cli.matrix, cli.build);
        assert_eq!(build.preset, CompilerPreset::Go);
        assert_eq!(build.kinds, ArtifactKind::ALL.to_vec());
        assert_eq!(build.timeout, DEFAULT_BUILD_TIMEOUT);
        assert!(build.parallelism >= 1);
        assert_eq!(build.matrix(Path::new("/out")).generate().unwrap().len(), 22);

        let bench = BenchConfig::from_args(cli.bench);
        assert_eq!(bench.cells().len(), 15);
        assert_eq!(bench.runner.min_duration, MIN_BENCH_DURATION);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--compiler",
            "rustc",
            "--kind",
            "pkg",
            "--baseline",
            "-j",
            "2",
            "--timeout",
            "0",
            "--strategy",
            "typed,boxed",
            "--tag",
            "int32",
        ]);
        let build = BuildConfig::from_args(cli.compiler, cli.matrix, cli.build);
        assert_eq!(build.preset, CompilerPreset::Rustc);
        assert_eq!(build.kinds, vec![ArtifactKind::Library]);
        assert_eq!(build.parallelism, 2);
        assert!(build.timeout.is_zero());
        assert_eq!(build.matrix(Path::new("/out")).generate().unwrap().len(), 13);

        let bench = BenchConfig::from_args(cli.bench);
        assert_eq!(
            bench.cells(),
            vec![(Strategy::Boxed, TypeTag::Int32), (Strategy::Typed, TypeTag::Int32)]
        );
    }

    #[test]
    fn test_bad_template_is_an_error() {
        let cli = parse(&["--template", "'unterminated"]);
        let build = BuildConfig::from_args(cli.compiler, cli.matrix, cli.build);
        assert!(build.compiler().is_err());
    }

    #[test]
    fn test_temp_artifact_dir_is_removed_on_drop() {
        let cli = parse(&[]);
        let build = BuildConfig::from_args(cli.compiler, cli.matrix, cli.build);
        let dir = build.artifact_dir().unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }
}
