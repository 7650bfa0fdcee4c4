//! Records produced by the build and throughput paths.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::catalog::{TypeSet, TypeTag};
use crate::BenchError;

/// How a container represents its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Boxed,
    Generic,
    Typed,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Boxed, Strategy::Generic, Strategy::Typed];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Boxed => "boxed",
            Strategy::Generic => "generic",
            Strategy::Typed => "typed",
        }
    }

    /// Whether the strategy needs one code path per active tag.
    pub fn is_specialized(self) -> bool {
        !matches!(self, Strategy::Boxed)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|st| st.name() == s)
            .ok_or_else(|| BenchError::Message(format!("unknown strategy '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Executable,
    Library,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Executable, ArtifactKind::Library];

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Executable => "bin",
            ArtifactKind::Library => "a",
        }
    }

    /// Short label used in report columns.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Executable => "bin",
            ArtifactKind::Library => "pkg",
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bin" | "exe" | "executable" => Ok(ArtifactKind::Executable),
            "pkg" | "lib" | "library" => Ok(ArtifactKind::Library),
            other => Err(BenchError::Message(format!("unknown artifact kind '{other}'"))),
        }
    }
}

/// One cell of the build matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJob {
    pub strategy: Strategy,
    pub type_set: TypeSet,
    pub kind: ArtifactKind,
    /// Source file or package directory handed to the compiler
    pub target: PathBuf,
    pub output_path: PathBuf,
    /// Conditional-compilation selector derived from `type_set`
    pub selector: String,
}

impl BuildJob {
    pub fn cardinality(&self) -> usize {
        self.type_set.cardinality()
    }

    /// `<strategy>-<cardinality>-types.<ext>`
    pub fn file_name(strategy: Strategy, cardinality: usize, kind: ArtifactKind) -> String {
        format!("{}-{}-types.{}", strategy, cardinality, kind.extension())
    }

    /// Display name, e.g. `typed/bin/3-types`.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}-types",
            self.strategy,
            self.kind.label(),
            self.cardinality()
        )
    }
}

/// Why a build did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildFailure {
    /// Compiler exited non-zero (`None` when killed by a signal)
    Exit { code: Option<i32> },
    Timeout { after_ms: u64 },
    Cancelled,
    /// Compiler could not be started
    Spawn { message: String },
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildFailure::Exit { code: Some(c) } => write!(f, "exit code {c}"),
            BuildFailure::Exit { code: None } => f.write_str("terminated by signal"),
            BuildFailure::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            BuildFailure::Cancelled => f.write_str("cancelled"),
            BuildFailure::Spawn { message } => write!(f, "failed to start compiler: {message}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub job: BuildJob,
    pub success: bool,
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<BuildFailure>,
    /// Captured compiler output when the build failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_memory_bytes: Option<u64>,
}

impl BuildResult {
    pub fn succeeded(job: BuildJob, duration: Duration, peak_memory_bytes: Option<u64>) -> Self {
        BuildResult {
            job,
            success: true,
            duration_ms: duration.as_secs_f64() * 1000.0,
            failure: None,
            diagnostic: None,
            peak_memory_bytes,
        }
    }

    pub fn failed(
        job: BuildJob,
        duration: Duration,
        failure: BuildFailure,
        diagnostic: impl Into<String>,
    ) -> Self {
        BuildResult {
            job,
            success: false,
            duration_ms: duration.as_secs_f64() * 1000.0,
            failure: Some(failure),
            diagnostic: Some(diagnostic.into()),
            peak_memory_bytes: None,
        }
    }

    /// The failure as an error value, for callers that want to propagate it.
    pub fn error(&self) -> Option<BenchError> {
        let output = self.job.output_path.clone();
        match self.failure.as_ref()? {
            BuildFailure::Timeout { after_ms } => Some(BenchError::BuildTimeout {
                output,
                after: Duration::from_millis(*after_ms),
            }),
            other => Some(BenchError::BuildFailure {
                output,
                detail: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetric {
    pub job: BuildJob,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub strategy: Strategy,
    pub tag: TypeTag,
    pub iterations: u64,
    pub elapsed_ns: u128,
    /// Appends per second
    pub throughput: f64,
    /// Length of the container after the measured loop
    pub container_len: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_bytes: Option<u64>,
}

impl BenchmarkResult {
    pub fn new(
        strategy: Strategy,
        tag: TypeTag,
        iterations: u64,
        elapsed: Duration,
        container_len: usize,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        // A zero-length interval only happens below timer resolution; clamp to 1ns.
        let throughput = iterations as f64 / secs.max(1e-9);
        BenchmarkResult {
            strategy,
            tag,
            iterations,
            elapsed_ns: elapsed.as_nanos(),
            throughput,
            container_len,
            allocations: None,
            allocated_bytes: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.min(u64::MAX as u128) as u64)
    }

    pub fn ns_per_op(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.elapsed_ns as f64 / self.iterations as f64
    }

    pub fn allocs_per_op(&self) -> Option<f64> {
        if self.iterations == 0 {
            return None;
        }
        self.allocations
            .map(|a| a as f64 / self.iterations as f64)
    }

    pub fn bytes_per_op(&self) -> Option<f64> {
        if self.iterations == 0 {
            return None;
        }
        self.allocated_bytes
            .map(|b| b as f64 / self.iterations as f64)
    }
}

/// Summary statistics over repeated samples of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStat {
    pub samples: u32,
    pub mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl SampleStat {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return SampleStat {
                samples: 0,
                mean: 0.0,
                median: None,
                stddev: None,
                min: 0.0,
                max: 0.0,
            };
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        SampleStat {
            samples: n as u32,
            mean,
            median: Some(median),
            stddev: Some(variance.sqrt()),
            min,
            max,
        }
    }
}
