pub mod bench;
pub mod config;
pub mod core;
pub mod engine;
pub mod report;
pub mod storage;

pub mod bench_cmd;
pub mod build_cmd;
pub mod matrix_cmd;
pub mod run_cmd;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("build failed for {output}: {detail}")]
    BuildFailure { output: PathBuf, detail: String },
    #[error("build timed out after {}s for {output}", .after.as_secs())]
    BuildTimeout { output: PathBuf, after: Duration },
    #[error("artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),
    #[error("type set cardinality {requested} out of range (catalog has {available} tags)")]
    OutOfRange { requested: usize, available: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
}

pub type BenchResult<T> = Result<T, BenchError>;

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: bench::alloc::TrackingAllocator = bench::alloc::TrackingAllocator;
