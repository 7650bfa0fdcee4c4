//! Build execution.
//!
//! `BuildOrchestrator` turns `BuildJob`s into `BuildResult`s. Compiler failures,
//! timeouts and cancellations are recorded in the result; they never abort the
//! remaining jobs.

use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{info, warn};

use super::cancel::CancelToken;
use super::compiler::{CompileRequest, CompileStatus, Compiler};
use crate::core::{BuildFailure, BuildJob, BuildResult};
use crate::{BenchError, BenchResult};

/// Default per-build timeout (10 minutes).
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(600);

pub struct BuildOrchestrator<'a> {
    compiler: &'a dyn Compiler,
    timeout: Duration,
    cancel: CancelToken,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(compiler: &'a dyn Compiler) -> Self {
        BuildOrchestrator {
            compiler,
            timeout: DEFAULT_BUILD_TIMEOUT,
            cancel: CancelToken::new(),
        }
    }

    /// Per-build timeout. Zero disables the limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Build one artifact.
    pub fn execute(&self, job: &BuildJob) -> BuildResult {
        if self.cancel.is_cancelled() {
            return BuildResult::failed(
                job.clone(),
                Duration::ZERO,
                BuildFailure::Cancelled,
                "not started",
            );
        }

        let start = Instant::now();
        if let Err(e) = prepare_output(job) {
            warn!(job = %job.label(), error = %e, "could not prepare output path");
            return BuildResult::failed(
                job.clone(),
                start.elapsed(),
                BuildFailure::Spawn {
                    message: e.to_string(),
                },
                e.to_string(),
            );
        }

        let request = CompileRequest::from_job(job);
        let result = match self.compiler.compile(&request, self.timeout, &self.cancel) {
            Ok(output) => match output.status {
                CompileStatus::Exited { success: true, .. } => {
                    BuildResult::succeeded(job.clone(), output.elapsed, output.peak_memory_bytes)
                }
                CompileStatus::Exited { code, .. } => BuildResult::failed(
                    job.clone(),
                    output.elapsed,
                    BuildFailure::Exit { code },
                    output.diagnostic(),
                ),
                CompileStatus::TimedOut => BuildResult::failed(
                    job.clone(),
                    output.elapsed,
                    BuildFailure::Timeout {
                        after_ms: self.timeout.as_millis() as u64,
                    },
                    format!(
                        "compiler killed after {}s\n{}",
                        self.timeout.as_secs(),
                        output.diagnostic()
                    )
                    .trim_end()
                    .to_string(),
                ),
                CompileStatus::Cancelled => BuildResult::failed(
                    job.clone(),
                    output.elapsed,
                    BuildFailure::Cancelled,
                    "cancelled while running",
                ),
            },
            Err(e) => BuildResult::failed(
                job.clone(),
                start.elapsed(),
                BuildFailure::Spawn {
                    message: e.to_string(),
                },
                e.to_string(),
            ),
        };

        match &result.failure {
            None => info!(
                job = %job.label(),
                duration_ms = result.duration_ms,
                "build ok"
            ),
            Some(failure) => warn!(job = %job.label(), %failure, "build failed"),
        }
        result
    }

    /// Build every job with at most `parallelism` concurrent compilers.
    /// Results come back in job order.
    pub fn execute_all(
        &self,
        jobs: &[BuildJob],
        parallelism: usize,
    ) -> BenchResult<Vec<BuildResult>> {
        let workers = parallelism.max(1).min(jobs.len().max(1));
        if workers == 1 {
            return Ok(jobs.iter().map(|job| self.execute(job)).collect());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| BenchError::Message(format!("failed to build worker pool: {e}")))?;

        Ok(pool.install(|| jobs.par_iter().map(|job| self.execute(job)).collect()))
    }
}

/// Remove any artifact left by an earlier run and make sure the directory exists.
fn prepare_output(job: &BuildJob) -> std::io::Result<()> {
    match std::fs::remove_file(&job.output_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Default worker count: available cores.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
