//! Compiler abstraction for producing matrix artifacts.
//!
//! A `Compiler` turns one [`CompileRequest`] (selector, target, output path) into
//! an artifact on disk. It never decides what to build; the request is derived
//! entirely from a `BuildJob`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tracing::debug;

use super::cancel::CancelToken;
use crate::core::env::detect_tool_version;
use crate::core::{ArtifactKind, BuildJob, Strategy, TypeTag};
use crate::{BenchError, BenchResult};

/// Everything a compiler needs to build one artifact.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Comma-joined active tags or the no-types sentinel
    pub selector: &'a str,
    /// Active tags, for compilers that take one flag per tag
    pub tags: &'a [TypeTag],
    pub kind: ArtifactKind,
    pub target: &'a Path,
    pub output: &'a Path,
}

impl<'a> CompileRequest<'a> {
    pub fn from_job(job: &'a BuildJob) -> Self {
        CompileRequest {
            selector: &job.selector,
            tags: job.type_set.tags(),
            kind: job.kind,
            target: &job.target,
            output: &job.output_path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    Exited { code: Option<i32>, success: bool },
    TimedOut,
    Cancelled,
}

/// Result of one compiler invocation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub status: CompileStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub peak_memory_bytes: Option<u64>,
}

impl CompileOutput {
    pub fn success(&self) -> bool {
        matches!(self.status, CompileStatus::Exited { success: true, .. })
    }

    /// Captured stderr followed by stdout, trimmed.
    pub fn diagnostic(&self) -> String {
        let mut text = self.stderr.trim().to_string();
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stdout);
        }
        text
    }
}

/// Narrow interface over the external compiler.
///
/// `Err` is reserved for failures to run the compiler at all; a compiler that
/// runs and exits non-zero returns `Ok` with an unsuccessful status.
pub trait Compiler: Send + Sync {
    /// Compiler name (e.g., "go", "rustc").
    fn name(&self) -> &str;

    /// Compiler version, if detectable.
    fn version(&self) -> Option<String>;

    /// Build one artifact, blocking until the compiler exits, times out
    /// (`timeout` of zero disables the limit) or `cancel` fires.
    fn compile(
        &self,
        request: &CompileRequest<'_>,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> BenchResult<CompileOutput>;
}

/// Built-in command lines and source layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerPreset {
    /// `go build -a -tags <selector>`; packages under `lists/<strategy>`
    Go,
    /// `rustc --cfg <tag>...`; single files `<strategy>.rs`
    Rustc,
}

impl CompilerPreset {
    pub fn program(self) -> &'static str {
        match self {
            CompilerPreset::Go => "go",
            CompilerPreset::Rustc => "rustc",
        }
    }

    pub fn version_arg(self) -> &'static str {
        match self {
            CompilerPreset::Go => "version",
            CompilerPreset::Rustc => "--version",
        }
    }

    pub fn args_template(self) -> Vec<String> {
        let args: &[&str] = match self {
            CompilerPreset::Go => &[
                "build",
                "-a",
                "-tags",
                "{selector}",
                "-o",
                "{output}",
                "{target}",
            ],
            CompilerPreset::Rustc => &[
                "--edition",
                "2021",
                "-C",
                "opt-level=3",
                "--crate-type",
                "{crate_type}",
                "{cfg}",
                "-o",
                "{output}",
                "{target}",
            ],
        };
        args.iter().map(|s| s.to_string()).collect()
    }

    /// Where the compiler input for `(strategy, kind)` lives under `root`.
    pub fn target(self, root: &Path, strategy: Strategy, kind: ArtifactKind) -> PathBuf {
        match self {
            CompilerPreset::Go => {
                let pkg = root.join("lists").join(strategy.name());
                match kind {
                    ArtifactKind::Executable => pkg.join("cmd"),
                    ArtifactKind::Library => pkg,
                }
            }
            CompilerPreset::Rustc => root.join(format!("{}.rs", strategy.name())),
        }
    }
}

impl std::str::FromStr for CompilerPreset {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "go" => Ok(CompilerPreset::Go),
            "rustc" => Ok(CompilerPreset::Rustc),
            other => Err(BenchError::Message(format!("unknown compiler preset '{other}'"))),
        }
    }
}

fn crate_type(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Executable => "bin",
        ArtifactKind::Library => "rlib",
    }
}

/// Expand an argument template for one request.
///
/// Placeholders: `{selector}`, `{output}`, `{target}`, `{crate_type}`, `{kind}`.
/// An argument that is exactly `{cfg}` expands to `--cfg <tag>` per active tag.
pub fn render_args(template: &[String], request: &CompileRequest<'_>) -> Vec<String> {
    let output = request.output.display().to_string();
    let target = request.target.display().to_string();
    let mut args = Vec::with_capacity(template.len() + request.tags.len() * 2);
    for arg in template {
        if arg == "{cfg}" {
            for tag in request.tags {
                args.push("--cfg".to_string());
                args.push(tag.name().to_string());
            }
            continue;
        }
        args.push(
            arg.replace("{selector}", request.selector)
                .replace("{output}", &output)
                .replace("{target}", &target)
                .replace("{crate_type}", crate_type(request.kind))
                .replace("{kind}", request.kind.label()),
        );
    }
    args
}

/// Compiler driven through a subprocess and an argument template.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    version_arg: String,
    poll_interval: Duration,
}

impl CommandCompiler {
    pub fn from_preset(preset: CompilerPreset) -> Self {
        CommandCompiler {
            name: preset.program().to_string(),
            program: PathBuf::from(preset.program()),
            args: preset.args_template(),
            version_arg: preset.version_arg().to_string(),
            poll_interval: Duration::from_millis(20),
        }
    }

    /// A compiler with an explicit program and argument template.
    pub fn custom(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "compiler".to_string());
        CommandCompiler {
            name,
            program,
            args,
            version_arg: "--version".to_string(),
            poll_interval: Duration::from_millis(20),
        }
    }

    /// Replace the program while keeping the template.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Parse a shell-quoted argument template.
    pub fn with_args_str(mut self, template: &str) -> BenchResult<Self> {
        let args = shlex::split(template).ok_or_else(|| {
            BenchError::Message(format!("invalid compiler argument template: {template}"))
        })?;
        self.args = args;
        Ok(self)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args_template(&self) -> &[String] {
        &self.args
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> BenchResult<(CompileStatus, Option<u64>)> {
        #[cfg(feature = "mem")]
        use sysinfo::{ProcessRefreshKind, RefreshKind, System};

        let start = Instant::now();

        #[cfg(feature = "mem")]
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        );
        #[cfg(feature = "mem")]
        let pid = sysinfo::Pid::from_u32(child.id());
        #[cfg(feature = "mem")]
        let mut peak_rss: u64 = 0;

        loop {
            if let Some(status) = child.try_wait()? {
                let peak = {
                    #[cfg(feature = "mem")]
                    {
                        (peak_rss > 0).then_some(peak_rss)
                    }
                    #[cfg(not(feature = "mem"))]
                    {
                        None
                    }
                };
                return Ok((
                    CompileStatus::Exited {
                        code: status.code(),
                        success: status.success(),
                    },
                    peak,
                ));
            }

            if cancel.is_cancelled() {
                kill_process_group(child);
                return Ok((CompileStatus::Cancelled, None));
            }

            if !timeout.is_zero() && start.elapsed() >= timeout {
                kill_process_group(child);
                return Ok((CompileStatus::TimedOut, None));
            }

            #[cfg(feature = "mem")]
            {
                sys.refresh_process(pid);
                if let Some(p) = sys.process(pid) {
                    peak_rss = peak_rss.max(p.memory());
                }
            }

            std::thread::sleep(self.poll_interval);
        }
    }
}

/// How long to wait for captured output once the compiler is gone. A stray
/// process still holding the pipe must not stall the worker.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Kill the compiler and everything it spawned, then reap it.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        // The compiler leads its own group (see `compile`), so its pid is the pgid.
        let pgid = child.id() as libc::pid_t;
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut r| {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
        });
        rx
    })
}

fn collect(rx: Option<Receiver<String>>) -> String {
    rx.and_then(|rx| rx.recv_timeout(DRAIN_GRACE).ok())
        .unwrap_or_default()
}

impl Compiler for CommandCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<String> {
        detect_tool_version(&self.program, &self.version_arg)
    }

    fn compile(
        &self,
        request: &CompileRequest<'_>,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> BenchResult<CompileOutput> {
        let args = render_args(&self.args, request);
        debug!(program = %self.program.display(), args = ?args, "invoking compiler");

        let start = Instant::now();
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|e| {
                BenchError::Message(format!(
                    "failed to spawn {}: {e}",
                    self.program.display()
                ))
            })?;

        // Pipes are drained on their own threads so a chatty compiler never blocks.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let (status, peak_memory_bytes) = self.wait_with_timeout(&mut child, timeout, cancel)?;
        let elapsed = start.elapsed();

        Ok(CompileOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
            elapsed,
            peak_memory_bytes,
        })
    }
}

/// Compiler double for tests. Writes an artifact whose size grows with the
/// number of active tags and records every request it sees.
#[derive(Debug)]
pub struct MockCompiler {
    /// Artifact size with no active tags
    pub base_size: u64,
    /// Extra bytes per active tag
    pub per_tag_size: u64,
    /// Output file names that fail with exit code 1
    pub fail_outputs: Vec<String>,
    /// Output file names that report a timeout
    pub timeout_outputs: Vec<String>,
    /// Whether artifacts are written at all
    pub write_artifacts: bool,
    invocations: Mutex<Vec<String>>,
}

impl Default for MockCompiler {
    fn default() -> Self {
        MockCompiler {
            base_size: 1024,
            per_tag_size: 256,
            fail_outputs: Vec::new(),
            timeout_outputs: Vec::new(),
            write_artifacts: true,
            invocations: Mutex::new(Vec::new()),
        }
    }
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make builds writing `file_name` fail.
    pub fn failing_on(mut self, file_name: impl Into<String>) -> Self {
        self.fail_outputs.push(file_name.into());
        self
    }

    /// Make builds writing `file_name` time out.
    pub fn timing_out_on(mut self, file_name: impl Into<String>) -> Self {
        self.timeout_outputs.push(file_name.into());
        self
    }

    /// Succeed without writing any artifact.
    pub fn without_artifacts(mut self) -> Self {
        self.write_artifacts = false;
        self
    }

    /// Selectors seen so far, in call order.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Compiler for MockCompiler {
    fn name(&self) -> &str {
        "mock"
    }

    fn version(&self) -> Option<String> {
        Some("mock-1.0.0".to_string())
    }

    fn compile(
        &self,
        request: &CompileRequest<'_>,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> BenchResult<CompileOutput> {
        if let Ok(mut calls) = self.invocations.lock() {
            calls.push(request.selector.to_string());
        }

        let file_name = request
            .output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let exited = |success: bool, stderr: &str| CompileOutput {
            status: CompileStatus::Exited {
                code: Some(if success { 0 } else { 1 }),
                success,
            },
            stdout: String::new(),
            stderr: stderr.to_string(),
            elapsed: Duration::from_millis(5),
            peak_memory_bytes: None,
        };

        if cancel.is_cancelled() {
            return Ok(CompileOutput {
                status: CompileStatus::Cancelled,
                ..exited(false, "")
            });
        }
        if self.timeout_outputs.contains(&file_name) {
            return Ok(CompileOutput {
                status: CompileStatus::TimedOut,
                elapsed: timeout,
                ..exited(false, "")
            });
        }
        if self.fail_outputs.contains(&file_name) {
            return Ok(exited(false, &format!("mock compile error for {file_name}")));
        }

        if self.write_artifacts {
            let size = self.base_size + self.per_tag_size * request.tags.len() as u64;
            std::fs::write(request.output, vec![0u8; size as usize])?;
        }
        Ok(exited(true, ""))
    }
}
