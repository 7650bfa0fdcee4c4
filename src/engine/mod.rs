//! Engine module: builds the artifact matrix.
//!
//! # Architecture
//!
//! - **MatrixGenerator** enumerates `BuildJob`s from the type catalog.
//! - **Compiler** turns one job into an artifact on disk. `CommandCompiler`
//!   shells out to `go`, `rustc` or a custom program; `MockCompiler` is for tests.
//! - **BuildOrchestrator** runs jobs through a compiler with bounded parallelism,
//!   a per-build timeout and cooperative cancellation.
//! - **ArtifactProbe** reads artifact sizes for successful builds.
//!
//! # Boundaries
//!
//! - `Compiler` does NOT decide what to build; every argument comes from the job.
//! - The orchestrator never raises on a failed build; failures are data.

pub mod cancel;
pub mod compiler;
pub mod matrix;
pub mod orchestrator;
pub mod probe;

pub use cancel::{CancelToken, install_interrupt_handler, interrupted};
pub use compiler::{
    CommandCompiler, CompileOutput, CompileRequest, CompileStatus, Compiler, CompilerPreset,
    MockCompiler, render_args,
};
pub use matrix::MatrixGenerator;
pub use orchestrator::{BuildOrchestrator, DEFAULT_BUILD_TIMEOUT, default_parallelism};
pub use probe::ArtifactProbe;
