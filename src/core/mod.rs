//! Core types for boxing-bench.
//!
//! The type catalog, matrix cell descriptors and the records produced by the
//! build and throughput paths.

pub mod catalog;
pub mod env;
pub mod schema;

pub use catalog::{NO_TYPES_SELECTOR, TypeSet, TypeSetCatalog, TypeTag};
pub use env::EnvironmentInfo;
pub use schema::{
    ArtifactKind, ArtifactMetric, BenchmarkResult, BuildFailure, BuildJob, BuildResult,
    SampleStat, Strategy,
};
