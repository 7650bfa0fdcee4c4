//! Reporting module for matrix and throughput results.
//!
//! This module provides:
//! - `ResultAggregator`: the single writer of observations
//! - `ResultTable`: resolved (strategy, cardinality, metric) cells
//! - Markdown rendering for the terminal
//! - `BenchReport`: the snapshot handed to every output format

pub mod aggregator;
pub mod markdown;
pub mod table;

use serde::{Serialize, Serializer};

use crate::core::EnvironmentInfo;

pub use aggregator::{Record, ResultAggregator};
pub use markdown::{format_value, render_markdown};
pub use table::{CellKey, CellValue, Metric, ResultTable, TableCell, Unavailable};

/// Schema version for the JSON snapshot
pub const REPORT_VERSION: u32 = 1;

/// A finished run: environment metadata plus the resolved table.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub version: u32,
    pub generated_at: String,
    pub environment: EnvironmentInfo,
    #[serde(rename = "cells", serialize_with = "serialize_table")]
    pub table: ResultTable,
}

impl BenchReport {
    pub fn new(environment: EnvironmentInfo, table: ResultTable) -> Self {
        BenchReport {
            version: REPORT_VERSION,
            generated_at: crate::now_rfc3339(),
            environment,
            table,
        }
    }
}

fn serialize_table<S: Serializer>(table: &ResultTable, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(table.to_cells())
}
