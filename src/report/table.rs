//! The result table: one cell per (strategy, cardinality, metric).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::core::{ArtifactKind, SampleStat, Strategy};

/// What a cell measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Artifact size in bytes
    ArtifactSize(ArtifactKind),
    /// Compiler wall-clock time in milliseconds
    BuildTime(ArtifactKind),
    /// Appends per second
    Throughput,
    NsPerOp,
    AllocsPerOp,
    BytesPerOp,
}

impl Metric {
    /// Column order used by every renderer.
    pub const COLUMNS: [Metric; 8] = [
        Metric::ArtifactSize(ArtifactKind::Executable),
        Metric::ArtifactSize(ArtifactKind::Library),
        Metric::BuildTime(ArtifactKind::Executable),
        Metric::BuildTime(ArtifactKind::Library),
        Metric::Throughput,
        Metric::NsPerOp,
        Metric::AllocsPerOp,
        Metric::BytesPerOp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::ArtifactSize(ArtifactKind::Executable) => "size_bin",
            Metric::ArtifactSize(ArtifactKind::Library) => "size_pkg",
            Metric::BuildTime(ArtifactKind::Executable) => "build_ms_bin",
            Metric::BuildTime(ArtifactKind::Library) => "build_ms_pkg",
            Metric::Throughput => "throughput",
            Metric::NsPerOp => "ns_per_op",
            Metric::AllocsPerOp => "allocs_per_op",
            Metric::BytesPerOp => "bytes_per_op",
        }
    }

    pub fn is_build_metric(self) -> bool {
        matches!(self, Metric::ArtifactSize(_) | Metric::BuildTime(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Why a cell has no measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    BuildFailed,
    TimedOut,
    Cancelled,
    ArtifactMissing,
    NotRun,
}

impl Unavailable {
    pub fn label(self) -> &'static str {
        match self {
            Unavailable::BuildFailed => "build failed",
            Unavailable::TimedOut => "build timed out",
            Unavailable::Cancelled => "build cancelled",
            Unavailable::ArtifactMissing => "artifact missing",
            Unavailable::NotRun => "not run",
        }
    }

    /// Machine-readable form used in CSV output.
    pub fn code(self) -> &'static str {
        match self {
            Unavailable::BuildFailed => "build_failed",
            Unavailable::TimedOut => "timed_out",
            Unavailable::Cancelled => "cancelled",
            Unavailable::ArtifactMissing => "artifact_missing",
            Unavailable::NotRun => "not_run",
        }
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellValue {
    Measured(SampleStat),
    Unavailable { reason: Unavailable },
}

impl CellValue {
    pub fn measured(&self) -> Option<&SampleStat> {
        match self {
            CellValue::Measured(stat) => Some(stat),
            CellValue::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<Unavailable> {
        match self {
            CellValue::Measured(_) => None,
            CellValue::Unavailable { reason } => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellKey {
    pub strategy: Strategy,
    pub cardinality: usize,
    pub metric: Metric,
}

/// Flattened cell for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct TableCell {
    #[serde(flatten)]
    pub key: CellKey,
    pub value: CellValue,
}

/// Snapshot of every cell the aggregator resolved.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    cells: BTreeMap<CellKey, CellValue>,
}

impl ResultTable {
    pub(crate) fn insert(&mut self, key: CellKey, value: CellValue) {
        self.cells.insert(key, value);
    }

    pub fn get(&self, strategy: Strategy, cardinality: usize, metric: Metric) -> Option<&CellValue> {
        self.cells.get(&CellKey {
            strategy,
            cardinality,
            metric,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &CellValue)> {
        self.cells.iter()
    }

    /// Distinct (strategy, cardinality) rows in table order.
    pub fn rows(&self) -> Vec<(Strategy, usize)> {
        let mut rows: Vec<(Strategy, usize)> = self
            .cells
            .keys()
            .map(|k| (k.strategy, k.cardinality))
            .collect();
        rows.dedup();
        rows
    }

    /// Every cell without a measurement, in table order.
    pub fn unavailable(&self) -> Vec<(CellKey, Unavailable)> {
        self.cells
            .iter()
            .filter_map(|(k, v)| v.reason().map(|r| (*k, r)))
            .collect()
    }

    pub fn to_cells(&self) -> Vec<TableCell> {
        self.cells
            .iter()
            .map(|(key, value)| TableCell {
                key: *key,
                value: value.clone(),
            })
            .collect()
    }
}
