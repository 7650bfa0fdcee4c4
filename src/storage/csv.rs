//! CSV export of the result table.

use std::io::Write;
use std::path::Path;

use crate::BenchError;
use crate::report::{CellValue, Metric, ResultTable};

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "strategy",
    "types",
    "size_bin",
    "size_pkg",
    "build_ms_bin",
    "build_ms_pkg",
    "throughput",
    "ns_per_op",
    "allocs_per_op",
    "bytes_per_op",
];

/// CSV exporter for the result table.
///
/// One row per (strategy, cardinality). Cells with no matrix entry are empty;
/// cells without a measurement read `unavailable:<reason>`.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export the table to a CSV file.
    pub fn export(&self, table: &ResultTable, output: &Path) -> Result<(), BenchError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| BenchError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(table, file)
    }

    pub fn export_to_writer<W: Write>(
        &self,
        table: &ResultTable,
        writer: W,
    ) -> Result<(), BenchError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| BenchError::Message(format!("failed to write CSV headers: {e}")))?;

        for (strategy, k) in table.rows() {
            let mut row = vec![strategy.to_string(), k.to_string()];
            for metric in Metric::COLUMNS {
                row.push(cell_to_field(table.get(strategy, k, metric)));
            }
            csv_writer
                .write_record(&row)
                .map_err(|e| BenchError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| BenchError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }
}

fn cell_to_field(cell: Option<&CellValue>) -> String {
    match cell {
        None => String::new(),
        Some(CellValue::Measured(stat)) => format!("{:.3}", stat.mean),
        Some(CellValue::Unavailable { reason }) => format!("unavailable:{}", reason.code()),
    }
}
