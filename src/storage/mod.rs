//! Output formats for a finished run.
//!
//! Results are written once per run; nothing is read back.

pub mod csv;
pub mod json;

pub use csv::{CSV_HEADERS, CsvExporter};
pub use json::{write_snapshot, write_snapshot_to};
