//! JSON snapshot of a finished run.

use std::io::Write;
use std::path::Path;

use crate::BenchResult;
use crate::report::BenchReport;

/// Write `report` as pretty-printed JSON to `path`, creating parent directories.
pub fn write_snapshot(report: &BenchReport, path: &Path) -> BenchResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_snapshot_to(report, std::io::BufWriter::new(file))
}

pub fn write_snapshot_to<W: Write>(report: &BenchReport, mut writer: W) -> BenchResult<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
