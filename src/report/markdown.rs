//! Markdown rendering of a `BenchReport`.

use crate::core::{ArtifactKind, Strategy};

use super::BenchReport;
use super::table::{CellValue, Metric, ResultTable};

/// Human-readable value with units chosen by metric.
pub fn format_value(value: f64, metric: Metric) -> String {
    match metric {
        Metric::ArtifactSize(_) | Metric::BytesPerOp => {
            if value >= 1_000_000_000.0 {
                format!("{:.1} GB", value / 1_000_000_000.0)
            } else if value >= 1_000_000.0 {
                format!("{:.1} MB", value / 1_000_000.0)
            } else if value >= 1_000.0 {
                format!("{:.1} KB", value / 1_000.0)
            } else {
                format!("{:.0} B", value)
            }
        }
        Metric::BuildTime(_) => {
            if value >= 1000.0 {
                format!("{:.2}s", value / 1000.0)
            } else {
                format!("{:.0}ms", value)
            }
        }
        Metric::Throughput => {
            if value >= 1_000_000.0 {
                format!("{:.2}M/s", value / 1_000_000.0)
            } else if value >= 1_000.0 {
                format!("{:.1}K/s", value / 1_000.0)
            } else {
                format!("{:.0}/s", value)
            }
        }
        Metric::NsPerOp => format!("{:.2}", value),
        Metric::AllocsPerOp => format!("{:.2}", value),
    }
}

fn cell_text(cell: Option<&CellValue>, metric: Metric) -> String {
    match cell {
        None => "-".to_string(),
        Some(CellValue::Measured(stat)) => format_value(stat.mean, metric),
        Some(CellValue::Unavailable { reason }) => format!("unavailable ({reason})"),
    }
}

fn header(metric: Metric) -> &'static str {
    match metric {
        Metric::ArtifactSize(ArtifactKind::Executable) => "Size (bin)",
        Metric::ArtifactSize(ArtifactKind::Library) => "Size (pkg)",
        Metric::BuildTime(ArtifactKind::Executable) => "Build (bin)",
        Metric::BuildTime(ArtifactKind::Library) => "Build (pkg)",
        Metric::Throughput => "Throughput",
        Metric::NsPerOp => "ns/op",
        Metric::AllocsPerOp => "allocs/op",
        Metric::BytesPerOp => "B/op",
    }
}

pub fn render_markdown(report: &BenchReport) -> String {
    let mut out = String::new();
    let table = &report.table;

    out.push_str("## boxing-bench report\n\n");
    out.push_str("| | |\n|---|---|\n");
    out.push_str(&format!("| **Generated** | {} |\n", report.generated_at));
    out.push_str(&format!(
        "| **Compiler** | {} |\n",
        report.environment.compiler_version.as_deref().unwrap_or("-")
    ));
    if let Some(cpu) = &report.environment.cpu_model {
        out.push_str(&format!("| **CPU** | {} |\n", cpu));
    }
    out.push_str(&format!("| **OS** | {} |\n\n", report.environment.os));

    if table.is_empty() {
        out.push_str("_No results._\n");
        return out;
    }

    out.push_str("### Results\n\n");
    out.push_str("| Strategy | Types |");
    for metric in Metric::COLUMNS {
        out.push_str(&format!(" {} |", header(metric)));
    }
    out.push_str("\n|----------|-------|");
    for _ in Metric::COLUMNS {
        out.push_str("------|");
    }
    out.push('\n');

    for (strategy, k) in table.rows() {
        out.push_str(&format!("| {} | {} |", strategy, k));
        for metric in Metric::COLUMNS {
            out.push_str(&format!(" {} |", cell_text(table.get(strategy, k, metric), metric)));
        }
        out.push('\n');
    }
    out.push('\n');

    let comparison = render_size_comparison(table);
    if !comparison.is_empty() {
        out.push_str("### Typed vs generic size\n\n");
        out.push_str(&comparison);
        out.push('\n');
    }

    let unavailable = table.unavailable();
    if !unavailable.is_empty() {
        out.push_str("### Unavailable\n\n");
        for (key, reason) in unavailable {
            out.push_str(&format!(
                "- {} / {} types / {}: {}\n",
                key.strategy, key.cardinality, key.metric, reason
            ));
        }
        out.push('\n');
    }

    out
}

/// Generic minus typed, per kind and cardinality, where both were measured.
fn render_size_comparison(table: &ResultTable) -> String {
    let mut rows = String::new();
    for kind in [ArtifactKind::Library, ArtifactKind::Executable] {
        let metric = Metric::ArtifactSize(kind);
        for (strategy, k) in table.rows() {
            if strategy != Strategy::Typed {
                continue;
            }
            let typed = table
                .get(Strategy::Typed, k, metric)
                .and_then(CellValue::measured);
            let generic = table
                .get(Strategy::Generic, k, metric)
                .and_then(CellValue::measured);
            let (Some(t), Some(g)) = (typed, generic) else {
                continue;
            };
            let delta = g.mean - t.mean;
            let pct = if t.mean > 0.0 {
                format!("{:+.2}%", delta / t.mean * 100.0)
            } else {
                "-".to_string()
            };
            rows.push_str(&format!(
                "| {} | {} | {:.0} | {:.0} | {:+.0} | {} |\n",
                kind.label(),
                k,
                t.mean,
                g.mean,
                delta,
                pct
            ));
        }
    }
    if rows.is_empty() {
        return rows;
    }
    format!(
        "| Kind | Types | Typed (B) | Generic (B) | Delta (B) | Delta % |\n\
         |------|-------|-----------|-------------|-----------|---------|\n{rows}"
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::core::{
        ArtifactMetric, BuildFailure, BuildJob, BuildResult, EnvironmentInfo, TypeSetCatalog,
    };
    use crate::report::ResultAggregator;

    fn job(strategy: Strategy, k: usize, kind: ArtifactKind) -> BuildJob {
        let type_set = TypeSetCatalog::standard().prefix(k).unwrap();
        BuildJob {
            strategy,
            selector: type_set.selector(),
            type_set,
            kind,
            target: PathBuf::from("src"),
            output_path: PathBuf::from(BuildJob::file_name(strategy, k, kind)),
        }
    }

    fn report() -> BenchReport {
        let mut agg = ResultAggregator::new(TypeSetCatalog::standard());
        for (strategy, size) in [(Strategy::Typed, 1000u64), (Strategy::Generic, 1100)] {
            let j = job(strategy, 1, ArtifactKind::Library);
            agg.record(BuildResult::succeeded(j.clone(), Duration::from_millis(1500), None));
            agg.record(ArtifactMetric {
                job: j,
                size_bytes: size,
            });
        }
        agg.record(BuildResult::failed(
            job(Strategy::Typed, 2, ArtifactKind::Library),
            Duration::ZERO,
            BuildFailure::Exit { code: Some(1) },
            "error",
        ));
        BenchReport::new(EnvironmentInfo::default(), agg.report())
    }

    #[test]
    fn test_format_value() {
        let size = Metric::ArtifactSize(ArtifactKind::Executable);
        assert_eq!(format_value(512.0, size), "512 B");
        assert_eq!(format_value(2_500_000.0, size), "2.5 MB");
        assert_eq!(format_value(1500.0, Metric::BuildTime(ArtifactKind::Library)), "1.50s");
        assert_eq!(format_value(3_000_000.0, Metric::Throughput), "3.00M/s");
    }

    #[test]
    fn test_render_includes_rows_and_unavailable() {
        let md = render_markdown(&report());
        assert!(md.contains("| typed | 1 | - | 1.0 KB |"));
        assert!(md.contains("unavailable (build failed)"));
        assert!(md.contains("- typed / 2 types / size_pkg: build failed"));
        assert!(!md.contains("| 0 B |"));
    }

    #[test]
    fn test_render_comparison() {
        let md = render_markdown(&report());
        assert!(md.contains("### Typed vs generic size"));
        assert!(md.contains("| pkg | 1 | 1000 | 1100 | +100 | +10.00% |"));
    }

    #[test]
    fn test_render_empty() {
        let md = render_markdown(&BenchReport::new(
            EnvironmentInfo::default(),
            ResultTable::default(),
        ));
        assert!(md.contains("_No results._"));
    }
}
