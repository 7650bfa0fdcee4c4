//! Merges build, probe and benchmark observations into a `ResultTable`.
//!
//! Observations are append-only. `report()` resolves every known cell to a
//! measurement or an `Unavailable` reason; nothing recorded is ever dropped
//! and nothing missing is ever shown as zero.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::table::{CellKey, CellValue, Metric, ResultTable, Unavailable};
use crate::core::{
    ArtifactKind, ArtifactMetric, BenchmarkResult, BuildFailure, BuildJob, BuildResult,
    SampleStat, Strategy, TypeSetCatalog, TypeTag,
};

/// One observation for the aggregator.
#[derive(Debug, Clone)]
pub enum Record {
    Build(BuildResult),
    Artifact(ArtifactMetric),
    Benchmark(BenchmarkResult),
}

impl From<BuildResult> for Record {
    fn from(r: BuildResult) -> Self {
        Record::Build(r)
    }
}

impl From<ArtifactMetric> for Record {
    fn from(m: ArtifactMetric) -> Self {
        Record::Artifact(m)
    }
}

impl From<BenchmarkResult> for Record {
    fn from(b: BenchmarkResult) -> Self {
        Record::Benchmark(b)
    }
}

type BuildCell = (Strategy, usize, ArtifactKind);
type BenchCell = (Strategy, usize);

#[derive(Debug, Default)]
pub struct ResultAggregator {
    catalog: TypeSetCatalog,
    expected_builds: BTreeSet<BuildCell>,
    expected_benches: BTreeSet<BenchCell>,
    builds: BTreeMap<BuildCell, Vec<BuildResult>>,
    sizes: BTreeMap<BuildCell, Vec<u64>>,
    benches: BTreeMap<BenchCell, Vec<BenchmarkResult>>,
}

impl ResultAggregator {
    pub fn new(catalog: TypeSetCatalog) -> Self {
        ResultAggregator {
            catalog,
            ..Default::default()
        }
    }

    /// Register matrix cells so the ones never recorded show as `not run`.
    pub fn expect_jobs(&mut self, jobs: &[BuildJob]) {
        for job in jobs {
            self.expected_builds
                .insert((job.strategy, job.cardinality(), job.kind));
        }
    }

    /// Register benchmark cells so the ones never recorded show as `not run`.
    pub fn expect_benchmarks(&mut self, cells: &[(Strategy, TypeTag)]) {
        for (strategy, tag) in cells {
            let k = self.bench_cardinality(*tag);
            self.expected_benches.insert((*strategy, k));
        }
    }

    pub fn record(&mut self, record: impl Into<Record>) {
        match record.into() {
            Record::Build(result) => {
                let key = (result.job.strategy, result.job.cardinality(), result.job.kind);
                self.builds.entry(key).or_default().push(result);
            }
            Record::Artifact(metric) => {
                let key = (metric.job.strategy, metric.job.cardinality(), metric.job.kind);
                self.sizes.entry(key).or_default().push(metric.size_bytes);
            }
            Record::Benchmark(bench) => {
                let key = (bench.strategy, self.bench_cardinality(bench.tag));
                debug!(strategy = %bench.strategy, tag = %bench.tag, k = key.1, "benchmark recorded");
                self.benches.entry(key).or_default().push(bench);
            }
        }
    }

    /// Recorded build results, grouped by cell.
    pub fn build_results(&self) -> Vec<&BuildResult> {
        self.builds.values().flatten().collect()
    }

    pub fn benchmark_results(&self) -> Vec<&BenchmarkResult> {
        self.benches.values().flatten().collect()
    }

    /// Row at which a tag's throughput is reported: where it enters the catalog.
    fn bench_cardinality(&self, tag: TypeTag) -> usize {
        self.catalog
            .entry_cardinality(tag)
            .unwrap_or(tag.ordinal() + 1)
    }

    pub fn report(&self) -> ResultTable {
        let mut table = ResultTable::default();

        let build_cells: BTreeSet<BuildCell> = self
            .expected_builds
            .iter()
            .chain(self.builds.keys())
            .chain(self.sizes.keys())
            .copied()
            .collect();

        for (strategy, k, kind) in build_cells {
            let builds = self.builds.get(&(strategy, k, kind));
            // Any failed round disqualifies the cell, even if other rounds measured it.
            let failure = builds.and_then(|b| b.iter().find_map(unavailable_reason));

            let size = match self.sizes.get(&(strategy, k, kind)) {
                Some(sizes) if !sizes.is_empty() && failure.is_none() => {
                    let samples: Vec<f64> = sizes.iter().map(|s| *s as f64).collect();
                    CellValue::Measured(SampleStat::from_samples(&samples))
                }
                _ => CellValue::Unavailable {
                    reason: match builds {
                        None => Unavailable::NotRun,
                        Some(_) => failure.unwrap_or(Unavailable::ArtifactMissing),
                    },
                },
            };

            let durations: Vec<f64> = builds
                .map(|b| b.iter().filter(|r| r.success).map(|r| r.duration_ms).collect())
                .unwrap_or_default();
            let build_time = if durations.is_empty() || failure.is_some() {
                CellValue::Unavailable {
                    reason: failure.unwrap_or(Unavailable::NotRun),
                }
            } else {
                CellValue::Measured(SampleStat::from_samples(&durations))
            };

            table.insert(key(strategy, k, Metric::ArtifactSize(kind)), size);
            table.insert(key(strategy, k, Metric::BuildTime(kind)), build_time);
        }

        let bench_cells: BTreeSet<BenchCell> = self
            .expected_benches
            .iter()
            .chain(self.benches.keys())
            .copied()
            .collect();

        for (strategy, k) in bench_cells {
            let results = self.benches.get(&(strategy, k)).map(Vec::as_slice).unwrap_or(&[]);
            if results.is_empty() {
                table.insert(
                    key(strategy, k, Metric::Throughput),
                    CellValue::Unavailable {
                        reason: Unavailable::NotRun,
                    },
                );
                continue;
            }

            let metrics: [(Metric, Option<CellValue>); 4] = [
                (Metric::Throughput, stat_of(results, |r| Some(r.throughput))),
                (Metric::NsPerOp, stat_of(results, |r| Some(r.ns_per_op()))),
                (Metric::AllocsPerOp, stat_of(results, BenchmarkResult::allocs_per_op)),
                (Metric::BytesPerOp, stat_of(results, BenchmarkResult::bytes_per_op)),
            ];
            for (metric, value) in metrics {
                if let Some(value) = value {
                    table.insert(key(strategy, k, metric), value);
                }
            }
        }

        table
    }
}

fn key(strategy: Strategy, cardinality: usize, metric: Metric) -> CellKey {
    CellKey {
        strategy,
        cardinality,
        metric,
    }
}

fn stat_of(
    results: &[BenchmarkResult],
    f: impl Fn(&BenchmarkResult) -> Option<f64>,
) -> Option<CellValue> {
    let samples: Vec<f64> = results.iter().filter_map(f).collect();
    (!samples.is_empty()).then(|| CellValue::Measured(SampleStat::from_samples(&samples)))
}

fn unavailable_reason(result: &BuildResult) -> Option<Unavailable> {
    if result.success {
        return None;
    }
    Some(match result.failure.as_ref() {
        Some(BuildFailure::Timeout { .. }) => Unavailable::TimedOut,
        Some(BuildFailure::Cancelled) => Unavailable::Cancelled,
        Some(BuildFailure::Exit { .. }) | Some(BuildFailure::Spawn { .. }) | None => {
            Unavailable::BuildFailed
        }
    })
}
