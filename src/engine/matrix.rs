//! Build-matrix enumeration.
//!
//! `MatrixGenerator::generate` returns a fresh, fully materialized job list in
//! a stable order: strategy, then cardinality ascending, then artifact kind.

use std::path::{Path, PathBuf};

use crate::BenchResult;
use crate::core::{ArtifactKind, BuildJob, Strategy, TypeSet, TypeSetCatalog};

use super::compiler::CompilerPreset;

#[derive(Debug, Clone)]
pub struct MatrixGenerator {
    catalog: TypeSetCatalog,
    preset: CompilerPreset,
    source_root: PathBuf,
    out_dir: PathBuf,
    kinds: Vec<ArtifactKind>,
    include_baseline: bool,
}

impl MatrixGenerator {
    pub fn new(
        catalog: TypeSetCatalog,
        preset: CompilerPreset,
        source_root: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        MatrixGenerator {
            catalog,
            preset,
            source_root: source_root.into(),
            out_dir: out_dir.into(),
            kinds: ArtifactKind::ALL.to_vec(),
            include_baseline: false,
        }
    }

    /// Restrict the artifact kinds emitted. Order follows `ArtifactKind`.
    pub fn with_kinds(mut self, kinds: &[ArtifactKind]) -> Self {
        let mut kinds = kinds.to_vec();
        kinds.sort();
        kinds.dedup();
        self.kinds = kinds;
        self
    }

    /// Also emit zero-type builds for the specialized strategies.
    pub fn with_baseline(mut self, include: bool) -> Self {
        self.include_baseline = include;
        self
    }

    pub fn catalog(&self) -> &TypeSetCatalog {
        &self.catalog
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn generate(&self) -> BenchResult<Vec<BuildJob>> {
        let mut jobs = Vec::new();
        for strategy in Strategy::ALL {
            for k in self.cardinalities(strategy) {
                let type_set = self.catalog.prefix(k)?;
                for kind in &self.kinds {
                    jobs.push(self.job(strategy, &type_set, *kind));
                }
            }
        }
        Ok(jobs)
    }

    fn cardinalities(&self, strategy: Strategy) -> std::ops::RangeInclusive<usize> {
        if !strategy.is_specialized() {
            return 0..=0;
        }
        let first = if self.include_baseline { 0 } else { 1 };
        first..=self.catalog.len()
    }

    fn job(&self, strategy: Strategy, type_set: &TypeSet, kind: ArtifactKind) -> BuildJob {
        let file_name = BuildJob::file_name(strategy, type_set.cardinality(), kind);
        BuildJob {
            strategy,
            type_set: type_set.clone(),
            kind,
            target: self.preset.target(&self.source_root, strategy, kind),
            output_path: self.out_dir.join(file_name),
            selector: type_set.selector(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::core::TypeTag;

    fn generator() -> MatrixGenerator {
        MatrixGenerator::new(
            TypeSetCatalog::standard(),
            CompilerPreset::Go,
            "/src",
            "/out",
        )
    }

    #[test]
    fn test_standard_matrix_has_22_jobs() {
        let jobs = generator().generate().unwrap();
        assert_eq!(jobs.len(), 22);
        let count = |s: Strategy| jobs.iter().filter(|j| j.strategy == s).count();
        assert_eq!(count(Strategy::Boxed), 2);
        assert_eq!(count(Strategy::Generic), 10);
        assert_eq!(count(Strategy::Typed), 10);
    }

    #[test]
    fn test_ordering_is_strategy_then_k_then_kind() {
        let jobs = generator().generate().unwrap();
        let labels: Vec<String> = jobs.iter().take(6).map(|j| j.label()).collect();
        assert_eq!(
            labels,
            vec![
                "boxed/bin/0-types",
                "boxed/pkg/0-types",
                "generic/bin/1-types",
                "generic/pkg/1-types",
                "generic/bin/2-types",
                "generic/pkg/2-types",
            ]
        );
        assert_eq!(jobs.last().unwrap().label(), "typed/pkg/5-types");
    }

    #[test]
    fn test_boxed_jobs_use_sentinel_selector() {
        let jobs = generator().generate().unwrap();
        let boxed: Vec<_> = jobs.iter().filter(|j| j.strategy == Strategy::Boxed).collect();
        assert!(boxed.iter().all(|j| j.selector == "no_int"));
        assert_eq!(boxed[0].output_path, PathBuf::from("/out/boxed-0-types.bin"));
        assert_eq!(boxed[0].target, PathBuf::from("/src/lists/boxed/cmd"));
    }

    #[test]
    fn test_selector_and_path_follow_type_set() {
        let jobs = generator().generate().unwrap();
        let job = jobs
            .iter()
            .find(|j| j.strategy == Strategy::Typed && j.cardinality() == 3)
            .unwrap();
        assert_eq!(job.selector, "int,int8,int16");
        assert_eq!(job.output_path, PathBuf::from("/out/typed-3-types.bin"));
    }

    #[test]
    fn test_baseline_adds_zero_type_cells() {
        let jobs = generator().with_baseline(true).generate().unwrap();
        assert_eq!(jobs.len(), 26);
        assert!(
            jobs.iter()
                .any(|j| j.strategy == Strategy::Generic && j.cardinality() == 0)
        );
    }

    #[test]
    fn test_single_kind() {
        let jobs = generator()
            .with_kinds(&[ArtifactKind::Library])
            .generate()
            .unwrap();
        assert_eq!(jobs.len(), 11);
        assert!(jobs.iter().all(|j| j.kind == ArtifactKind::Library));
    }

    #[test]
    fn test_generate_is_repeatable() {
        let g = generator();
        assert_eq!(g.generate().unwrap(), g.generate().unwrap());
    }

    #[test]
    fn test_small_catalog() {
        let catalog = TypeSetCatalog::new([TypeTag::Int, TypeTag::Int64]).unwrap();
        let jobs = MatrixGenerator::new(catalog, CompilerPreset::Rustc, "/src", "/out")
            .generate()
            .unwrap();
        assert_eq!(jobs.len(), 2 + 4 + 4);
        let paths: HashSet<_> = jobs.iter().map(|j| j.output_path.clone()).collect();
        assert_eq!(paths.len(), jobs.len());
    }
}

#[cfg(test)]
mod proptests {
    use std::collections::HashSet;

    use super::MatrixGenerator;
    use crate::core::{TypeSetCatalog, TypeTag};
    use crate::engine::compiler::CompilerPreset;
    use proptest::prelude::*;

    fn catalog_strategy() -> impl Strategy<Value = TypeSetCatalog> {
        proptest::sample::subsequence(TypeTag::ALL.to_vec(), 0..=5)
            .prop_map(|tags| TypeSetCatalog::new(tags).unwrap())
    }

    proptest! {
        #[test]
        fn prop_output_paths_are_unique(
            catalog in catalog_strategy(),
            baseline in any::<bool>()
        ) {
            let n = catalog.len();
            let jobs = MatrixGenerator::new(catalog, CompilerPreset::Go, "/src", "/out")
                .with_baseline(baseline)
                .generate()
                .unwrap();
            let paths: HashSet<_> = jobs.iter().map(|j| j.output_path.clone()).collect();
            prop_assert_eq!(paths.len(), jobs.len());

            let per_strategy = if baseline { n + 1 } else { n };
            prop_assert_eq!(jobs.len(), 2 * (1 + 2 * per_strategy));
        }
    }
}
