//! Artifact size probing. Existence and length only.

use std::path::Path;

use crate::core::{ArtifactMetric, BuildResult};
use crate::{BenchError, BenchResult};

pub struct ArtifactProbe;

impl ArtifactProbe {
    /// Byte size of the file at `path`.
    pub fn size(path: &Path) -> BenchResult<u64> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(BenchError::ArtifactMissing(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BenchError::ArtifactMissing(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size metric for a build. A failed build has no artifact, whatever is on disk.
    pub fn probe(result: &BuildResult) -> BenchResult<ArtifactMetric> {
        if !result.success {
            return Err(BenchError::ArtifactMissing(result.job.output_path.clone()));
        }
        let size_bytes = Self::size(&result.job.output_path)?;
        Ok(ArtifactMetric {
            job: result.job.clone(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{ArtifactKind, BuildFailure, BuildJob, Strategy, TypeSet};

    fn job(dir: &Path) -> BuildJob {
        BuildJob {
            strategy: Strategy::Boxed,
            type_set: TypeSet::empty(),
            kind: ArtifactKind::Executable,
            target: dir.join("src"),
            output_path: dir.join("boxed-0-types.bin"),
            selector: "no_int".to_string(),
        }
    }

    #[test]
    fn test_size_of_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactProbe::size(&dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, BenchError::ArtifactMissing(_)));
    }

    #[test]
    fn test_size_of_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactProbe::size(dir.path()).unwrap_err();
        assert!(matches!(err, BenchError::ArtifactMissing(_)));
    }

    #[test]
    fn test_probe_successful_build() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        std::fs::write(&job.output_path, vec![1u8; 4096]).unwrap();
        let result = BuildResult::succeeded(job, Duration::from_millis(3), None);
        let metric = ArtifactProbe::probe(&result).unwrap();
        assert_eq!(metric.size_bytes, 4096);
    }

    #[test]
    fn test_probe_failed_build_is_missing_even_if_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        std::fs::write(&job.output_path, b"leftover").unwrap();
        let result = BuildResult::failed(
            job,
            Duration::ZERO,
            BuildFailure::Exit { code: Some(2) },
            "error",
        );
        assert!(matches!(
            ArtifactProbe::probe(&result),
            Err(BenchError::ArtifactMissing(_))
        ));
    }
}
