//! Filesystem performance results
//!
//! Every finished training job leaves a model tarball somewhere under the
//! result directory. The results table has one row per tarball whose metadata
//! can be read.

use async_trait::async_trait;
use shortlist_core::domain::perf::PerfRecord;
use shortlist_core::domain::probe::ProbeStatus;
use shortlist_core::error::ProbeError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Probe;
use crate::archive;

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Counts trained models under a result directory
pub struct PerfResultsProbe {
    result_dir: PathBuf,
    prediction_type: Option<String>,
}

impl PerfResultsProbe {
    /// # Arguments
    /// * `result_dir` - Directory searched recursively for model tarballs
    /// * `prediction_type` - Only count models of this type, when given
    pub fn new(result_dir: impl Into<PathBuf>, prediction_type: Option<String>) -> Self {
        Self {
            result_dir: result_dir.into(),
            prediction_type,
        }
    }
}

#[async_trait]
impl Probe for PerfResultsProbe {
    type Artifact = Vec<PerfRecord>;

    fn describe(&self) -> String {
        match &self.prediction_type {
            Some(prediction_type) => format!(
                "{} models under {}",
                prediction_type,
                self.result_dir.display()
            ),
            None => format!("models under {}", self.result_dir.display()),
        }
    }

    async fn probe(&self) -> Result<ProbeStatus<Vec<PerfRecord>>, ProbeError> {
        let result_dir = self.result_dir.clone();
        let prediction_type = self.prediction_type.clone();

        // Decompressing archives is synchronous
        tokio::task::spawn_blocking(move || {
            collect_perf_results(&result_dir, prediction_type.as_deref())
        })
        .await
        .map_err(|e| ProbeError::Invalid {
            path: self.result_dir.clone(),
            message: format!("result scan task failed: {}", e),
        })?
    }
}

/// Builds the results table from the archives currently on disk
///
/// Archives that cannot be read are skipped; they may still be being written.
pub fn collect_perf_results(
    result_dir: &Path,
    prediction_type: Option<&str>,
) -> Result<ProbeStatus<Vec<PerfRecord>>, ProbeError> {
    if !result_dir.is_dir() {
        return Ok(ProbeStatus::not_ready(format!(
            "{} does not exist yet",
            result_dir.display()
        )));
    }

    let mut archives = Vec::new();
    find_archives(result_dir, &mut archives)?;
    archives.sort();

    let mut records = Vec::with_capacity(archives.len());
    for path in archives {
        match archive::read_metadata(&path) {
            Ok(metadata) => {
                let matches = prediction_type
                    .is_none_or(|wanted| metadata.model_parameters.prediction_type == wanted);
                if matches {
                    records.push(PerfRecord::from_metadata(metadata, path));
                }
            }
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }

    let found = records.len();
    Ok(ProbeStatus::ready(records, found))
}

/// Collects `*.tar.gz` paths below `dir`
///
/// Symlinks are not followed. Directories that vanish mid-walk are skipped,
/// since running jobs create and remove scratch directories.
fn find_archives(dir: &Path, archives: &mut Vec<PathBuf>) -> Result<(), ProbeError> {
    let io_err = |source: std::io::Error| ProbeError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} disappeared during the scan", dir.display());
            return Ok(());
        }
        Err(e) => return Err(io_err(e)),
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(io_err(e)),
        };
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(io_err(e)),
        };

        let path = entry.path();
        if file_type.is_dir() {
            find_archives(&path, archives)?;
        } else if file_type.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(ARCHIVE_SUFFIX))
        {
            archives.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::{metadata_json, write_archive};
    use std::fs;

    #[tokio::test]
    async fn test_missing_result_dir_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let probe = PerfResultsProbe::new(dir.path().join("results"), None);

        let status = probe.probe().await.unwrap();
        assert!(matches!(status, ProbeStatus::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_counts_models_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("MRP3/RF/computed_descriptors");
        fs::create_dir_all(&nested).unwrap();

        let first = metadata_json("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e11", "RF", "regression");
        let second = metadata_json("7b2f3b8d-5e5c-4d47-8b9c-1a4a7e3caf22", "NN", "regression");
        write_archive(dir.path(), "a.tar.gz", &[("model_metadata.json", first.as_str())]);
        write_archive(&nested, "b.tar.gz", &[("model_metadata.json", second.as_str())]);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let status = PerfResultsProbe::new(dir.path(), None).probe().await.unwrap();
        match status {
            ProbeStatus::Ready { artifact, found } => {
                assert_eq!(found, 2);
                let mut types: Vec<_> = artifact.iter().map(|r| r.model_type.as_str()).collect();
                types.sort();
                assert_eq!(types, vec!["NN", "RF"]);
            }
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filters_prediction_type_and_skips_broken() {
        let dir = tempfile::tempdir().unwrap();
        let regression = metadata_json("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e11", "RF", "regression");
        let classification =
            metadata_json("7b2f3b8d-5e5c-4d47-8b9c-1a4a7e3caf22", "RF", "classification");
        write_archive(dir.path(), "r.tar.gz", &[("model_metadata.json", regression.as_str())]);
        write_archive(
            dir.path(),
            "c.tar.gz",
            &[("model_metadata.json", classification.as_str())],
        );
        fs::write(dir.path().join("partial.tar.gz"), "still uploading").unwrap();

        let probe = PerfResultsProbe::new(dir.path(), Some("regression".to_string()));
        assert_eq!(probe.probe().await.unwrap().found(), 1);
    }

    #[test]
    fn test_vanished_subdirectory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = metadata_json("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e11", "RF", "regression");
        let archive = write_archive(
            dir.path(),
            "a.tar.gz",
            &[("model_metadata.json", metadata.as_str())],
        );

        let mut archives = Vec::new();
        find_archives(&dir.path().join("tmp_job_dir"), &mut archives).unwrap();
        assert!(archives.is_empty());

        find_archives(dir.path(), &mut archives).unwrap();
        assert_eq!(archives, vec![archive]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("MRP3");
        fs::create_dir_all(&nested).unwrap();
        std::os::unix::fs::symlink(dir.path(), nested.join("loop")).unwrap();

        let metadata = metadata_json("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e11", "RF", "regression");
        write_archive(&nested, "m.tar.gz", &[("model_metadata.json", metadata.as_str())]);

        let status = PerfResultsProbe::new(dir.path(), None).probe().await.unwrap();
        assert_eq!(status.found(), 1);
    }
}
