//! Working directory context
//!
//! Everything the harness stages or cleans up lives under an explicit root
//! directory. Nothing here reads the process working directory.

use shortlist_core::error::WorkspaceError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Datasets copied into `data/` before a run
pub const DATASETS: [&str; 2] = ["MRP3_dataset.csv", "delaney-processed_curated_fit.csv"];

/// Paths left behind by a shortlist run
const CLEAN_TARGETS: [&str; 6] = [
    "shortlist_test",
    "logs",
    "run.sh",
    "slurm_files",
    "test_shortlist_with_uuids.csv",
    "data",
];

/// Working directory for one harness invocation
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Resolves `path` against the root unless it is already absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Copies the test datasets from `datasets_dir` into `data/`
    ///
    /// # Returns
    /// Paths of the copied files
    pub fn init_data(&self, datasets_dir: &Path) -> Result<Vec<PathBuf>, WorkspaceError> {
        let data_dir = self.data_dir();
        std::fs::create_dir_all(&data_dir).map_err(|source| WorkspaceError::Io {
            path: data_dir.clone(),
            source,
        })?;

        let mut copied = Vec::with_capacity(DATASETS.len());
        for name in DATASETS {
            let source_path = datasets_dir.join(name);
            if !source_path.is_file() {
                return Err(WorkspaceError::MissingDataset { path: source_path });
            }

            let target = data_dir.join(name);
            std::fs::copy(&source_path, &target).map_err(|source| WorkspaceError::Io {
                path: target.clone(),
                source,
            })?;
            debug!("Copied {} to {}", source_path.display(), target.display());
            copied.push(target);
        }

        info!("Staged {} dataset(s) in {}", copied.len(), data_dir.display());
        Ok(copied)
    }

    /// Removes files and directories left by previous runs
    ///
    /// # Returns
    /// Paths that existed and were removed
    pub fn clean(&self) -> Result<Vec<PathBuf>, WorkspaceError> {
        let mut removed = Vec::new();

        for name in CLEAN_TARGETS {
            let path = self.root.join(name);
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else if path.exists() {
                std::fs::remove_file(&path)
            } else {
                continue;
            };

            result.map_err(|source| WorkspaceError::Io {
                path: path.clone(),
                source,
            })?;
            debug!("Removed {}", path.display());
            removed.push(path);
        }

        if !removed.is_empty() {
            info!("Cleaned {} path(s) under {}", removed.len(), self.root.display());
        }
        Ok(removed)
    }
}
