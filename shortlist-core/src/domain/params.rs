//! Pipeline parameters
//!
//! The subset of a pipeline JSON config the harness needs in order to locate
//! scripts, the shortlist and the result directory. Unknown keys are ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ParamsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Root of the pipeline checkout
    pub script_dir: PathBuf,
    /// Interpreter used to launch pipeline scripts
    pub python_path: PathBuf,
    /// Directory where trained model archives are written
    pub result_dir: PathBuf,
    /// `regression` or `classification`
    pub prediction_type: String,
    /// Shortlist file name, with or without the `.csv` suffix
    pub shortlist_key: String,
    /// Descriptor set used for featurization, e.g. `rdkit_raw`
    pub descriptor_type: String,
}

impl PipelineParams {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ParamsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Shortlist key without its `.csv` suffix
    pub fn shortlist_stem(&self) -> &str {
        self.shortlist_key
            .strip_suffix(".csv")
            .unwrap_or(&self.shortlist_key)
    }

    /// Path of the featurized dataset for a shortlist `dataset_key`
    ///
    /// `a/b/set.csv` becomes `a/b/scaled_descriptors/set_with_<descriptor>_descriptors.csv`.
    pub fn featurized_dataset_path(&self, dataset_key: &str) -> Result<PathBuf, ParamsError> {
        let featurized = dataset_key.replace(
            ".csv",
            &format!("_with_{}_descriptors.csv", self.descriptor_type),
        );
        let (dir, file) = featurized
            .rsplit_once('/')
            .ok_or_else(|| ParamsError::InvalidDatasetKey(dataset_key.to_string()))?;
        if file.is_empty() {
            return Err(ParamsError::InvalidDatasetKey(dataset_key.to_string()));
        }

        Ok(Path::new(dir).join("scaled_descriptors").join(file))
    }
}
