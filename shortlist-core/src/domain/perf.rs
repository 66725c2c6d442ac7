//! Model metadata and performance records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Name of the metadata file at the root of every model archive
pub const MODEL_METADATA_FILE: &str = "model_metadata.json";

/// The parts of `model_metadata.json` the harness reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_uuid: Uuid,
    #[serde(default)]
    pub model_parameters: ModelParameters,
    pub splitting_parameters: SplittingParameters,
    /// Raw `training_metrics` list; its layout varies between model types
    #[serde(default)]
    pub training_metrics: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    #[serde(default)]
    pub model_type: String,
    #[serde(default)]
    pub prediction_type: String,
    #[serde(default)]
    pub featurizer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplittingParameters {
    pub split_uuid: Uuid,
}

/// One row of the performance results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfRecord {
    pub model_uuid: Uuid,
    pub model_type: String,
    pub prediction_type: String,
    pub split_uuid: Uuid,
    pub featurizer: Option<String>,
    /// Scores of the best epoch, keyed `<subset>_<metric>` (e.g. `valid_r2_score`)
    pub metrics: BTreeMap<String, f64>,
    pub archive: PathBuf,
}

impl PerfRecord {
    pub fn from_metadata(metadata: ModelMetadata, archive: PathBuf) -> Self {
        let metrics = metadata
            .training_metrics
            .as_ref()
            .map(best_metrics)
            .unwrap_or_default();

        Self {
            model_uuid: metadata.model_uuid,
            model_type: metadata.model_parameters.model_type,
            prediction_type: metadata.model_parameters.prediction_type,
            split_uuid: metadata.splitting_parameters.split_uuid,
            featurizer: metadata.model_parameters.featurizer,
            metrics,
            archive,
        }
    }
}

/// Flattens the `label == "best"` entries of `training_metrics`
///
/// Non-numeric results and entries without a subset are ignored.
fn best_metrics(training_metrics: &Value) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();
    let Some(entries) = training_metrics.as_array() else {
        return metrics;
    };

    for entry in entries {
        if entry.get("label").and_then(Value::as_str) != Some("best") {
            continue;
        }
        let Some(subset) = entry.get("subset").and_then(Value::as_str) else {
            continue;
        };
        let Some(results) = entry.get("prediction_results").and_then(Value::as_object) else {
            continue;
        };
        for (name, value) in results {
            if let Some(score) = value.as_f64() {
                metrics.insert(format!("{}_{}", subset, name), score);
            }
        }
    }

    metrics
}
