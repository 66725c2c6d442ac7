//! Model archive reading
//!
//! Trained models are written as gzip tarballs with a `model_metadata.json`
//! at their root.

use flate2::read::GzDecoder;
use serde::Deserialize;
use shortlist_core::domain::perf::{MODEL_METADATA_FILE, ModelMetadata, SplittingParameters};
use shortlist_core::error::ArchiveError;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};
use tar::Archive;
use tracing::debug;
use uuid::Uuid;

#[derive(Deserialize)]
struct SplitSection {
    splitting_parameters: SplittingParameters,
}

/// Returns the split UUID a model archive was trained on
///
/// The archive is extracted into a temporary directory that is removed on
/// return. Entries escaping the destination are refused by the unpacker.
pub fn extract_split_uuid(tar_file: &Path) -> Result<Uuid, ArchiveError> {
    let io_err = |source: std::io::Error| ArchiveError::Io {
        path: tar_file.to_path_buf(),
        source,
    };

    let tmpdir = tempfile::tempdir().map_err(io_err)?;
    let file = File::open(tar_file).map_err(io_err)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(tmpdir.path()).map_err(io_err)?;
    debug!(
        "Extracted {} into {}",
        tar_file.display(),
        tmpdir.path().display()
    );

    let metadata_path = tmpdir.path().join(MODEL_METADATA_FILE);
    if !metadata_path.is_file() {
        return Err(ArchiveError::MissingMetadata {
            path: tar_file.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(&metadata_path).map_err(io_err)?;
    let section: SplitSection =
        serde_json::from_str(&raw).map_err(|source| ArchiveError::Metadata {
            path: tar_file.to_path_buf(),
            source,
        })?;

    Ok(section.splitting_parameters.split_uuid)
}

/// Reads `model_metadata.json` from an archive without extracting it
pub fn read_metadata(tar_file: &Path) -> Result<ModelMetadata, ArchiveError> {
    let io_err = |source: std::io::Error| ArchiveError::Io {
        path: tar_file.to_path_buf(),
        source,
    };

    let file = File::open(tar_file).map_err(io_err)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries().map_err(io_err)? {
        let mut entry = entry.map_err(io_err)?;
        let entry_path = entry.path().map_err(io_err)?.into_owned();
        if !is_root_metadata(&entry_path) {
            continue;
        }

        let mut raw = String::new();
        entry.read_to_string(&mut raw).map_err(io_err)?;
        return serde_json::from_str(&raw).map_err(|source| ArchiveError::Metadata {
            path: tar_file.to_path_buf(),
            source,
        });
    }

    Err(ArchiveError::MissingMetadata {
        path: tar_file.to_path_buf(),
    })
}

// "model_metadata.json" and "./model_metadata.json" both count
fn is_root_metadata(entry_path: &Path) -> bool {
    let mut components = entry_path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == MODEL_METADATA_FILE
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::path::PathBuf;

    pub const SPLIT_UUID: &str = "0e9d0c2f-1b4a-4f21-8c2d-7f5e3a1b6c44";

    pub fn metadata_json(model_uuid: &str, model_type: &str, prediction_type: &str) -> String {
        format!(
            r#"{{
                "model_uuid": "{}",
                "model_parameters": {{
                    "model_type": "{}",
                    "prediction_type": "{}",
                    "featurizer": "computed_descriptors"
                }},
                "splitting_parameters": {{ "split_uuid": "{}" }}
            }}"#,
            model_uuid, model_type, prediction_type, SPLIT_UUID
        )
    }

    /// Writes a tar.gz holding the given (path, content) entries
    pub fn write_archive(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        for (entry_path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, entry_path, content.as_bytes())
                .unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_extract_split_uuid() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = metadata_json("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e11", "RF", "regression");
        let archive = write_archive(
            dir.path(),
            "model.tar.gz",
            &[
                ("model_metadata.json", metadata.as_str()),
                ("model/checkpoint", "weights"),
            ],
        );

        let split_uuid = extract_split_uuid(&archive).unwrap();
        assert_eq!(split_uuid.to_string(), SPLIT_UUID);
    }

    #[test]
    fn test_extract_split_uuid_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), "empty.tar.gz", &[("readme.txt", "hi")]);

        let err = extract_split_uuid(&archive).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingMetadata { .. }));
    }

    #[test]
    fn test_extract_split_uuid_not_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tar.gz");
        std::fs::write(&path, "not an archive").unwrap();

        let err = extract_split_uuid(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
    }

    #[test]
    fn test_read_metadata_streams_entry() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = metadata_json("6a1e2a7c-4d4b-4c36-9a8b-0f3f6d2b9e11", "NN", "classification");
        let archive = write_archive(
            dir.path(),
            "model.tar.gz",
            &[
                ("transformers/model_metadata.json", "{}"),
                ("./model_metadata.json", metadata.as_str()),
            ],
        );

        let metadata = read_metadata(&archive).unwrap();
        assert_eq!(metadata.model_parameters.model_type, "NN");
        assert_eq!(metadata.model_parameters.prediction_type, "classification");
    }

    #[test]
    fn test_read_metadata_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "model.tar.gz",
            &[("model_metadata.json", "{\"model_uuid\": 3}")],
        );

        let err = read_metadata(&archive).unwrap_err();
        assert!(matches!(err, ArchiveError::Metadata { .. }));
    }
}
