//! CSV result probes

use anyhow::Context;
use async_trait::async_trait;
use shortlist_core::domain::probe::ProbeStatus;
use shortlist_core::error::ProbeError;
use std::io;
use std::path::{Path, PathBuf};

use super::Probe;

/// A CSV file loaded into memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parses CSV bytes with a header row
    ///
    /// Rows whose width differs from the header are rejected; that is what a
    /// file caught mid-write usually looks like.
    pub fn parse(bytes: &[u8]) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;

        Ok(Self { headers, rows })
    }

    /// Reads and parses a CSV file
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in the last row
    pub fn last_value(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.rows.last()?.get(idx).map(String::as_str)
    }
}

/// Loads a CSV, classifying failures as not-ready or permanent
async fn load_table(path: &Path) -> Result<ProbeStatus<CsvTable>, ProbeError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(ProbeStatus::not_ready(format!(
                "{} does not exist yet",
                path.display()
            )));
        }
        Err(source) => {
            return Err(ProbeError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match CsvTable::parse(&bytes) {
        Ok(table) => {
            let rows = table.len();
            Ok(ProbeStatus::ready(table, rows))
        }
        Err(e) => Ok(ProbeStatus::not_ready(format!(
            "{} is not readable yet: {}",
            path.display(),
            e
        ))),
    }
}

/// Counts the data rows of a CSV file
pub struct CsvRowsProbe {
    path: PathBuf,
}

impl CsvRowsProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Probe for CsvRowsProbe {
    type Artifact = CsvTable;

    fn describe(&self) -> String {
        format!("rows of {}", self.path.display())
    }

    async fn probe(&self) -> Result<ProbeStatus<CsvTable>, ProbeError> {
        load_table(&self.path).await
    }
}

/// Treats a CSV file as one completed result once it parses with a header
pub struct CsvExistsProbe {
    path: PathBuf,
}

impl CsvExistsProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Probe for CsvExistsProbe {
    type Artifact = CsvTable;

    fn describe(&self) -> String {
        format!("existence of {}", self.path.display())
    }

    async fn probe(&self) -> Result<ProbeStatus<CsvTable>, ProbeError> {
        Ok(match load_table(&self.path).await? {
            ProbeStatus::Ready { artifact, .. } if artifact.headers.is_empty() => {
                ProbeStatus::not_ready(format!("{} is empty", self.path.display()))
            }
            ProbeStatus::Ready { artifact, .. } => ProbeStatus::ready(artifact, 1),
            not_ready => not_ready,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_and_last_value() {
        let table = CsvTable::parse(
            b"dataset_key,bucket\n/data/a.csv,public\n/data/b.csv,public\n",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.last_value("dataset_key"), Some("/data/b.csv"));
        assert_eq!(table.last_value("missing"), None);
    }

    #[test]
    fn test_last_value_without_rows() {
        let table = CsvTable::parse(b"dataset_key\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.last_value("dataset_key"), None);
    }

    #[tokio::test]
    async fn test_rows_probe_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let probe = CsvRowsProbe::new(dir.path().join("nope.csv"));

        let status = probe.probe().await.unwrap();
        assert!(matches!(status, ProbeStatus::NotReady { .. }));
        assert_eq!(status.found(), 0);
    }

    #[tokio::test]
    async fn test_rows_probe_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feat.csv");
        fs::write(&path, "compound_id,d1,d2\nc1,0.1,0.2\nc2,0.3,0.4\n").unwrap();

        let status = CsvRowsProbe::new(&path).probe().await.unwrap();
        assert_eq!(status.found(), 2);
    }

    #[tokio::test]
    async fn test_rows_probe_partial_write_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feat.csv");
        fs::write(&path, "compound_id,d1,d2\nc1,0.1,0.2\nc2,0.3").unwrap();

        let status = CsvRowsProbe::new(&path).probe().await.unwrap();
        assert!(matches!(status, ProbeStatus::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_rows_probe_directory_is_permanent_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = CsvRowsProbe::new(dir.path()).probe().await;
        assert!(matches!(result, Err(ProbeError::Io { .. })));
    }

    #[tokio::test]
    async fn test_exists_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortlist_with_uuids.csv");
        let probe = CsvExistsProbe::new(&path);

        fs::write(&path, "").unwrap();
        assert!(matches!(
            probe.probe().await.unwrap(),
            ProbeStatus::NotReady { .. }
        ));

        fs::write(&path, "dataset_key,split_uuid\n").unwrap();
        assert_eq!(probe.probe().await.unwrap().found(), 1);
    }
}
