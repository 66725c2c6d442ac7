//! Error types for the shortlist harness

use std::path::PathBuf;
use thiserror::Error;

/// Failure to run a submission command
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The command line had no program
    #[error("Submission command is empty")]
    EmptyCommand,

    /// The process could not be started
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure
    #[error("Submission '{command}' exited with code {exit_code}: {stderr}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// A probe failure that waiting will not fix
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid result artifact {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Errors that end a wait loop before it completes or times out
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("Probe failed permanently: {0}")]
    Probe(#[from] ProbeError),
}

/// Errors reading model archives
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to read archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive {} has no model_metadata.json", path.display())]
    MissingMetadata { path: PathBuf },

    #[error("Invalid model metadata in {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors loading pipeline parameters
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid dataset key '{0}': expected a path with a directory")]
    InvalidDatasetKey(String),
}

/// Errors staging or cleaning the working directory
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset {} not found", path.display())]
    MissingDataset { path: PathBuf },
}

/// Invalid maximum wait value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMaxWaitError {
    #[error("max wait must be -1 (unlimited) or at least 0, got {0}")]
    Negative(i64),

    #[error("max wait must be a whole number of seconds, got '{0}'")]
    NotANumber(String),
}
