//! Result probes
//!
//! A probe takes one look at the artifact an external job is expected to
//! write and reports whether it is ready and how many results it holds.
//! Missing or half-written artifacts are `NotReady`; only failures that
//! waiting cannot fix are returned as errors.

pub mod csv;
pub mod perf;

pub use self::csv::{CsvExistsProbe, CsvRowsProbe, CsvTable};
pub use self::perf::PerfResultsProbe;

use async_trait::async_trait;
use shortlist_core::domain::probe::ProbeStatus;
use shortlist_core::error::ProbeError;

/// A single look at a result artifact
#[async_trait]
pub trait Probe: Send + Sync {
    /// What a successful probe yields
    type Artifact: Send;

    /// Human-readable description of what is being watched
    fn describe(&self) -> String;

    /// Loads the artifact once
    async fn probe(&self) -> Result<ProbeStatus<Self::Artifact>, ProbeError>;
}
