//! Probe result types

/// What a single look at a result artifact found
///
/// Permanent failures are not represented here; probes report them as
/// [`crate::error::ProbeError`] so a wait loop can stop early.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeStatus<A> {
    /// The artifact was loaded and holds `found` completed results
    Ready { artifact: A, found: usize },
    /// The artifact is missing, partial or not yet parseable
    NotReady { reason: String },
}

impl<A> ProbeStatus<A> {
    pub fn ready(artifact: A, found: usize) -> Self {
        ProbeStatus::Ready { artifact, found }
    }

    pub fn not_ready(reason: impl Into<String>) -> Self {
        ProbeStatus::NotReady {
            reason: reason.into(),
        }
    }

    /// Completed results observed, zero when not ready
    pub fn found(&self) -> usize {
        match self {
            ProbeStatus::Ready { found, .. } => *found,
            ProbeStatus::NotReady { .. } => 0,
        }
    }
}
