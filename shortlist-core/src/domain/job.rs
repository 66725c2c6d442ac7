//! Job submission domain types

use serde::{Deserialize, Serialize};

/// Line prefix the batch scheduler prints for every accepted job
pub const DEFAULT_JOB_MARKER: &str = "Submitted batch job";

/// A command to run once, as an explicit argument vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl JobSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a spec from a full argv, first element being the program
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.iter().cloned()))
    }
}

impl std::fmt::Display for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How many jobs a submission is expected to complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedJobs {
    /// A known constant
    Fixed(usize),
    /// One job per occurrence of the marker in the submission's stdout
    Marker(String),
}

impl ExpectedJobs {
    /// Counts jobs using the scheduler's default marker
    pub fn scheduler_marker() -> Self {
        ExpectedJobs::Marker(DEFAULT_JOB_MARKER.to_string())
    }

    /// Resolves the expected count against captured submission output
    pub fn resolve(&self, stdout: &str) -> usize {
        match self {
            ExpectedJobs::Fixed(count) => *count,
            ExpectedJobs::Marker(marker) => count_marker(stdout, marker),
        }
    }
}

/// Result of running a submission command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub spec: JobSpec,
    pub stdout: String,
    pub exit_code: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl Submission {
    /// Scheduler job ids printed after each occurrence of `marker`
    ///
    /// Occurrences not followed by a number are skipped.
    pub fn job_ids(&self, marker: &str) -> Vec<u64> {
        job_ids_after_marker(&self.stdout, marker)
    }
}

/// Counts non-overlapping occurrences of `marker` in `output`
pub fn count_marker(output: &str, marker: &str) -> usize {
    if marker.is_empty() {
        return 0;
    }
    output.matches(marker).count()
}

fn job_ids_after_marker(output: &str, marker: &str) -> Vec<u64> {
    if marker.is_empty() {
        return Vec::new();
    }

    output
        .match_indices(marker)
        .filter_map(|(idx, _)| {
            let rest = output[idx + marker.len()..].trim_start();
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .collect()
}
