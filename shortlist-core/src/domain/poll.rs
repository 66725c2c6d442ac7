//! Poll domain types
//!
//! A poll waits for an external process to produce a result artifact. The state
//! lives for one wait loop only: it is created when the loop starts and handed
//! back inside the [`PollOutcome`] when the loop ends.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ParseMaxWaitError;

/// Upper bound on the total time spent waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxWait {
    Unlimited,
    Limit(Duration),
}

impl MaxWait {
    /// Raw value meaning "wait forever"
    pub const UNLIMITED_SENTINEL: i64 = -1;

    /// Converts a raw seconds value where `-1` means unlimited
    pub fn from_secs(secs: i64) -> Result<Self, ParseMaxWaitError> {
        match secs {
            Self::UNLIMITED_SENTINEL => Ok(MaxWait::Unlimited),
            s if s >= 0 => Ok(MaxWait::Limit(Duration::from_secs(s as u64))),
            s => Err(ParseMaxWaitError::Negative(s)),
        }
    }

    /// True once `waited` has reached the limit
    pub fn is_exhausted(&self, waited: Duration) -> bool {
        match self {
            MaxWait::Unlimited => false,
            MaxWait::Limit(limit) => waited >= *limit,
        }
    }
}

impl std::str::FromStr for MaxWait {
    type Err = ParseMaxWaitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = s
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseMaxWaitError::NotANumber(s.to_string()))?;
        Self::from_secs(secs)
    }
}

impl std::fmt::Display for MaxWait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxWait::Unlimited => write!(f, "unlimited"),
            MaxWait::Limit(limit) => write!(f, "{}s", limit.as_secs()),
        }
    }
}

/// Phase of a wait loop
///
/// `Done` with nothing probed yet means no jobs were expected at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollPhase {
    Waiting,
    Done,
    TimedOut,
}

/// Counters for a single wait loop
///
/// `time_waited` only ever grows, one `wait_interval` per sleep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    pub jobs_expected: usize,
    pub jobs_found: usize,
    pub time_waited: Duration,
    pub wait_interval: Duration,
    pub max_wait: MaxWait,
}

impl PollState {
    pub fn new(jobs_expected: usize, wait_interval: Duration, max_wait: MaxWait) -> Self {
        Self {
            jobs_expected,
            jobs_found: 0,
            time_waited: Duration::ZERO,
            wait_interval,
            max_wait,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.jobs_found >= self.jobs_expected
    }

    pub fn is_timed_out(&self) -> bool {
        self.max_wait.is_exhausted(self.time_waited)
    }

    /// Satisfaction wins over timeout when both hold
    pub fn phase(&self) -> PollPhase {
        if self.is_satisfied() {
            PollPhase::Done
        } else if self.is_timed_out() {
            PollPhase::TimedOut
        } else {
            PollPhase::Waiting
        }
    }

    pub fn record_found(&mut self, found: usize) {
        self.jobs_found = found;
    }

    /// Accounts for one sleep of `wait_interval`
    pub fn record_wait(&mut self) {
        self.time_waited += self.wait_interval;
    }
}

/// How a wait loop ended
#[derive(Debug, Clone)]
pub enum PollOutcome<A> {
    /// Enough results were observed; `artifact` is the last successful probe
    Completed { artifact: A, state: PollState },
    /// The wait limit was reached first
    TimedOut { state: PollState },
    /// No jobs were expected, so there was nothing to wait on
    NothingSubmitted { state: PollState },
}

impl<A> PollOutcome<A> {
    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed { .. })
    }

    pub fn state(&self) -> &PollState {
        match self {
            PollOutcome::Completed { state, .. } => state,
            PollOutcome::TimedOut { state } => state,
            PollOutcome::NothingSubmitted { state } => state,
        }
    }

    /// The artifact, or `None` when the loop timed out or had nothing to wait on
    pub fn into_artifact(self) -> Option<A> {
        match self {
            PollOutcome::Completed { artifact, .. } => Some(artifact),
            PollOutcome::TimedOut { .. } | PollOutcome::NothingSubmitted { .. } => None,
        }
    }
}
