//! Job-completion poller
//!
//! Submits a batch job once, then looks at its result artifact every
//! `wait_interval` until enough results are present or the wait limit is hit.
//! The loop runs on the calling task; there is no cancellation once started.

use shortlist_core::domain::job::{ExpectedJobs, JobSpec};
use shortlist_core::domain::poll::{PollOutcome, PollPhase, PollState};
use shortlist_core::domain::probe::ProbeStatus;
use shortlist_core::error::{PollError, ProbeError};
use std::sync::Arc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::Workspace;
use crate::probe::Probe;
use crate::process;

/// Submits jobs and waits for their results
pub struct JobPoller {
    config: Config,
    workspace: Arc<Workspace>,
}

impl JobPoller {
    /// Creates a new job poller
    ///
    /// Submission commands run with the workspace root as working directory.
    pub fn new(config: Config, workspace: Arc<Workspace>) -> Self {
        Self { config, workspace }
    }

    /// Runs `spec` once and waits for `expected` results to show up in `probe`
    ///
    /// # Returns
    /// `Completed` with the last probed artifact, or `TimedOut`. A permanent
    /// probe failure ends the wait early with an error.
    pub async fn await_completion<P: Probe>(
        &self,
        spec: &JobSpec,
        expected: &ExpectedJobs,
        probe: &P,
    ) -> Result<PollOutcome<P::Artifact>, PollError> {
        let submission = process::submit(spec, self.workspace.root()).await?;
        let jobs_expected = expected.resolve(&submission.stdout);

        if let ExpectedJobs::Marker(marker) = expected {
            let job_ids = submission.job_ids(marker);
            if !job_ids.is_empty() {
                debug!("Scheduler job ids: {:?}", job_ids);
            }
        }

        info!(
            "Waiting on {} job(s) to finish. Checks every {}s",
            jobs_expected,
            self.config.wait_interval.as_secs_f64()
        );

        Ok(self.wait_for(jobs_expected, probe).await?)
    }

    /// Polls `probe` until it reports at least `jobs_expected` results
    ///
    /// The first look happens immediately. Every later look follows a sleep of
    /// one `wait_interval`, so a limited wait returns no later than
    /// `max_wait + wait_interval` after it started. With `jobs_expected == 0`
    /// the probe is never called and the outcome is `NothingSubmitted`.
    pub async fn wait_for<P: Probe>(
        &self,
        jobs_expected: usize,
        probe: &P,
    ) -> Result<PollOutcome<P::Artifact>, ProbeError> {
        let mut state = PollState::new(
            jobs_expected,
            self.config.wait_interval,
            self.config.max_wait,
        );

        loop {
            match state.phase() {
                PollPhase::Waiting => {}
                // Only reachable before any Ready probe, i.e. nothing was expected
                PollPhase::Done => {
                    warn!(
                        "No jobs expected for {}, nothing to wait on",
                        probe.describe()
                    );
                    return Ok(PollOutcome::NothingSubmitted { state });
                }
                PollPhase::TimedOut => {
                    warn!(
                        "Timed out after {}s waiting for {} ({} of {} found)",
                        state.time_waited.as_secs(),
                        probe.describe(),
                        state.jobs_found,
                        state.jobs_expected
                    );
                    return Ok(PollOutcome::TimedOut { state });
                }
            }

            match probe.probe().await? {
                ProbeStatus::Ready { artifact, found } => {
                    state.record_found(found);
                    if state.is_satisfied() {
                        info!(
                            "Found {} of {} result(s) for {} after {}s",
                            found,
                            state.jobs_expected,
                            probe.describe(),
                            state.time_waited.as_secs()
                        );
                        return Ok(PollOutcome::Completed { artifact, state });
                    }
                }
                ProbeStatus::NotReady { reason } => {
                    state.record_found(0);
                    debug!("Not ready: {}", reason);
                }
            }

            info!(
                "waited {} found {}",
                state.time_waited.as_secs(),
                state.jobs_found
            );

            time::sleep(state.wait_interval).await;
            state.record_wait();
        }
    }
}
