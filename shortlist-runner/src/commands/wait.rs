//! Wait command handler
//!
//! Submits one command and waits on a single result artifact.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use colored::*;
use shortlist_core::domain::job::{ExpectedJobs, JobSpec};
use shortlist_core::domain::poll::PollOutcome;
use std::path::PathBuf;
use std::sync::Arc;

use super::shortlist::print_perf_records;
use crate::config::Config;
use crate::context::Workspace;
use crate::probe::{CsvExistsProbe, CsvRowsProbe, CsvTable, PerfResultsProbe};
use crate::scheduler::JobPoller;

/// Arguments of the wait command
#[derive(Args)]
#[command(group(
    ArgGroup::new("artifact")
        .required(true)
        .args(["csv", "csv_exists", "perf_dir"])
))]
pub struct WaitArgs {
    /// Number of jobs to wait for, instead of counting the job marker
    #[arg(long, conflicts_with = "marker")]
    expect: Option<usize>,

    /// Count this substring in the command's output to get the job count
    #[arg(long)]
    marker: Option<String>,

    /// Wait until this CSV holds one row per job
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Wait until this CSV exists and parses
    #[arg(long)]
    csv_exists: Option<PathBuf>,

    /// Wait until this directory holds one model archive per job
    #[arg(long)]
    perf_dir: Option<PathBuf>,

    /// Only count models of this prediction type
    #[arg(long, requires = "perf_dir")]
    prediction_type: Option<String>,

    /// Submission command and its arguments
    #[arg(last = true, required = true, num_args = 1..)]
    command: Vec<String>,
}

impl WaitArgs {
    fn expected_jobs(&self, config: &Config) -> ExpectedJobs {
        match (self.expect, &self.marker) {
            (Some(count), _) => ExpectedJobs::Fixed(count),
            (None, Some(marker)) => ExpectedJobs::Marker(marker.clone()),
            (None, None) => ExpectedJobs::Marker(config.job_marker.clone()),
        }
    }
}

/// Handle the wait command
///
/// Exits with an error when the wait times out.
pub async fn handle_wait_command(
    args: WaitArgs,
    config: Config,
    workspace: Arc<Workspace>,
) -> Result<()> {
    let spec = JobSpec::from_argv(&args.command).context("No submission command given")?;
    let expected = args.expected_jobs(&config);
    let poller = JobPoller::new(config, Arc::clone(&workspace));

    if let Some(path) = &args.csv {
        let probe = CsvRowsProbe::new(workspace.resolve(path));
        let outcome = poller.await_completion(&spec, &expected, &probe).await?;
        report(outcome, print_table)
    } else if let Some(path) = &args.csv_exists {
        let probe = CsvExistsProbe::new(workspace.resolve(path));
        let outcome = poller.await_completion(&spec, &expected, &probe).await?;
        report(outcome, print_table)
    } else if let Some(dir) = &args.perf_dir {
        let probe = PerfResultsProbe::new(workspace.resolve(dir), args.prediction_type.clone());
        let outcome = poller.await_completion(&spec, &expected, &probe).await?;
        report(outcome, |records| print_perf_records(records))
    } else {
        anyhow::bail!("One of --csv, --csv-exists or --perf-dir is required")
    }
}

/// Prints the outcome, turning a timeout or an empty submission into an error
fn report<A>(outcome: PollOutcome<A>, print: impl FnOnce(&A)) -> Result<()> {
    let state = outcome.state().clone();

    match outcome {
        PollOutcome::Completed { artifact, .. } => {
            println!(
                "{}",
                format!(
                    "Done: {} of {} result(s) after {}s",
                    state.jobs_found,
                    state.jobs_expected,
                    state.time_waited.as_secs()
                )
                .green()
                .bold()
            );
            print(&artifact);
            Ok(())
        }
        PollOutcome::TimedOut { .. } => anyhow::bail!(
            "Timed out after {}s: found {} of {} result(s)",
            state.time_waited.as_secs(),
            state.jobs_found,
            state.jobs_expected
        ),
        PollOutcome::NothingSubmitted { .. } => {
            anyhow::bail!("The command submitted no jobs, nothing to wait on")
        }
    }
}

fn print_table(table: &CsvTable) {
    println!("  {} {}", "Columns:".bold(), table.headers.join(", "));
    println!("  {} {}", "Rows:".bold(), table.len());
}
