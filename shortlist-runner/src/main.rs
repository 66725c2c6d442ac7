//! Shortlist Runner
//!
//! Drives the shortlist model-training pipeline from the outside: submits
//! batch jobs, waits for the files they produce and checks the results.
//!
//! Architecture:
//! - Configuration: Command line flags backed by environment variables
//! - Context: Explicit working directory for staging and cleanup
//! - Process: One-shot submission of scheduler commands
//! - Probes: Single looks at result artifacts (CSV files, model archives)
//! - Scheduler: The job-completion poller
//! - Pipeline: Featurize, split and search stages of a shortlist run

mod archive;
mod commands;
mod config;
mod context;
mod pipeline;
mod probe;
mod process;
mod scheduler;

use anyhow::Result;
use clap::Parser;
use shortlist_core::domain::poll::MaxWait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Commands, handle_command};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "shortlist-runner")]
#[command(about = "Submit shortlist pipeline jobs and wait for their results", long_about = None)]
#[command(after_help = "Unset flags fall back to the SHORTLIST_* environment variables.")]
struct Cli {
    /// Working directory for staged data and scratch output [env: SHORTLIST_WORKDIR]
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Seconds between two checks for results [env: SHORTLIST_WAIT_INTERVAL]
    #[arg(long)]
    interval: Option<u64>,

    /// Maximum seconds to wait per job submission, -1 waits forever [env: SHORTLIST_MAX_TIME]
    #[arg(long, allow_negative_numbers = true)]
    max_time: Option<MaxWait>,

    /// Text the scheduler prints once per submitted job [env: SHORTLIST_JOB_MARKER]
    #[arg(long)]
    job_marker: Option<String>,

    /// Shortlist test directory relative to the pipeline script_dir [env: SHORTLIST_DIR]
    #[arg(long)]
    shortlist_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Applies command line flags on top of `base`
    fn config(&self, base: Config) -> Config {
        Config {
            workdir: self.workdir.clone().unwrap_or(base.workdir),
            wait_interval: self
                .interval
                .map(Duration::from_secs)
                .unwrap_or(base.wait_interval),
            max_wait: self.max_time.unwrap_or(base.max_wait),
            job_marker: self.job_marker.clone().unwrap_or(base.job_marker),
            shortlist_dir: self.shortlist_dir.clone().unwrap_or(base.shortlist_dir),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortlist_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config(Config::from_env()?);
    config.validate()?;
    debug!("Loaded configuration: {:?}", config);

    if let Err(e) = handle_command(cli.command, config).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}
