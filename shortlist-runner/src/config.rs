//! Runner configuration
//!
//! Defines the tunable parameters of the harness: where it works, how often it
//! polls, how long it waits and how it counts submitted jobs.

use anyhow::Context;
use shortlist_core::domain::job::DEFAULT_JOB_MARKER;
use shortlist_core::domain::poll::MaxWait;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable set on hosts with a batch scheduler
pub const CLUSTER_ENV_VAR: &str = "LCSCHEDCLUSTER";

/// Runner configuration
///
/// Values come from the environment (see [`Config::from_env`]); command line
/// flags override them (see `Cli` in main.rs).
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that holds staged data and scratch output
    pub workdir: PathBuf,

    /// Delay between two looks at a result artifact
    pub wait_interval: Duration,

    /// Total time a single stage may wait
    pub max_wait: MaxWait,

    /// Substring the scheduler prints once per accepted job
    pub job_marker: String,

    /// Shortlist test directory, relative to the pipeline's script_dir
    pub shortlist_dir: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            wait_interval: Duration::from_secs(30),
            max_wait: MaxWait::Limit(Duration::from_secs(1200)), // 20 minutes
            job_marker: DEFAULT_JOB_MARKER.to_string(),
            shortlist_dir: PathBuf::from("test/integrative/shortlist_test"),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - SHORTLIST_WORKDIR (default: .)
    /// - SHORTLIST_WAIT_INTERVAL (seconds, default: 30)
    /// - SHORTLIST_MAX_TIME (seconds, -1 for unlimited, default: 1200)
    /// - SHORTLIST_JOB_MARKER (default: "Submitted batch job")
    /// - SHORTLIST_DIR (default: test/integrative/shortlist_test)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let workdir = lookup("SHORTLIST_WORKDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::new(workdir);

        if let Some(raw) = lookup("SHORTLIST_WAIT_INTERVAL") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SHORTLIST_WAIT_INTERVAL is not a number: {}", raw))?;
            config.wait_interval = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("SHORTLIST_MAX_TIME") {
            config.max_wait = raw
                .parse::<MaxWait>()
                .context("Invalid SHORTLIST_MAX_TIME")?;
        }

        if let Some(marker) = lookup("SHORTLIST_JOB_MARKER") {
            config.job_marker = marker;
        }

        if let Some(dir) = lookup("SHORTLIST_DIR") {
            config.shortlist_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workdir.as_os_str().is_empty() {
            anyhow::bail!("workdir cannot be empty");
        }

        if self.wait_interval.is_zero() {
            anyhow::bail!("wait_interval must be greater than 0");
        }

        if self.job_marker.is_empty() {
            anyhow::bail!("job_marker cannot be empty");
        }

        if self.shortlist_dir.is_absolute() {
            anyhow::bail!("shortlist_dir must be relative to the pipeline script_dir");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

/// Name of the scheduler cluster this host belongs to, if any
pub fn cluster_name() -> Option<String> {
    std::env::var(CLUSTER_ENV_VAR)
        .ok()
        .filter(|name| !name.trim().is_empty())
}
