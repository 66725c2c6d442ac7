//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod shortlist;
mod split_uuid;
mod staging;
mod wait;

pub use shortlist::ShortlistArgs;
pub use wait::WaitArgs;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::context::Workspace;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a job and wait for its results to appear
    Wait(WaitArgs),
    /// Run the shortlist featurize/split/search pipeline end to end
    Shortlist(ShortlistArgs),
    /// Print the split UUID a model archive was trained on
    SplitUuid {
        /// Path to a model .tar.gz
        tarball: PathBuf,
    },
    /// Copy the test datasets into the workspace
    InitData {
        /// Directory holding the test datasets
        #[arg(long, env = "SHORTLIST_DATASETS")]
        datasets: PathBuf,
    },
    /// Remove files left by previous runs
    Clean,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The validated runner configuration
pub async fn handle_command(command: Commands, config: Config) -> Result<()> {
    let workspace = Arc::new(Workspace::new(config.workdir.clone()));

    match command {
        Commands::Wait(args) => wait::handle_wait_command(args, config, workspace).await,
        Commands::Shortlist(args) => {
            shortlist::handle_shortlist_command(args, config, workspace).await
        }
        Commands::SplitUuid { tarball } => split_uuid::handle_split_uuid_command(&workspace, &tarball),
        Commands::InitData { datasets } => staging::handle_init_data_command(&workspace, &datasets),
        Commands::Clean => staging::handle_clean_command(&workspace),
    }
}
