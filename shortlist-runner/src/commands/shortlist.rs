//! Shortlist command handler
//!
//! Runs the shortlist pipeline as an end-to-end check: clean, stage data,
//! featurize/split/search, compare the model count, clean again. Hosts without
//! a batch scheduler skip the run and succeed.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use shortlist_core::domain::perf::PerfRecord;
use shortlist_core::domain::poll::MaxWait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CLUSTER_ENV_VAR, Config, cluster_name};
use crate::context::Workspace;
use crate::pipeline::ShortlistPipeline;

/// Arguments of the shortlist command
#[derive(Args)]
pub struct ShortlistArgs {
    /// Config for featurization and splitting
    #[arg(long, default_value = "test_shortlist_split_config.json")]
    split_config: PathBuf,

    /// Config for the hyperparameter search
    #[arg(long, default_value = "test_shortlist_RF-NN-XG_hyperconfig.json")]
    search_config: PathBuf,

    /// Number of trained models the search must produce
    #[arg(long, default_value_t = 18)]
    expect_models: usize,

    /// Directory holding the test datasets
    #[arg(long, env = "SHORTLIST_DATASETS", default_value = "../../test_datasets")]
    datasets: PathBuf,

    /// Wait limit per stage in seconds for this run (-1 waits forever)
    #[arg(long, default_value = "-1", allow_negative_numbers = true)]
    stage_max_time: MaxWait,

    /// Run even when no batch scheduler is detected
    #[arg(long)]
    force: bool,
}

/// Handle the shortlist command
pub async fn handle_shortlist_command(
    args: ShortlistArgs,
    config: Config,
    workspace: Arc<Workspace>,
) -> Result<()> {
    match cluster_name() {
        Some(cluster) => info!("Running shortlist pipeline on cluster {}", cluster),
        None if args.force => warn!("No batch scheduler detected, running anyway"),
        None => {
            println!(
                "{}",
                format!(
                    "No batch scheduler detected ({} unset), skipping shortlist run.",
                    CLUSTER_ENV_VAR
                )
                .yellow()
            );
            return Ok(());
        }
    }

    workspace.clean().context("Failed to clean workspace")?;
    workspace
        .init_data(&workspace.resolve(&args.datasets))
        .context("Failed to stage test datasets")?;

    let config = Config {
        max_wait: args.stage_max_time,
        ..config
    };
    let pipeline = ShortlistPipeline::new(config, Arc::clone(&workspace));
    let records = pipeline
        .run(&args.split_config, &args.search_config)
        .await?
        .context("Hyperparameter search timed out or submitted no jobs")?;

    print_perf_records(&records);

    if records.len() != args.expect_models {
        anyhow::bail!(
            "Expected {} trained model(s), found {}",
            args.expect_models,
            records.len()
        );
    }

    workspace.clean().context("Failed to clean workspace")?;
    println!("{}", "Shortlist pipeline passed.".green().bold());
    Ok(())
}

/// Prints the performance results table
pub fn print_perf_records(records: &[PerfRecord]) {
    if records.is_empty() {
        println!("{}", "No trained models found.".yellow());
        return;
    }

    println!("{}", format!("Found {} model(s):", records.len()).bold());
    println!();
    for record in records {
        println!(
            "  {} {} {}",
            record.model_uuid.to_string().cyan(),
            record.model_type.bold(),
            record.prediction_type
        );
        println!("    {} {}", "Split:".dimmed(), record.split_uuid);
        if let Some(featurizer) = &record.featurizer {
            println!("    {} {}", "Featurizer:".dimmed(), featurizer);
        }
        for (name, score) in &record.metrics {
            println!("    {} {:.4}", format!("{}:", name).dimmed(), score);
        }
        println!("    {} {}", "Archive:".dimmed(), record.archive.display());
    }
}
