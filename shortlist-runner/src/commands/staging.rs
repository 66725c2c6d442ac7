//! Data staging command handlers

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::context::Workspace;

/// Copies the test datasets into the workspace
pub fn handle_init_data_command(workspace: &Workspace, datasets: &Path) -> Result<()> {
    let copied = workspace
        .init_data(&workspace.resolve(datasets))
        .context("Failed to stage test datasets")?;

    for path in copied {
        println!("{} {}", "Staged".green(), path.display());
    }
    Ok(())
}

/// Removes files left by previous runs
pub fn handle_clean_command(workspace: &Workspace) -> Result<()> {
    let removed = workspace.clean().context("Failed to clean workspace")?;

    if removed.is_empty() {
        println!("{}", "Nothing to clean.".yellow());
    } else {
        for path in removed {
            println!("{} {}", "Removed".red(), path.display());
        }
    }
    Ok(())
}
