//! Split UUID command handler

use anyhow::{Context, Result};
use std::path::Path;

use crate::archive;
use crate::context::Workspace;

/// Prints the split UUID stored in a model archive
pub fn handle_split_uuid_command(workspace: &Workspace, tarball: &Path) -> Result<()> {
    let path = workspace.resolve(tarball);
    let split_uuid = archive::extract_split_uuid(&path)
        .with_context(|| format!("Failed to read split UUID from {}", path.display()))?;

    println!("{}", split_uuid);
    Ok(())
}
