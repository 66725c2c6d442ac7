//! Job submission
//!
//! Runs a submission command once and captures what it printed. The command is
//! expected to hand work to a batch scheduler and exit; the jobs themselves are
//! only observed later through the files they write.

use shortlist_core::domain::job::{JobSpec, Submission};
use shortlist_core::error::SubmitError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Runs `spec` in `cwd` and waits for it to exit
///
/// A non-zero exit is an error: a submitter that failed will not produce the
/// artifacts a poller would wait for.
pub async fn submit(spec: &JobSpec, cwd: &Path) -> Result<Submission, SubmitError> {
    if spec.program.is_empty() {
        return Err(SubmitError::EmptyCommand);
    }

    info!("Submitting: {}", spec);

    let output = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| SubmitError::Spawn {
            command: spec.to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    // Always log stdout/stderr as debug
    if !stdout.trim().is_empty() {
        debug!("submission stdout: {}", stdout.trim());
    }
    if !stderr.trim().is_empty() {
        debug!("submission stderr: {}", stderr.trim());
    }

    let exit_code = output.status.code().unwrap_or(-1);
    if !output.status.success() {
        error!("Submission '{}' exited with code {}", spec, exit_code);
        return Err(SubmitError::Failed {
            command: spec.to_string(),
            exit_code,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(Submission {
        spec: spec.clone(),
        stdout,
        exit_code,
        submitted_at: chrono::Utc::now(),
    })
}
