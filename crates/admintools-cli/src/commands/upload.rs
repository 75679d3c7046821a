//! `admintools upload`

use super::print_report;
use admintools_core::job::{StepCounter, UploadRequest, UploadRunner};
use admintools_core::AdminToolsConfig;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Run one upload job; returns whether the run was saved
pub fn execute(
    config: AdminToolsConfig,
    archive: &Path,
    file_ref: Option<String>,
    run_id: Option<String>,
    json: bool,
) -> Result<bool> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open package {}", archive.display()))?;

    let file_ref = file_ref.unwrap_or_else(|| archive.display().to_string());
    let mut request = UploadRequest::new(file_ref);
    if let Some(run_id) = run_id {
        request = request.with_run_id(run_id);
    }

    let runner = UploadRunner::new(config);
    let mut progress = StepCounter::default();
    let report = runner.run(request, BufReader::new(file), &mut progress)?;
    tracing::debug!(steps = progress.ended, "upload job finished");

    let saved = report
        .save(&runner.config().status_dir())
        .context("Failed to save run report")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        println!("Report saved to {}", saved.display());
    }

    Ok(report.is_success())
}
