//! `admintools status`

use super::print_report;
use admintools_core::job::UploadReport;
use admintools_core::AdminToolsConfig;
use anyhow::{Context, Result};

/// Print the saved report of a previous run
pub fn execute(config: &AdminToolsConfig, run_id: &str, json: bool) -> Result<()> {
    let report = UploadReport::load(&config.status_dir(), run_id)
        .with_context(|| format!("Failed to load report for run {run_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
