//! CLI command handlers
//!
//! One module per subcommand.

pub mod pack;
pub mod status;
pub mod upload;

use admintools_core::job::UploadReport;

/// Human-readable rendering of a run report
pub fn print_report(report: &UploadReport) {
    println!("Run {} ({}): {}", report.run_id, report.file_ref, report.status);
    for entry in report.log.entries() {
        println!("  {entry}");
    }
    if let Some(summary) = report.rollback {
        println!(
            "Rollback: {} restored, {} failed",
            summary.restored, summary.failed
        );
    }
    if let Some(error) = &report.error {
        println!("Error: {error}");
    }
}
