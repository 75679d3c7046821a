//! Final status of a run and its persisted report

use crate::backup::{RollbackSummary, UploadResource};
use crate::job::log::RunLog;
use crate::util::{validate_run_id, PathError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Every entry was applied
    Saved,
    /// An entry failed and the batch was rolled back, possibly only in part
    Failed,
    /// Canceled before any entry was processed; nothing was touched
    Canceled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "SAVED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// Errors reading or writing saved reports
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No report for run {0}")]
    NotFound(String),

    #[error("Invalid run id: {0}")]
    InvalidRunId(#[from] PathError),
}

/// Everything the operator gets back from one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub run_id: String,
    pub file_ref: String,
    pub status: RunStatus,
    pub log: RunLog,
    /// Ledger at the end of the forward pass, in application order
    pub resources: Vec<UploadResource>,
    /// Present when a rollback ran
    pub rollback: Option<RollbackSummary>,
    /// Error that stopped the batch
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl UploadReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Saved
    }

    /// Path of the saved report for `run_id` inside `status_dir`
    #[must_use]
    pub fn path_in(status_dir: &Path, run_id: &str) -> PathBuf {
        status_dir.join(format!("{run_id}.json"))
    }

    /// Write the report as `<run_id>.json` in `status_dir`
    ///
    /// # Errors
    /// Returns an error if the report cannot be written
    pub fn save(&self, status_dir: &Path) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(status_dir)?;
        let path = Self::path_in(status_dir, &self.run_id);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Load a saved report
    ///
    /// # Errors
    /// Returns an error if the run id is not a plain name, or if the report is
    /// missing or cannot be parsed
    pub fn load(status_dir: &Path, run_id: &str) -> Result<Self, ReportError> {
        validate_run_id(run_id)?;
        let path = Self::path_in(status_dir, run_id);
        if !path.exists() {
            return Err(ReportError::NotFound(run_id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
