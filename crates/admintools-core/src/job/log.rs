//! Operator-facing run log

use serde::{Deserialize, Serialize};
use std::fmt;

/// Translation keys for run log records
pub mod messages {
    pub const BACKUP_SUCCESS: &str = "adminTools.jobs.upload.backup.success";
    pub const BACKUP_FAIL: &str = "adminTools.jobs.upload.backup.fail";
    pub const ASSESS_ORIGINAL_FAIL: &str = "adminTools.jobs.upload.assessoriginal.fail";
    pub const ARCHIVE_FAIL: &str = "adminTools.jobs.upload.archive.fail";
    pub const SAVE_SUCCESS: &str = "adminTools.jobs.upload.batch.save.success";
    pub const SAVE_FAIL: &str = "adminTools.jobs.upload.batch.save.fail";
    pub const ROLLBACK_SUCCESS: &str = "adminTools.jobs.upload.batch.backup.success";
    pub const ROLLBACK_BACKUP_FAIL: &str = "adminTools.jobs.upload.batch.backup.backup.fail";
    pub const ROLLBACK_TARGET_FAIL: &str = "adminTools.jobs.upload.batch.backup.target.fail";
    pub const ROLLBACK_COPY_FAIL: &str = "adminTools.jobs.upload.batch.backup.copy.fail";
}

/// Severity of a run log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobResultLevel {
    Info,
    Error,
}

impl fmt::Display for JobResultLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One leveled, parameterized record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub message: String,
    pub level: JobResultLevel,
    pub parameters: Vec<String>,
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)?;
        if !self.parameters.is_empty() {
            write!(f, " ({})", self.parameters.join(", "))?;
        }
        Ok(())
    }
}

/// Append-only list of results for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLog {
    entries: Vec<JobResult>,
}

impl RunLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, mirroring it to the tracing output
    pub fn push<I, S>(&mut self, message: &str, level: JobResultLevel, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let result = JobResult {
            message: message.to_string(),
            level,
            parameters: parameters.into_iter().map(Into::into).collect(),
        };
        match level {
            JobResultLevel::Info => tracing::info!(params = ?result.parameters, "{}", result.message),
            JobResultLevel::Error => {
                tracing::error!(params = ?result.parameters, "{}", result.message);
            }
        }
        self.entries.push(result);
    }

    pub fn info<I, S>(&mut self, message: &str, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(message, JobResultLevel::Info, parameters);
    }

    pub fn error<I, S>(&mut self, message: &str, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(message, JobResultLevel::Error, parameters);
    }

    #[must_use]
    pub fn entries(&self) -> &[JobResult] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if any record has the given level
    #[must_use]
    pub fn has_level(&self, level: JobResultLevel) -> bool {
        self.entries.iter().any(|entry| entry.level == level)
    }

    /// Message keys in order, handy for assertions and summaries
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.message.as_str()).collect()
    }
}
