//! Best-effort rollback of a failed upload batch

use crate::backup::UploadResource;
use crate::job::log::{messages, RunLog};
use crate::job::progress::JobProgress;
use crate::util::file_name_of;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of one recovery step for one resource
#[derive(Error, Debug)]
pub enum RollbackStepError {
    #[error("Failed to delete backup {0}: {1}")]
    DeleteBackup(PathBuf, #[source] io::Error),

    #[error("Failed to delete target {0}: {1}")]
    DeleteTarget(PathBuf, #[source] io::Error),

    #[error("Failed to restore {target} from {backup}: {source}")]
    Restore {
        backup: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RollbackStepError {
    /// Record this failure in the run log under its translation key
    fn log_to(&self, log: &mut RunLog) {
        match self {
            Self::DeleteBackup(path, _) => {
                log.error(messages::ROLLBACK_BACKUP_FAIL, [file_name_of(path)]);
            }
            Self::DeleteTarget(path, _) => {
                log.error(messages::ROLLBACK_TARGET_FAIL, [file_name_of(path)]);
            }
            Self::Restore { backup, target, .. } => {
                log.error(
                    messages::ROLLBACK_COPY_FAIL,
                    [file_name_of(backup), file_name_of(target)],
                );
            }
        }
    }
}

/// What a rollback pass managed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackSummary {
    /// Resources fully returned to their pre-run state
    pub restored: usize,
    /// Resources with at least one failed recovery step
    pub failed: usize,
}

impl RollbackSummary {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Undo every resource in the ledger, in application order.
///
/// Each resource is recovered independently: a failed step is written to the
/// run log as an error and the pass moves on, so this never fails outward.
pub fn rollback(
    ledger: &[UploadResource],
    log: &mut RunLog,
    progress: &mut dyn JobProgress,
) -> RollbackSummary {
    let mut summary = RollbackSummary::default();
    tracing::warn!(resources = ledger.len(), "rolling back upload batch");

    for resource in ledger {
        progress.start_step();
        let errors = restore_resource(resource);

        if errors.is_empty() {
            summary.restored += 1;
            log.info(
                messages::ROLLBACK_SUCCESS,
                [resource.new_file_name.clone()],
            );
        } else {
            summary.failed += 1;
            for err in &errors {
                tracing::error!(entry = %resource.original_entry_name, "{err}");
                err.log_to(log);
            }
        }

        progress.end_step();
        std::thread::yield_now();
    }

    tracing::info!(
        restored = summary.restored,
        failed = summary.failed,
        "rollback finished"
    );
    summary
}

/// Apply the single recovery action matching the resource's recorded state
fn restore_resource(resource: &UploadResource) -> Vec<RollbackStepError> {
    let mut errors = Vec::new();

    match (&resource.backup_file, resource.uploaded()) {
        // Never written: the target is untouched, only the backup is ours.
        (backup, false) => {
            if let Some(backup) = backup {
                if let Err(e) = delete_if_exists(backup) {
                    errors.push(RollbackStepError::DeleteBackup(backup.clone(), e));
                }
            }
        }
        // Written where nothing existed before: remove it.
        (None, true) => {
            let installed = resource.installed_path();
            if let Err(e) = delete_if_exists(&installed) {
                errors.push(RollbackStepError::DeleteTarget(installed, e));
            }
        }
        (Some(backup), true) => {
            if resource.is_rename() {
                let installed = resource.installed_path();
                if let Err(e) = delete_if_exists(&installed) {
                    errors.push(RollbackStepError::DeleteTarget(installed, e));
                }
            }

            match fs::copy(backup, &resource.target_file) {
                Ok(_) => {
                    if let Err(e) = delete_if_exists(backup) {
                        errors.push(RollbackStepError::DeleteBackup(backup.clone(), e));
                    }
                }
                // The backup is the only copy of the original; keep it.
                Err(source) => errors.push(RollbackStepError::Restore {
                    backup: backup.clone(),
                    target: resource.target_file.clone(),
                    source,
                }),
            }
        }
    }

    errors
}

fn delete_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
