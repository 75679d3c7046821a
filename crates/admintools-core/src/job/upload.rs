//! The package upload job
//!
//! Entries are processed one at a time in archive order: resolve the target,
//! back it up, record it, write the new content. The first failure stops the
//! batch and everything recorded so far is rolled back.

use crate::apply::{apply_resource, ApplyError};
use crate::archive::{ArchiveError, ArchiveReader};
use crate::backup::{rollback, BackupError, BackupManager, RollbackSummary, UploadResource};
use crate::config::AdminToolsConfig;
use crate::job::groups::{JobGroupPath, JobGroups};
use crate::job::ledger::ResourceLedger;
use crate::job::log::{messages, RunLog};
use crate::job::progress::JobProgress;
use crate::job::status::{RunStatus, UploadReport};
use crate::resolve::{resolve_target, ResolveError, ResolvedTarget};
use crate::util::{file_name_of, validate_run_id, PathError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Job type identifier
pub const JOB_TYPE: &str = "admintools.uploadpackage";

/// Errors that stop an upload batch
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("Invalid run id: {0}")]
    InvalidRunId(#[source] PathError),
}

/// What to upload and under which run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Reference of the uploaded package (attachment reference)
    pub file_ref: String,
    /// Identifier of this run; names the backup directory
    pub run_id: String,
    /// Job identifier the run is registered under
    pub job_id: Vec<String>,
}

impl UploadRequest {
    /// Request with a fresh run id and the default job id
    #[must_use]
    pub fn new(file_ref: impl Into<String>) -> Self {
        Self {
            file_ref: file_ref.into(),
            run_id: Uuid::new_v4().to_string(),
            job_id: vec!["adminTools".to_string(), "upload".to_string()],
        }
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Uploads of the same package share a group and never run concurrently
    #[must_use]
    pub fn group_path(&self) -> JobGroupPath {
        vec![
            "adminTools".to_string(),
            "import".to_string(),
            self.file_ref.clone(),
        ]
    }
}

/// One execution of the upload job
pub struct UploadJob {
    request: UploadRequest,
    install_root: PathBuf,
    backups: BackupManager,
    ledger: ResourceLedger,
    log: RunLog,
}

impl UploadJob {
    /// Job writing into `install_root` and backing up into `backup_dir`
    ///
    /// # Errors
    /// Returns an error if the run id cannot be used as a directory name
    pub fn new(
        request: UploadRequest,
        install_root: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
    ) -> Result<Self, UploadError> {
        validate_run_id(&request.run_id).map_err(UploadError::InvalidRunId)?;
        let install_root = install_root.into();
        Ok(Self {
            backups: BackupManager::new(install_root.clone(), backup_dir),
            install_root,
            request,
            ledger: ResourceLedger::new(),
            log: RunLog::new(),
        })
    }

    /// Job using the directories from `config`
    ///
    /// # Errors
    /// Returns an error if the run id cannot be used as a directory name
    pub fn from_config(request: UploadRequest, config: &AdminToolsConfig) -> Result<Self, UploadError> {
        let backup_dir = config.run_backup_dir(&request.run_id);
        Self::new(request, config.install_root.clone(), backup_dir)
    }

    #[must_use]
    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        self.backups.backup_dir()
    }

    /// Apply the package in `archive`, rolling back on the first failure
    pub fn run<R: Read>(mut self, archive: R, progress: &mut dyn JobProgress) -> UploadReport {
        let started_at = Utc::now();

        if progress.is_canceled() {
            tracing::info!(run_id = %self.request.run_id, "upload canceled before start");
            return self.into_report(RunStatus::Canceled, None, None, started_at);
        }

        tracing::info!(
            run_id = %self.request.run_id,
            file_ref = %self.request.file_ref,
            install_root = %self.install_root.display(),
            "starting package upload"
        );

        match self.apply_batch(archive, progress) {
            Ok(()) => {
                tracing::info!(
                    run_id = %self.request.run_id,
                    entries = self.ledger.len(),
                    "package upload saved"
                );
                self.into_report(RunStatus::Saved, None, None, started_at)
            }
            Err(err) => {
                tracing::error!(run_id = %self.request.run_id, "package upload failed: {err}");
                let summary = rollback(self.ledger.resources(), &mut self.log, progress);
                self.into_report(
                    RunStatus::Failed,
                    Some(err.to_string()),
                    Some(summary),
                    started_at,
                )
            }
        }
    }

    fn apply_batch<R: Read>(
        &mut self,
        archive: R,
        progress: &mut dyn JobProgress,
    ) -> Result<(), UploadError> {
        let mut reader = match ArchiveReader::new(archive) {
            Ok(reader) => reader,
            Err(err) => {
                self.log.error(messages::ARCHIVE_FAIL, [err.to_string()]);
                return Err(err.into());
            }
        };

        loop {
            let next = reader.next_entry();
            let mut entry = match next {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    self.log.error(messages::ARCHIVE_FAIL, [err.to_string()]);
                    return Err(err.into());
                }
            };
            if entry.is_dir() {
                continue;
            }

            progress.start_step();
            let name = entry.name().to_string();
            let outcome = match entry.read_content() {
                Ok(content) => self.process_entry(&name, content),
                Err(err) => {
                    self.log.error(messages::ARCHIVE_FAIL, [err.to_string()]);
                    Err(err.into())
                }
            };
            progress.end_step();
            outcome?;
            std::thread::yield_now();
        }

        Ok(())
    }

    fn process_entry(&mut self, entry_name: &str, content: Vec<u8>) -> Result<(), UploadError> {
        let resolved = resolve_target(&self.install_root, entry_name)
            .and_then(|target| ensure_untouched(&self.ledger, target));
        let target = match resolved {
            Ok(target) => target,
            Err(err) => {
                let file_name = file_name_of(Path::new(entry_name));
                self.log.error(messages::ASSESS_ORIGINAL_FAIL, [file_name]);
                return Err(err.into());
            }
        };

        let backup = match self.backups.maybe_backup(&target.target_file) {
            Ok(backup) => backup,
            Err(err) => {
                self.log.error(
                    messages::BACKUP_FAIL,
                    [err.backup_name(), target.new_file_name.clone()],
                );
                return Err(err.into());
            }
        };
        if let Some(backup) = &backup {
            self.log.info(
                messages::BACKUP_SUCCESS,
                [file_name_of(backup), target.new_file_name.clone()],
            );
        }

        let run_id = self.request.run_id.as_str();
        let resource = self.ledger.record(UploadResource::new(
            entry_name.to_string(),
            target,
            backup,
            content,
        ));

        if let Err(err) = apply_resource(resource, run_id) {
            self.log.error(messages::SAVE_FAIL, [err.failed_file_name()]);
            return Err(err.into());
        }
        self.log
            .info(messages::SAVE_SUCCESS, [resource.new_file_name.clone()]);

        Ok(())
    }

    fn into_report(
        self,
        status: RunStatus,
        error: Option<String>,
        rollback: Option<RollbackSummary>,
        started_at: DateTime<Utc>,
    ) -> UploadReport {
        UploadReport {
            run_id: self.request.run_id,
            file_ref: self.request.file_ref,
            status,
            log: self.log,
            resources: self.ledger.into_resources(),
            rollback,
            error,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Reject a target that an earlier entry of the same run already replaced or
/// wrote; its backup would no longer hold the pre-run bytes.
fn ensure_untouched(
    ledger: &ResourceLedger,
    target: ResolvedTarget,
) -> Result<ResolvedTarget, ResolveError> {
    match ledger.touching(&target.target_file, &target.installed_path()) {
        Some(earlier) => Err(ResolveError::AlreadyTouched {
            file_name: target.new_file_name,
            earlier_entry: earlier.original_entry_name.clone(),
        }),
        None => Ok(target),
    }
}

/// Runs upload jobs for one installation, serializing runs of the same package
#[derive(Debug, Clone)]
pub struct UploadRunner {
    config: AdminToolsConfig,
    groups: JobGroups,
}

impl UploadRunner {
    #[must_use]
    pub fn new(config: AdminToolsConfig) -> Self {
        Self {
            config,
            groups: JobGroups::new(),
        }
    }

    /// Runner sharing group locks with other runners
    #[must_use]
    pub fn with_groups(config: AdminToolsConfig, groups: JobGroups) -> Self {
        Self { config, groups }
    }

    #[must_use]
    pub fn config(&self) -> &AdminToolsConfig {
        &self.config
    }

    #[must_use]
    pub fn groups(&self) -> &JobGroups {
        &self.groups
    }

    /// Run one upload once its group is free
    ///
    /// # Errors
    /// Returns an error only if the job cannot be set up; batch failures are
    /// reported through the returned report's status
    pub fn run<R: Read>(
        &self,
        request: UploadRequest,
        archive: R,
        progress: &mut dyn JobProgress,
    ) -> Result<UploadReport, UploadError> {
        let job = UploadJob::from_config(request, &self.config)?;
        let _group = self.groups.acquire(job.request().group_path());
        Ok(job.run(archive, progress))
    }
}
