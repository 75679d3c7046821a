//! Safety copies of files an upload is about to replace

use crate::util::file_name_of;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix appended to a backed up file's name
pub const BACKUP_SUFFIX: &str = ".bak";

/// Errors during backup creation
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to back up {target} to {backup}: {source}")]
    Io {
        target: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    /// File name of the backup that could not be written
    #[must_use]
    pub fn backup_name(&self) -> String {
        match self {
            Self::Io { backup, .. } => file_name_of(backup),
        }
    }
}

/// Copies targets into a backup directory owned by a single run
#[derive(Debug, Clone)]
pub struct BackupManager {
    install_root: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    #[must_use]
    pub fn new(install_root: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            backup_dir: backup_dir.into(),
        }
    }

    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Backup location for `target_file`.
    ///
    /// The target's directory below the install root is mirrored inside the
    /// backup directory so same-named files from different folders never share
    /// a backup.
    #[must_use]
    pub fn backup_path_for(&self, target_file: &Path) -> PathBuf {
        let backup_name = format!("{}{BACKUP_SUFFIX}", file_name_of(target_file));
        let relative_dir = target_file
            .parent()
            .and_then(|parent| parent.strip_prefix(&self.install_root).ok())
            .unwrap_or_else(|| Path::new(""));
        self.backup_dir.join(relative_dir).join(backup_name)
    }

    /// Copy `target_file` into the backup directory if it exists.
    ///
    /// A stale backup with the same name is overwritten. Returns `None` without
    /// touching the filesystem when there is nothing to back up.
    ///
    /// # Errors
    /// Returns an error if the copy cannot complete
    pub fn maybe_backup(&self, target_file: &Path) -> Result<Option<PathBuf>, BackupError> {
        if !target_file.exists() {
            return Ok(None);
        }

        let backup = self.backup_path_for(target_file);
        let wrap = |source: io::Error| BackupError::Io {
            target: target_file.to_path_buf(),
            backup: backup.clone(),
            source,
        };

        if let Some(parent) = backup.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let copied = fs::copy(target_file, &backup).map_err(wrap)?;

        tracing::debug!(
            target = %target_file.display(),
            backup = %backup.display(),
            bytes = copied,
            "backed up target"
        );
        Ok(Some(backup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_target_is_not_backed_up() {
        let temp = TempDir::new().unwrap();
        let manager = BackupManager::new(temp.path().join("install"), temp.path().join("backup"));

        let result = manager
            .maybe_backup(&temp.path().join("install/none.txt"))
            .unwrap();

        assert!(result.is_none());
        assert!(!manager.backup_dir().exists(), "no I/O for missing targets");
    }

    #[test]
    fn test_backup_mirrors_relative_directory() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("install");
        fs::create_dir_all(install.join("WEB-INF/lib")).unwrap();
        let target = install.join("WEB-INF/lib/ant-1.10.jar");
        fs::write(&target, b"old jar").unwrap();

        let manager = BackupManager::new(&install, temp.path().join("backup/run-1"));
        let backup = manager.maybe_backup(&target).unwrap().unwrap();

        assert_eq!(
            backup,
            temp.path().join("backup/run-1/WEB-INF/lib/ant-1.10.jar.bak")
        );
        assert_eq!(fs::read(&backup).unwrap(), b"old jar");
    }

    #[test]
    fn test_stale_backup_is_overwritten() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("install");
        fs::create_dir_all(&install).unwrap();
        let target = install.join("xwiki.cfg");
        fs::write(&target, b"current").unwrap();

        let manager = BackupManager::new(&install, temp.path().join("backup"));
        fs::create_dir_all(manager.backup_dir()).unwrap();
        fs::write(manager.backup_path_for(&target), b"stale").unwrap();

        let backup = manager.maybe_backup(&target).unwrap().unwrap();
        assert_eq!(fs::read(backup).unwrap(), b"current");
    }

    #[test]
    fn test_directory_target_fails() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("install");
        fs::create_dir_all(install.join("conf.d")).unwrap();

        let manager = BackupManager::new(&install, temp.path().join("backup"));
        let err = manager.maybe_backup(&install.join("conf.d")).unwrap_err();
        assert_eq!(err.backup_name(), "conf.d.bak");
    }
}
