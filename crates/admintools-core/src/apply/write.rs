//! File write operations

use crate::backup::UploadResource;
use crate::util::file_name_of;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while applying a resource
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to delete original file [{path}]: {source}")]
    RemoveSuperseded {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ApplyError {
    /// Name of the file the failed step was working on
    #[must_use]
    pub fn failed_file_name(&self) -> String {
        match self {
            Self::Io { path, .. } | Self::RemoveSuperseded { path, .. } => file_name_of(path),
        }
    }
}

/// Staging name for `final_name` inside the same directory
pub(crate) fn staging_path(dir: &Path, final_name: &str, run_id: &str) -> PathBuf {
    dir.join(format!(".{final_name}.{run_id}.upload"))
}

/// Write a resource's content to its install location.
///
/// Content goes to a hidden staging file next to the target first and is then
/// renamed onto `new_file_name`, so the final name only ever holds complete
/// content. The resource is marked uploaded as soon as that rename lands. When
/// the entry renames a versioned library, the superseded file is removed last.
///
/// # Errors
/// Returns an error if the write, the rename or the removal fails; the staging
/// file is cleaned up on a failed write or rename
pub fn apply_resource(resource: &mut UploadResource, run_id: &str) -> Result<(), ApplyError> {
    let installed = resource.installed_path();
    let dir = installed
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let staging = staging_path(&dir, &resource.new_file_name, run_id);

    fs::create_dir_all(&dir).map_err(|source| ApplyError::Io {
        path: installed.clone(),
        source,
    })?;

    if let Err(source) = write_staging(&staging, &resource.new_content) {
        let _ = fs::remove_file(&staging);
        return Err(ApplyError::Io {
            path: installed,
            source,
        });
    }

    if let Err(source) = fs::rename(&staging, &installed) {
        let _ = fs::remove_file(&staging);
        return Err(ApplyError::Io {
            path: installed,
            source,
        });
    }
    resource.mark_uploaded();

    if resource.is_rename() && resource.target_file.exists() {
        fs::remove_file(&resource.target_file).map_err(|source| ApplyError::RemoveSuperseded {
            path: resource.target_file.clone(),
            source,
        })?;
    }

    tracing::debug!(
        entry = %resource.original_entry_name,
        installed = %installed.display(),
        bytes = resource.new_content.len(),
        "applied entry"
    );
    Ok(())
}

fn write_staging(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
