//! Per-entry upload records

use crate::resolve::ResolvedTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How far an entry got before the batch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    /// Target resolved and, if it existed, backed up; nothing written yet
    BackedUp,
    /// New content is in place under `new_file_name`
    Uploaded,
}

/// One archive entry that reached the backup stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResource {
    /// Path as stored in the archive
    pub original_entry_name: String,
    /// Final file name at the target location
    pub new_file_name: String,
    /// Resolved file that is replaced or created
    pub target_file: PathBuf,
    /// Copy of the replaced file, when there was one
    pub backup_file: Option<PathBuf>,
    /// Content read from the archive entry
    #[serde(skip)]
    pub new_content: Vec<u8>,
    pub state: ResourceState,
}

impl UploadResource {
    /// Create a record for a resolved entry whose backup (if any) is done
    #[must_use]
    pub fn new(
        original_entry_name: String,
        target: ResolvedTarget,
        backup_file: Option<PathBuf>,
        new_content: Vec<u8>,
    ) -> Self {
        Self {
            original_entry_name,
            new_file_name: target.new_file_name,
            target_file: target.target_file,
            backup_file,
            new_content,
            state: ResourceState::BackedUp,
        }
    }

    #[must_use]
    pub fn uploaded(&self) -> bool {
        self.state == ResourceState::Uploaded
    }

    pub fn mark_uploaded(&mut self) {
        self.state = ResourceState::Uploaded;
    }

    /// Path the new content ends up at: the target's directory plus `new_file_name`
    #[must_use]
    pub fn installed_path(&self) -> PathBuf {
        match self.target_file.parent() {
            Some(parent) => parent.join(&self.new_file_name),
            None => PathBuf::from(&self.new_file_name),
        }
    }

    /// Whether the written file carries a different name than the replaced one
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.installed_path() != self.target_file
    }
}
