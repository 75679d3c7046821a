//! Backup and rollback of upload targets

pub mod create;
pub mod restore;
mod types;

pub use create::{BackupError, BackupManager, BACKUP_SUFFIX};
pub use restore::{rollback, RollbackStepError, RollbackSummary};
pub use types::*;
