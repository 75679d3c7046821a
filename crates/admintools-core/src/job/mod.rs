//! Upload job orchestration

pub mod groups;
pub mod ledger;
pub mod log;
pub mod progress;
pub mod status;
pub mod upload;

pub use groups::{JobGroupGuard, JobGroupPath, JobGroups};
pub use ledger::ResourceLedger;
pub use log::{JobResult, JobResultLevel, RunLog};
pub use progress::{CancelFlag, JobProgress, NoProgress, StepCounter};
pub use status::{ReportError, RunStatus, UploadReport};
pub use upload::{UploadError, UploadJob, UploadRequest, UploadRunner, JOB_TYPE};
