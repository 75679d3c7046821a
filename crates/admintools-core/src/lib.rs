//! Admin Tools core - package upload with backup and rollback
//!
//! Applies an uploaded package archive onto a running installation. Every
//! replaced file is backed up first; if any entry fails, everything the run
//! already touched is put back.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod apply;
pub mod archive;
pub mod backup;
pub mod config;
pub mod job;
pub mod resolve;
pub mod util;

pub use backup::UploadResource;
pub use config::AdminToolsConfig;
pub use job::{RunLog, RunStatus, UploadJob, UploadReport, UploadRequest, UploadRunner};
