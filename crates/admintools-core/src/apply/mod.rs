//! Writing uploaded content into the install directory

pub mod write;

pub use write::{apply_resource, ApplyError};
