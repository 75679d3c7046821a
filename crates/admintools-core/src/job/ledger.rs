//! Ordered record of what a run has touched

use crate::backup::UploadResource;
use std::path::Path;

/// Resources in application order; the only input rollback works from.
///
/// A resource is recorded as soon as its backup exists, before its write
/// starts, so a write that fails halfway still has its backup accounted for.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    resources: Vec<UploadResource>,
}

impl ResourceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource and hand back the recorded copy for further updates
    pub fn record(&mut self, resource: UploadResource) -> &mut UploadResource {
        self.resources.push(resource);
        let last = self.resources.len() - 1;
        &mut self.resources[last]
    }

    /// Earliest recorded resource that replaced or wrote either path
    #[must_use]
    pub fn touching(&self, target: &Path, installed: &Path) -> Option<&UploadResource> {
        self.resources.iter().find(|resource| {
            let written = resource.installed_path();
            [target, installed]
                .iter()
                .any(|path| *path == resource.target_file.as_path() || *path == written.as_path())
        })
    }

    #[must_use]
    pub fn resources(&self) -> &[UploadResource] {
        &self.resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[must_use]
    pub fn into_resources(self) -> Vec<UploadResource> {
        self.resources
    }
}
