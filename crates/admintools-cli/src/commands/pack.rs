//! `admintools pack`

use admintools_core::archive::create_archive;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Zip `source` into an upload package at `output`
pub fn execute(source: &Path, output: &Path) -> Result<()> {
    if !source.is_dir() {
        bail!("Source directory does not exist: {}", source.display());
    }

    let count = create_archive(source, output)
        .with_context(|| format!("Failed to create package {}", output.display()))?;
    println!("Packed {count} files into {}", output.display());
    Ok(())
}
