//! Target resolution for archive entries
//!
//! An entry normally replaces the file at the same relative path under the
//! install root. Versioned libraries are the exception: `ant-launcher-1.10.14.jar`
//! has to replace whatever `ant-launcher-*.jar` is currently installed.

use crate::util::{file_name_of, safe_join, PathError};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Extension that triggers the family-match heuristic
pub const LIBRARY_EXTENSION: &str = "jar";

/// Errors while resolving an entry's target file
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unable to correctly assess the original file for {file_name}: {candidates:?} all match family {family}")]
    AmbiguousTarget {
        file_name: String,
        family: String,
        candidates: Vec<String>,
    },

    #[error("{file_name} resolves to a file already changed by entry {earlier_entry}")]
    AlreadyTouched {
        file_name: String,
        earlier_entry: String,
    },

    #[error("IO error while listing {0}: {1}")]
    Io(PathBuf, #[source] io::Error),

    #[error("Path security error: {0}")]
    PathSecurity(#[from] PathError),
}

/// Where an entry's content should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// File that will be replaced, or created when nothing is installed yet
    pub target_file: PathBuf,
    /// Name the new content is stored under, taken from the entry
    pub new_file_name: String,
}

impl ResolvedTarget {
    /// Path the new content will be written to
    #[must_use]
    pub fn installed_path(&self) -> PathBuf {
        match self.target_file.parent() {
            Some(parent) => parent.join(&self.new_file_name),
            None => PathBuf::from(&self.new_file_name),
        }
    }
}

/// Resolve the file an entry should replace
///
/// # Errors
/// Returns `ResolveError::AmbiguousTarget` when more than one installed
/// library belongs to the entry's family, and a path error when the entry
/// name escapes the install root
pub fn resolve_target(install_root: &Path, entry_path: &str) -> Result<ResolvedTarget, ResolveError> {
    let target_file = safe_join(install_root, Path::new(entry_path))?;
    let new_file_name = file_name_of(&target_file);

    if target_file.exists() {
        return Ok(ResolvedTarget {
            target_file,
            new_file_name,
        });
    }

    let is_library = target_file
        .extension()
        .is_some_and(|ext| ext == LIBRARY_EXTENSION);
    if !is_library {
        return Ok(ResolvedTarget {
            target_file,
            new_file_name,
        });
    }

    let family = family_name(&new_file_name);
    let parent = target_file.parent().unwrap_or(install_root);
    let mut candidates = installed_family_members(parent, family)?;

    match candidates.len() {
        0 => Ok(ResolvedTarget {
            target_file,
            new_file_name,
        }),
        1 => {
            let installed = candidates.remove(0);
            tracing::debug!(
                entry = entry_path,
                installed = %installed,
                family,
                "matched installed library by family"
            );
            Ok(ResolvedTarget {
                target_file: parent.join(installed),
                new_file_name,
            })
        }
        _ => Err(ResolveError::AmbiguousTarget {
            family: family.to_string(),
            file_name: new_file_name,
            candidates,
        }),
    }
}

fn installed_family_members(dir: &Path, family: &str) -> Result<Vec<String>, ResolveError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ResolveError::Io(dir.to_path_buf(), e)),
    };

    let suffix = format!(".{LIBRARY_EXTENSION}");
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ResolveError::Io(dir.to_path_buf(), e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(family) && name.ends_with(&suffix) && entry.path().is_file() {
            matches.push(name);
        }
    }
    matches.sort();
    Ok(matches)
}

fn leading_name_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+").expect("static regex"))
}

fn version_or_extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:-[0-9]|\.[^.]+$)").expect("static regex"))
}

/// Strip the version token from a library file name.
///
/// The family is the longest leading run of word characters and hyphens that
/// is directly followed by a `-<digit>` group or by the final extension.
/// Names that do not fit the pattern are returned unchanged.
#[must_use]
pub fn family_name(file_name: &str) -> &str {
    let Some(run) = leading_name_run().find(file_name) else {
        return file_name;
    };

    // The run is ASCII, so every offset in it is a char boundary.
    (1..=run.end())
        .rev()
        .find(|&end| version_or_extension().is_match(&file_name[end..]))
        .map_or(file_name, |end| &file_name[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_name_strips_dotted_version() {
        assert_eq!(family_name("ant-launcher-1.10.11.jar"), "ant-launcher");
        assert_eq!(family_name("foo-bar-1.3.jar"), "foo-bar");
    }

    #[test]
    fn test_family_name_keeps_digits_inside_name() {
        assert_eq!(family_name("commons-lang3-3.12.0.jar"), "commons-lang3");
        assert_eq!(family_name("log4j-api-2.20.0.jar"), "log4j-api");
    }

    #[test]
    fn test_family_name_without_version() {
        assert_eq!(family_name("xwiki.jar"), "xwiki");
        assert_eq!(family_name("my_lib.jar"), "my_lib");
    }

    #[test]
    fn test_family_name_multi_word_family() {
        assert_eq!(family_name("jetty-server-12.0.3.jar"), "jetty-server");
    }

    #[test]
    fn test_family_name_unmatched_is_identity() {
        assert_eq!(family_name(".jar"), ".jar");
        assert_eq!(family_name(""), "");
    }

    #[test]
    fn test_installed_path_uses_new_name() {
        let renamed = ResolvedTarget {
            target_file: PathBuf::from("/opt/lib/a-1.0.jar"),
            new_file_name: "a-2.0.jar".to_string(),
        };
        assert_eq!(renamed.installed_path(), PathBuf::from("/opt/lib/a-2.0.jar"));
    }
}
