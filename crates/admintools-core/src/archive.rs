//! Upload package archives
//!
//! Reading turns an uploaded byte stream into entries in storage order;
//! writing packs a directory tree into an upload package.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// Errors while reading or writing a package archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid package archive: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl From<ZipError> for ArchiveError {
    fn from(err: ZipError) -> Self {
        match err {
            ZipError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Self::Format(format!("truncated archive ({e})"))
            }
            ZipError::Io(e) => Self::Io(e),
            other => Self::Format(other.to_string()),
        }
    }
}

/// Forward-only reader over the entries of an uploaded package.
///
/// The archive is validated when the reader is opened, so a malformed upload
/// is rejected before any entry is handed out.
pub struct ArchiveReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    next: usize,
}

impl ArchiveReader {
    /// Consume `input` and open it as a zip archive
    ///
    /// # Errors
    /// Returns `ArchiveError::Format` for anything that is not a zip archive and
    /// `ArchiveError::Io` if reading the stream is interrupted
    pub fn new<R: Read>(mut input: R) -> Result<Self, ArchiveError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive, next: 0 })
    }

    /// Number of entries, directories included
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the archive has no entries at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Advance to the next entry, or `None` once the archive is exhausted
    ///
    /// # Errors
    /// Returns an error if the entry header cannot be decoded
    pub fn next_entry(&mut self) -> Result<Option<ArchiveEntry<'_>>, ArchiveError> {
        if self.next >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next;
        self.next += 1;
        let file = self.archive.by_index(index)?;
        Ok(Some(ArchiveEntry { file }))
    }
}

/// One entry of a package archive; reading it yields the decompressed content
pub struct ArchiveEntry<'a> {
    file: ZipFile<'a>,
}

impl ArchiveEntry<'_> {
    /// Path of the entry as stored in the archive
    #[must_use]
    pub fn name(&self) -> &str {
        self.file.name()
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.file.is_dir()
    }

    /// Materialize the whole entry content
    ///
    /// # Errors
    /// Returns an error if decompression fails or the data is corrupt
    pub fn read_content(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let mut content = Vec::new();
        self.file.read_to_end(&mut content).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                ArchiveError::Format(format!("corrupt entry {}: {e}", self.file.name()))
            } else {
                ArchiveError::Io(e)
            }
        })?;
        Ok(content)
    }
}

impl Read for ArchiveEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Pack every file under `source_dir` into a zip archive at `output_path`.
///
/// Entry names are relative to `source_dir` with `/` separators, which is the
/// layout the upload job expects relative to the install root.
///
/// # Errors
/// Returns an error if archive creation fails
pub fn create_archive(source_dir: &Path, output_path: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut written = 0;

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path == output_path {
            continue;
        }

        let relative_path = path
            .strip_prefix(source_dir)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let name = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options)?;
        let mut f = File::open(path)?;
        io::copy(&mut f, &mut zip)?;
        written += 1;
    }

    zip.finish()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, FileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, FileOptions::default()).unwrap();
                zip.write_all(content).unwrap();
            }
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_entries_come_back_in_storage_order() {
        let bytes = zip_bytes(&[("b.txt", b"bee"), ("lib/", b""), ("lib/a.jar", b"jar")]);
        let mut reader = ArchiveReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.len(), 3);

        let mut seen = Vec::new();
        while let Some(mut entry) = reader.next_entry().unwrap() {
            let content = if entry.is_dir() {
                Vec::new()
            } else {
                entry.read_content().unwrap()
            };
            seen.push((entry.name().to_string(), entry.is_dir(), content));
        }

        assert_eq!(
            seen,
            vec![
                ("b.txt".to_string(), false, b"bee".to_vec()),
                ("lib/".to_string(), true, Vec::new()),
                ("lib/a.jar".to_string(), false, b"jar".to_vec()),
            ]
        );
    }

    #[test]
    fn test_garbage_is_a_format_error() {
        let result = ArchiveReader::new(&b"definitely not a zip archive"[..]);
        assert!(matches!(result, Err(ArchiveError::Format(_))));
    }

    #[test]
    fn test_empty_stream_is_a_format_error() {
        let result = ArchiveReader::new(io::empty());
        assert!(matches!(result, Err(ArchiveError::Format(_))));
    }

    #[test]
    fn test_create_archive_round_trips_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let source = temp.path().join("package");
        std::fs::create_dir_all(source.join("WEB-INF/lib")).unwrap();
        std::fs::write(source.join("README.txt"), "readme").unwrap();
        std::fs::write(source.join("WEB-INF/lib/ant-1.10.jar"), "ant").unwrap();

        let output = temp.path().join("package.zip");
        assert_eq!(create_archive(&source, &output).unwrap(), 2);

        let mut reader = ArchiveReader::new(File::open(&output).unwrap()).unwrap();
        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().unwrap() {
            names.push(entry.name().to_string());
        }
        assert_eq!(names, vec!["README.txt", "WEB-INF/lib/ant-1.10.jar"]);
    }
}
