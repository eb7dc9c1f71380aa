//! Shared plumbing for Office Open XML documents
//!
//! `.docx` and `.xlsx` files are zip containers of XML parts. The legacy
//! binary formats (`.doc`, `.xls`) are recognized by extension but cannot be
//! read; they surface as [`FinderError::UnsupportedFileType`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::{FinderError, Result};

/// Run-level handle held by an office extractor
///
/// Owns the buffer every XML part is read into, so one allocation is reused
/// for the whole run. Dropped when the extractor is released.
#[derive(Debug)]
pub struct OfficeSession {
    kind: &'static str,
    buffer: String,
    documents_opened: usize,
}

impl OfficeSession {
    pub fn open(kind: &'static str) -> Self {
        tracing::debug!("Opening {} session", kind);
        Self {
            kind,
            buffer: String::new(),
            documents_opened: 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of documents opened through this session
    pub fn documents_opened(&self) -> usize {
        self.documents_opened
    }

    /// Open a document container
    ///
    /// A file that is not a zip container but carries one of the `legacy`
    /// extensions is reported as unsupported rather than corrupt.
    pub(crate) fn open_document(
        &mut self,
        path: &Path,
        legacy: &[&str],
    ) -> Result<ZipArchive<File>> {
        let file = File::open(path)?;
        match ZipArchive::new(file) {
            Ok(archive) => {
                self.documents_opened += 1;
                Ok(archive)
            }
            Err(_) if has_extension(path, legacy) => Err(FinderError::UnsupportedFileType(format!(
                "{} (legacy binary {} format)",
                path.display(),
                self.kind
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Read one XML part into the session buffer
    pub(crate) fn read_part(&mut self, archive: &mut ZipArchive<File>, name: &str) -> Result<&str> {
        self.buffer.clear();
        let mut entry = archive.by_name(name)?;
        entry.read_to_string(&mut self.buffer)?;
        Ok(&self.buffer)
    }
}

/// Names of every part in the container
pub(crate) fn part_names(archive: &ZipArchive<File>) -> Vec<String> {
    archive.file_names().map(str::to_owned).collect()
}

/// Parts named `<prefix><N>.xml`, ordered by N
pub(crate) fn numbered_parts(names: &[String], prefix: &str) -> Vec<String> {
    let mut parts: Vec<(u32, &String)> = names
        .iter()
        .filter_map(|name| {
            let number = name.strip_prefix(prefix)?.strip_suffix(".xml")?;
            Some((number.parse().unwrap_or(u32::MAX), name))
        })
        .collect();
    parts.sort();
    parts.into_iter().map(|(_, name)| name.clone()).collect()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
