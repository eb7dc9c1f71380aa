//! Content extractors
//!
//! One extractor per format family. Each declares which file extensions it
//! handles and tests a file's content against a [`SearchPattern`]. The
//! pipeline creates one instance of each kind per run and releases it once
//! when the run ends.

mod text;
#[cfg(feature = "office")]
mod office;
#[cfg(feature = "office")]
mod spreadsheet;
#[cfg(feature = "office")]
mod word;

pub use text::PlainTextExtractor;
#[cfg(feature = "office")]
pub use office::OfficeSession;
#[cfg(feature = "office")]
pub use spreadsheet::SpreadsheetExtractor;
#[cfg(feature = "office")]
pub use word::WordDocumentExtractor;

use std::path::Path;

use crate::pattern::SearchPattern;
use crate::Result;

/// A search strategy for one family of file formats
///
/// `search` is called for one file at a time; implementations may keep a
/// run-level session that is not safe for concurrent use.
pub trait ContentExtractor: Send {
    /// Display name used in logs and run reports
    fn name(&self) -> &str;

    /// Whether this extractor handles the (normalized) extension
    fn matches_extension(&self, extension: &str) -> bool;

    /// Test the file's content against `pattern`
    ///
    /// Errors are reported to the caller, which treats them as "not matched".
    fn search(&mut self, path: &Path, pattern: &SearchPattern) -> Result<bool>;

    /// Release run-level resources. Must be idempotent.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Which extensions an extractor accepts
#[derive(Debug, Clone, Copy)]
pub enum ExtensionMatcher {
    /// Catch-all
    Any,
    /// Exact, case-insensitive membership
    OneOf(&'static [&'static str]),
}

impl ExtensionMatcher {
    pub fn matches(&self, extension: &str) -> bool {
        match self {
            ExtensionMatcher::Any => true,
            ExtensionMatcher::OneOf(list) => list.iter().any(|e| e.eq_ignore_ascii_case(extension)),
        }
    }
}

/// Lower-case an extension and strip any leading dots
pub fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}

/// Extension of a path's file name without the dot; empty if there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The extractors registered for a normal run, in lookup priority order
pub fn default_extractors() -> Vec<Box<dyn ContentExtractor>> {
    let mut extractors: Vec<Box<dyn ContentExtractor>> = Vec::new();

    #[cfg(feature = "office")]
    {
        extractors.push(Box::new(WordDocumentExtractor::new()));
        extractors.push(Box::new(SpreadsheetExtractor::new()));
    }

    // catch-all goes last so it never shadows a specific format
    extractors.push(Box::new(PlainTextExtractor::new()));
    extractors
}
