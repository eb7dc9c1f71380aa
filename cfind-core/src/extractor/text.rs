use std::path::Path;

use super::{ContentExtractor, ExtensionMatcher};
use crate::pattern::SearchPattern;
use crate::Result;

/// Reads the whole file as text. Handles any extension.
///
/// Invalid UTF-8 is replaced rather than rejected, so files in other
/// encodings can still match on their ASCII content.
#[derive(Debug)]
pub struct PlainTextExtractor {
    matcher: ExtensionMatcher,
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        tracing::debug!("Plain text extractor accepts every extension");
        Self {
            matcher: ExtensionMatcher::Any,
        }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "Plain Text"
    }

    fn matches_extension(&self, extension: &str) -> bool {
        self.matcher.matches(extension)
    }

    fn search(&mut self, path: &Path, pattern: &SearchPattern) -> Result<bool> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(pattern.is_match(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_search_literal_and_regex() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello world").unwrap();

        let mut extractor = PlainTextExtractor::new();
        assert!(extractor.search(&file, &SearchPattern::literal("HELLO")).unwrap());
        assert!(!extractor.search(&file, &SearchPattern::literal("goodbye")).unwrap());
        assert!(extractor.search(&file, &SearchPattern::regex("^h.*d$").unwrap()).unwrap());
    }

    #[test]
    fn test_search_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("latin1.txt");
        std::fs::write(&file, b"caf\xe9 needle \xff").unwrap();

        let mut extractor = PlainTextExtractor::new();
        assert!(extractor.search(&file, &SearchPattern::literal("needle")).unwrap());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let mut extractor = PlainTextExtractor::new();
        let result = extractor.search(&dir.path().join("gone.txt"), &SearchPattern::literal("x"));
        assert!(result.is_err());
    }

    #[test]
    fn test_release_is_noop() {
        let mut extractor = PlainTextExtractor::new();
        assert!(extractor.release().is_ok());
        assert!(extractor.release().is_ok());
    }
}
