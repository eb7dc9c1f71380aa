//! Search term and extension filter matching
//!
//! Both matchers are case-insensitive. A regex is tested with an unanchored
//! `is_match`, so `txt` as an extension filter also accepts `txtx`; anchor the
//! pattern (`^txt$`) for an exact extension.

use regex::{Regex, RegexBuilder};

use crate::error::ValidationError;

/// Compiled search term
#[derive(Debug, Clone)]
pub enum SearchPattern {
    /// Case-insensitive substring test; the needle is stored lower-cased
    Literal { needle: String },
    /// Case-insensitive regular expression, matched anywhere in the content
    Regex(Regex),
}

impl SearchPattern {
    /// Build a literal pattern
    pub fn literal(term: &str) -> Self {
        SearchPattern::Literal {
            needle: term.to_lowercase(),
        }
    }

    /// Build a regex pattern
    pub fn regex(term: &str) -> Result<Self, ValidationError> {
        RegexBuilder::new(term)
            .case_insensitive(true)
            .build()
            .map(SearchPattern::Regex)
            .map_err(|e| ValidationError::InvalidSearchRegex(e.to_string()))
    }

    /// Build a pattern for the given mode
    pub fn new(term: &str, regex_mode: bool) -> Result<Self, ValidationError> {
        if regex_mode {
            Self::regex(term)
        } else {
            Ok(Self::literal(term))
        }
    }

    /// Test extracted content against the pattern
    ///
    /// In regex mode `$` also matches just before a single trailing line
    /// break, so a file ending in a newline matches like one that does not.
    pub fn is_match(&self, content: &str) -> bool {
        match self {
            SearchPattern::Literal { needle } => content.to_lowercase().contains(needle.as_str()),
            SearchPattern::Regex(re) => {
                re.is_match(content)
                    || strip_line_break(content).is_some_and(|body| re.is_match(body))
            }
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, SearchPattern::Regex(_))
    }
}

fn strip_line_break(content: &str) -> Option<&str> {
    content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
}

/// User-supplied regular expression over bare file extensions
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    regex: Regex,
}

impl ExtensionFilter {
    pub fn new(pattern: &str) -> Result<Self, ValidationError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ValidationError::InvalidExtensionFilter(e.to_string()))?;
        Ok(Self { regex })
    }

    /// Test a bare extension (no leading dot)
    pub fn matches(&self, extension: &str) -> bool {
        self.regex.is_match(extension)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
