use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pattern::{ExtensionFilter, SearchPattern};
use crate::{Result, DEFAULT_EXTENSION_FILTER};

/// Inputs of a search run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory to search (must exist)
    pub root: PathBuf,
    /// Directory matched files are copied into (created if absent)
    pub output: PathBuf,
    /// Literal text, or a regex source when `regex` is set
    pub term: String,
    /// Treat `term` as a regular expression
    pub regex: bool,
    /// Regular expression over bare extensions (no dot)
    pub extensions: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            output: PathBuf::new(),
            term: String::new(),
            regex: false,
            extensions: DEFAULT_EXTENSION_FILTER.to_string(),
        }
    }
}

/// A validated configuration, ready to run
#[derive(Debug, Clone)]
pub struct CompiledSearch {
    pub root: PathBuf,
    pub output: PathBuf,
    pub pattern: SearchPattern,
    pub filter: ExtensionFilter,
}

impl SearchConfig {
    /// Create a new SearchConfig with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&data)?;
        tracing::debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.extensions = extensions.into();
        self
    }

    /// Check every precondition without keeping the compiled result
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.compile().map(|_| ())
    }

    /// Validate and compile the matchers
    ///
    /// Checks run in a fixed order and the first failure is returned: missing
    /// root, output, term, extensions; then the root on disk; then the
    /// extension filter and (in regex mode) the search term.
    pub fn compile(&self) -> std::result::Result<CompiledSearch, ValidationError> {
        if is_blank(self.root.as_os_str().to_string_lossy().as_ref()) {
            return Err(ValidationError::MissingRoot);
        }
        if is_blank(self.output.as_os_str().to_string_lossy().as_ref()) {
            return Err(ValidationError::MissingOutput);
        }
        if is_blank(&self.term) {
            return Err(ValidationError::MissingTerm);
        }
        if is_blank(&self.extensions) {
            return Err(ValidationError::MissingExtensions);
        }
        if !self.root.exists() {
            return Err(ValidationError::RootNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ValidationError::RootNotDirectory(self.root.clone()));
        }

        let filter = ExtensionFilter::new(&self.extensions)?;
        let pattern = SearchPattern::new(&self.term, self.regex)?;

        Ok(CompiledSearch {
            root: self.root.clone(),
            output: self.output.clone(),
            pattern,
            filter,
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
