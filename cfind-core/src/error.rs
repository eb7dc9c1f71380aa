//! Error types for cfind operations

use std::path::PathBuf;
use thiserror::Error;

/// cfind Error types
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "office")]
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[cfg(feature = "office")]
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Cannot read root directory {path}: {message}")]
    RootUnreadable { path: PathBuf, message: String },

    #[error("Run cancelled")]
    Cancelled,
}

/// Rejections raised before a run starts
///
/// Checked in declaration order; the first failing check wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter input directory")]
    MissingRoot,

    #[error("please enter output directory")]
    MissingOutput,

    #[error("please enter search term")]
    MissingTerm,

    #[error("please enter file extensions, as a regular expression")]
    MissingExtensions,

    #[error("input directory doesn't exist: {0}")]
    RootNotFound(PathBuf),

    #[error("input path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("invalid file extension pattern: {0}")]
    InvalidExtensionFilter(String),

    #[error("invalid search regex: {0}")]
    InvalidSearchRegex(String),
}

/// Result type for cfind operations
pub type Result<T> = std::result::Result<T, FinderError>;

impl From<serde_json::Error> for FinderError {
    fn from(e: serde_json::Error) -> Self {
        FinderError::Config(e.to_string())
    }
}
