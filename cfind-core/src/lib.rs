//! cfind - Content Finder
//!
//! Scans a directory tree, routes each file to a content extractor chosen by
//! its extension, searches the content for a literal term or a regular
//! expression, and copies matching files into an output directory.
//!
//! ```no_run
//! use cfind_core::{run_search, CancellationToken, SearchConfig, SilentReporter};
//!
//! let search = SearchConfig::new()
//!     .with_root("/data/reports")
//!     .with_output("/tmp/found")
//!     .with_term("invoice")
//!     .compile()?;
//! let report = run_search(&search, &SilentReporter, &CancellationToken::new());
//! println!("{} files copied", report.copied);
//! # Ok::<(), cfind_core::ValidationError>(())
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod pattern;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod report;
pub mod runner;
pub mod scanner;

pub use config::{CompiledSearch, SearchConfig};
pub use error::{FinderError, Result, ValidationError};
pub use extractor::{ContentExtractor, ExtensionMatcher, PlainTextExtractor};
pub use pattern::{ExtensionFilter, SearchPattern};
pub use pipeline::{run_search, run_search_with};
pub use progress::{Phase, ProgressReporter, ProgressTracker, ProgressUpdate, SilentReporter};
pub use registry::{ExtractorId, StrategyRegistry};
pub use report::{BucketSummary, RunReport, RunStatus};
pub use runner::{copy_to_output, CopyOutcome, SearchRunner};
pub use scanner::{DirectoryScanner, ScanOutcome, SearchBuckets, SkippedEntry};

#[cfg(feature = "office")]
pub use extractor::{OfficeSession, SpreadsheetExtractor, WordDocumentExtractor};

/// Re-exported so callers can build cancellation tokens without a direct dependency
pub use tokio_util::sync::CancellationToken;

/// cfind version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension filter that accepts every file
pub const DEFAULT_EXTENSION_FILTER: &str = ".*";
