//! Directory scanning and classification
//!
//! Walks the search root depth-first, listing the files of each directory
//! before descending into its subdirectories. Every non-hidden file counts as
//! visited; files whose extension passes the filter are placed in the bucket
//! of the extractor that handles them.

mod bucket;
mod walk;

pub use bucket::{Bucket, SearchBuckets};
pub use walk::{count_files, is_hidden, is_hidden_name};

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::extractor::extension_of;
use crate::pattern::ExtensionFilter;
use crate::progress::ProgressTracker;
use crate::registry::StrategyRegistry;
use crate::{FinderError, Result};

/// A directory entry that could not be read and was left out of the run
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Result of the classification pass
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub buckets: SearchBuckets,
    /// Non-hidden files seen
    pub visited: usize,
    /// Files rejected by the extension filter
    pub filtered_out: usize,
    /// Files accepted by the filter that no extractor handles
    pub unhandled: usize,
    pub skipped_entries: Vec<SkippedEntry>,
}

/// Classifies the files under a root into [`SearchBuckets`]
pub struct DirectoryScanner<'a> {
    filter: &'a ExtensionFilter,
    cancel: &'a CancellationToken,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(filter: &'a ExtensionFilter, cancel: &'a CancellationToken) -> Self {
        Self { filter, cancel }
    }

    /// Scan `root`, advancing `progress` once per visited file
    ///
    /// Unreadable entries below the root are logged and skipped. Only a root
    /// that cannot be read at all fails the scan.
    pub fn scan(
        &self,
        root: &Path,
        registry: &mut StrategyRegistry,
        progress: &mut ProgressTracker<'_>,
    ) -> Result<ScanOutcome> {
        tracing::info!("Scanning directory: {:?} (extensions: {})", root, self.filter.as_str());

        let mut outcome = ScanOutcome::default();

        for entry in walk::walker(root) {
            if self.cancel.is_cancelled() {
                return Err(FinderError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(walk::root_unreadable(root, &err)),
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf);
                    let reason = err.to_string();
                    tracing::warn!("Skipping unreadable entry: {}", reason);
                    progress.reporter().on_entry_error(path.as_deref(), &reason);
                    outcome.skipped_entries.push(SkippedEntry { path, reason });
                    continue;
                }
            };

            if !walk::is_visitable(&entry) {
                continue;
            }

            outcome.visited += 1;
            let extension = extension_of(entry.path());

            if !self.filter.matches(&extension) {
                outcome.filtered_out += 1;
            } else {
                match registry.resolve(&extension) {
                    Some(id) => {
                        tracing::debug!("Pairing file {:?} with {}", entry.path(), registry.name(id));
                        outcome.buckets.push(id, entry.into_path());
                    }
                    None => {
                        tracing::debug!("No extractor for {:?}, skipping", entry.path());
                        outcome.unhandled += 1;
                    }
                }
            }

            progress.advance();
        }

        tracing::info!(
            "Visited {} files, {} placed in {} buckets",
            outcome.visited,
            outcome.buckets.file_count(),
            outcome.buckets.len()
        );

        Ok(outcome)
    }
}
