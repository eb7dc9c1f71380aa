//! Search phase: run each bucket's extractor over its files and copy matches

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::pattern::SearchPattern;
use crate::progress::ProgressTracker;
use crate::registry::StrategyRegistry;
use crate::report::RunReport;
use crate::scanner::SearchBuckets;
use crate::{FinderError, Result};

/// What happened when a matched file was copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied(PathBuf),
    /// A file with the same name was already in the output directory
    AlreadyExists(PathBuf),
}

/// Copy `source` into `output_root`, keeping its base name
///
/// Creates `output_root` if needed. An existing file of the same name is left
/// untouched; the check and the create are a single `create_new` open.
pub fn copy_to_output(source: &Path, output_root: &Path) -> Result<CopyOutcome> {
    let file_name = source.file_name().ok_or_else(|| {
        FinderError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        ))
    })?;

    let source_file = File::open(source)?;
    fs::create_dir_all(output_root)?;
    let destination = output_root.join(file_name);

    let target = match OpenOptions::new().write(true).create_new(true).open(&destination) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::warn!("File {:?} already exists. Not copying", destination);
            return Ok(CopyOutcome::AlreadyExists(destination));
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(source_file);
    let mut writer = BufWriter::new(target);
    let copied = io::copy(&mut reader, &mut writer).and_then(|_| writer.flush());
    if let Err(e) = copied {
        // don't leave a truncated copy behind
        drop(writer);
        let _ = fs::remove_file(&destination);
        return Err(e.into());
    }

    tracing::info!("File {:?} copied to directory {:?}", source, output_root);
    Ok(CopyOutcome::Copied(destination))
}

/// Runs the search phase over a set of buckets
pub struct SearchRunner<'a> {
    pattern: &'a SearchPattern,
    output_root: &'a Path,
    cancel: &'a CancellationToken,
}

impl<'a> SearchRunner<'a> {
    pub fn new(pattern: &'a SearchPattern, output_root: &'a Path, cancel: &'a CancellationToken) -> Self {
        Self {
            pattern,
            output_root,
            cancel,
        }
    }

    /// Search every bucketed file, in bucket order, one file at a time
    ///
    /// Search and copy failures are logged and counted in `report`; only
    /// cancellation ends the phase early.
    pub fn run(
        &self,
        buckets: &SearchBuckets,
        registry: &mut StrategyRegistry,
        progress: &mut ProgressTracker<'_>,
        report: &mut RunReport,
    ) -> Result<()> {
        let reporter = progress.reporter();

        for bucket in buckets {
            let name = registry.name(bucket.extractor).to_string();
            let Some(extractor) = registry.extractor_mut(bucket.extractor) else {
                tracing::error!("Bucket refers to a missing extractor: {}", name);
                continue;
            };

            tracing::info!("Running extractor {} over {} files", name, bucket.files.len());

            for path in &bucket.files {
                if self.cancel.is_cancelled() {
                    return Err(FinderError::Cancelled);
                }

                tracing::debug!("Searching in file {:?}", path);
                report.files_searched += 1;

                let found = match extractor.search(path, self.pattern) {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::error!("Error searching {:?} with {}: {}", path, name, e);
                        report.search_failures += 1;
                        false
                    }
                };

                if found {
                    report.matches += 1;
                    reporter.on_match(path);

                    match copy_to_output(path, self.output_root) {
                        Ok(CopyOutcome::Copied(_)) => report.copied += 1,
                        Ok(CopyOutcome::AlreadyExists(destination)) => {
                            reporter.on_copy_skipped(&destination);
                            report.skipped_existing.push(destination);
                        }
                        Err(e) => {
                            tracing::error!(
                                "Error copying file {:?} to directory {:?}. Please copy manually: {}",
                                path,
                                self.output_root,
                                e
                            );
                            report.copy_failures += 1;
                        }
                    }
                }

                progress.advance();
            }
        }

        Ok(())
    }
}
