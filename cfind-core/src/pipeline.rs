//! Top-level orchestration: count, scan, search, release

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::CompiledSearch;
use crate::progress::{Phase, ProgressReporter, ProgressTracker};
use crate::registry::StrategyRegistry;
use crate::report::{RunReport, RunStatus};
use crate::runner::SearchRunner;
use crate::scanner::{count_files, DirectoryScanner};
use crate::{FinderError, Result};

/// Run a search with the default extractors
pub fn run_search(
    search: &CompiledSearch,
    reporter: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> RunReport {
    run_search_with(search, StrategyRegistry::with_default_extractors(), reporter, cancel)
}

/// Run a search with a caller-supplied registry
///
/// Never returns an error: fatal failures, including panics inside an
/// extractor, end up in [`RunReport::status`]. The registry is released on
/// every path.
pub fn run_search_with(
    search: &CompiledSearch,
    registry: StrategyRegistry,
    reporter: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport::new();

    let span = tracing::info_span!("run", id = %report.run_id);
    let _guard = span.enter();
    tracing::info!("Starting run in {:?}", search.root);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        execute(search, registry, reporter, cancel, &mut report)
    }));

    report.status = match outcome {
        Ok(Ok(())) => RunStatus::Completed,
        Ok(Err(FinderError::Cancelled)) => {
            tracing::warn!("Run cancelled");
            RunStatus::Cancelled
        }
        Ok(Err(e)) => {
            tracing::error!("Error caught running main process: {}", e);
            RunStatus::Failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload);
            tracing::error!("Run aborted by panic: {}", message);
            RunStatus::Failed(message)
        }
    };
    report.elapsed_ms = started.elapsed().as_millis() as u64;

    tracing::info!(
        "Run finished: {} matches, {} copied in {} ms",
        report.matches,
        report.copied,
        report.elapsed_ms
    );
    report
}

fn execute(
    search: &CompiledSearch,
    mut registry: StrategyRegistry,
    reporter: &dyn ProgressReporter,
    cancel: &CancellationToken,
    report: &mut RunReport,
) -> Result<()> {
    report.total_files = count_files(&search.root)?;

    let mut progress = ProgressTracker::start(Phase::Scan, report.total_files, reporter);
    let scanned = DirectoryScanner::new(&search.filter, cancel).scan(
        &search.root,
        &mut registry,
        &mut progress,
    );
    progress.finish();
    let outcome = scanned?;

    report.record_scan(&outcome, &registry);
    tracing::info!("Finished separating files into buckets");
    for bucket in &report.buckets {
        tracing::info!("  {}: {} files", bucket.extractor, bucket.files);
    }

    let mut progress = ProgressTracker::start(Phase::Search, outcome.buckets.file_count(), reporter);
    let searched = SearchRunner::new(&search.pattern, &search.output, cancel).run(
        &outcome.buckets,
        &mut registry,
        &mut progress,
        report,
    );
    progress.finish();
    searched?;

    registry.release_all();
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
