//! Progress accounting and reporting
//!
//! A run has two phases. The scan phase counts against the number of files
//! found by the upfront count; the search phase counts against the number of
//! files placed in buckets. Each phase starts at 0 and is non-decreasing.

use serde::Serialize;
use std::path::Path;

/// Pipeline phase a progress update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Classifying files into buckets
    Scan,
    /// Searching bucketed files
    Search,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Scan => "scan",
            Phase::Search => "search",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One progress sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub phase: Phase,
    pub processed: usize,
    pub total: usize,
    /// Always within `[0, 100]`
    pub percentage: f64,
}

/// Receives run events.
///
/// The CLI forwards these over a channel; tests record them.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_phase_start(&self, _phase: Phase, _total: usize) {}
    fn on_progress(&self, _update: &ProgressUpdate) {}
    fn on_phase_complete(&self, _phase: Phase, _processed: usize) {}
    fn on_match(&self, _path: &Path) {}
    fn on_copy_skipped(&self, _destination: &Path) {}
    fn on_entry_error(&self, _path: Option<&Path>, _message: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// `processed / total * 100`, clamped to 100; 0 while `total` is 0
pub fn percentage(processed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (processed as f64 / total as f64 * 100.0).min(100.0)
}

/// Monotonic counter for one phase
pub struct ProgressTracker<'a> {
    phase: Phase,
    total: usize,
    processed: usize,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ProgressTracker<'a> {
    /// Start a phase and announce it to the reporter
    pub fn start(phase: Phase, total: usize, reporter: &'a dyn ProgressReporter) -> Self {
        reporter.on_phase_start(phase, total);
        Self {
            phase,
            total,
            processed: 0,
            reporter,
        }
    }

    /// Count one processed file and publish the new percentage
    pub fn advance(&mut self) -> ProgressUpdate {
        self.processed += 1;
        let update = self.snapshot();
        self.reporter.on_progress(&update);
        update
    }

    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            phase: self.phase,
            processed: self.processed,
            total: self.total,
            percentage: percentage(self.processed, self.total),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn reporter(&self) -> &'a dyn ProgressReporter {
        self.reporter
    }

    /// End the phase
    pub fn finish(self) -> usize {
        self.reporter.on_phase_complete(self.phase, self.processed);
        self.processed
    }
}
