//! Run summary

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::registry::StrategyRegistry;
use crate::scanner::{ScanOutcome, SkippedEntry};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
    /// A fatal error stopped the run; extractors were still released
    Failed(String),
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// File count of one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub extractor: String,
    pub files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `Completed` until the pipeline records otherwise
    pub status: RunStatus,
    /// Upfront count of files under the root
    pub total_files: usize,
    pub files_visited: usize,
    pub filtered_out: usize,
    pub unhandled: usize,
    pub files_bucketed: usize,
    pub buckets: Vec<BucketSummary>,
    pub files_searched: usize,
    pub matches: usize,
    pub copied: usize,
    /// Output paths that already existed and were left alone
    pub skipped_existing: Vec<PathBuf>,
    pub search_failures: usize,
    pub copy_failures: usize,
    pub skipped_entries: Vec<SkippedEntry>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            status: RunStatus::Completed,
            total_files: 0,
            files_visited: 0,
            filtered_out: 0,
            unhandled: 0,
            files_bucketed: 0,
            buckets: Vec::new(),
            files_searched: 0,
            matches: 0,
            copied: 0,
            skipped_existing: Vec::new(),
            search_failures: 0,
            copy_failures: 0,
            skipped_entries: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Record the classification pass
    pub fn record_scan(&mut self, outcome: &ScanOutcome, registry: &StrategyRegistry) {
        self.files_visited = outcome.visited;
        self.filtered_out = outcome.filtered_out;
        self.unhandled = outcome.unhandled;
        self.files_bucketed = outcome.buckets.file_count();
        self.skipped_entries = outcome.skipped_entries.clone();
        self.buckets = outcome
            .buckets
            .iter()
            .map(|b| BucketSummary {
                extractor: registry.name(b.extractor).to_string(),
                files: b.files.len(),
            })
            .collect();
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
