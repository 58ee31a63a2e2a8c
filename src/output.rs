//! Result types returned by the workflow commands.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// What happened to one manifest record during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// Output was (re)generated.
    Processed,
    /// Nothing to do: content already clean.
    Unchanged,
    /// Post rebuilt from an existing text cache without downloading again.
    Reused,
    /// Filtered out by `--types`.
    SkippedType,
    /// Over the `--max-pages` limit.
    SkippedPages { pages: usize },
    /// Not eligible (no PDF URL, no page, body too short …).
    Skipped { reason: String },
    /// Failed; see the attached error.
    Failed,
}

/// Per-record outcome, kept so callers can build a post-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub title: String,
    pub status: DocumentStatus,
    pub error: Option<DocumentError>,
}

impl DocumentOutcome {
    pub fn new(title: impl Into<String>, status: DocumentStatus) -> Self {
        Self {
            title: title.into(),
            status,
            error: None,
        }
    }

    pub fn failed(title: impl Into<String>, error: DocumentError) -> Self {
        Self {
            title: title.into(),
            status: DocumentStatus::Failed,
            error: Some(error),
        }
    }
}

/// Aggregate counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Records the command looked at.
    pub total: usize,
    pub processed: usize,
    pub unchanged: usize,
    pub skipped_existing: usize,
    pub skipped_type: usize,
    pub skipped_pages: usize,
    pub skipped_other: usize,
    pub failed: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl RunStats {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        match outcome.status {
            DocumentStatus::Processed => self.processed += 1,
            DocumentStatus::Unchanged => self.unchanged += 1,
            DocumentStatus::Reused => self.skipped_existing += 1,
            DocumentStatus::SkippedType => self.skipped_type += 1,
            DocumentStatus::SkippedPages { .. } => self.skipped_pages += 1,
            DocumentStatus::Skipped { .. } => self.skipped_other += 1,
            DocumentStatus::Failed => self.failed += 1,
        }
    }
}

/// Full report of a run: counters plus the per-record outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub stats: RunStats,
    pub documents: Vec<DocumentOutcome>,
}

impl RunReport {
    pub(crate) fn push(&mut self, outcome: DocumentOutcome) {
        self.stats.record(&outcome);
        self.documents.push(outcome);
    }

    /// Errors of every failed record, in manifest order.
    pub fn errors(&self) -> impl Iterator<Item = &DocumentError> {
        self.documents.iter().filter_map(|d| d.error.as_ref())
    }
}
