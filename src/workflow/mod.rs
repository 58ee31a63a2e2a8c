//! The batch commands that glue the pipeline stages to the manifest.
//!
//! Every command follows the same shape: load the manifest, walk the records
//! (or the generated posts) one at a time, report each outcome through
//! `tracing` and the optional [`PipelineProgress`](crate::PipelineProgress)
//! callback, and return a [`RunReport`].
//!
//! | Command                  | Touches                          |
//! |--------------------------|----------------------------------|
//! | [`run_ocr_pipeline`]     | PDFs, text caches, posts, index, manifest |
//! | [`run_hosted_extraction`]| post bodies, manifest `gemini`   |
//! | [`generate_pages`]       | posts, index, manifest           |
//! | [`clean_posts`]          | post titles and bodies           |
//! | [`clean_summaries`]      | manifest summaries, post summaries |
//! | [`polish_posts`]         | post bodies                      |
//! | [`apply_themes`]         | manifest themes, post tags, index |

mod clean;
mod extraction;
mod generate;
mod ocr_run;
mod polish;
mod themes;

pub use clean::{clean_posts, clean_summaries};
pub use extraction::run_hosted_extraction;
pub use generate::generate_pages;
pub use ocr_run::run_ocr_pipeline;
pub use polish::polish_posts;
pub use themes::apply_themes;

use crate::config::PipelineConfig;
use crate::error::{CorpusError, DocumentError};
use crate::manifest::{write_atomic, ManifestEntry};
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::progress::Reporter;
use crate::site::{render_index, IndexStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Bookkeeping for one command invocation.
pub(crate) struct Run<'a> {
    command: &'static str,
    reporter: Reporter<'a>,
    report: RunReport,
    started: Instant,
}

impl<'a> Run<'a> {
    pub(crate) fn new(config: &'a PipelineConfig, command: &'static str, total: usize) -> Self {
        let mut report = RunReport::default();
        report.stats.total = total;
        Self {
            command,
            reporter: Reporter::new(config.progress_callback.as_ref(), command, total),
            report,
            started: Instant::now(),
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.report.stats.total
    }

    pub(crate) fn start(&self, index: usize, title: &str) {
        self.reporter.start(index, title);
    }

    pub(crate) fn step(&self, message: &str) {
        self.reporter.step(message);
    }

    /// Log and count one outcome.
    pub(crate) fn record(&mut self, index: usize, outcome: DocumentOutcome) {
        let total = self.total();
        let title = outcome.title.as_str();
        match &outcome.status {
            DocumentStatus::Processed | DocumentStatus::Unchanged | DocumentStatus::Reused => {
                self.reporter.complete(index, title);
            }
            DocumentStatus::SkippedType => {
                info!("[{}/{}] Skipping (type filter): {}", index, total, title);
                self.reporter.skipped(index, title, "type filter");
            }
            DocumentStatus::SkippedPages { pages } => {
                warn!("[{}/{}] Skipping ({} pages): {}", index, total, pages, title);
                self.reporter.skipped(index, title, &format!("{pages} pages"));
            }
            DocumentStatus::Skipped { reason } => {
                warn!("[{}/{}] Skipping ({}): {}", index, total, reason, title);
                self.reporter.skipped(index, title, reason);
            }
            DocumentStatus::Failed => {
                let message = outcome
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "failed".to_string());
                error!("[{}/{}] {}", index, total, message);
                self.reporter.error(index, title, &message);
            }
        }
        self.report.push(outcome);
    }

    pub(crate) fn finish(mut self) -> RunReport {
        self.report.stats.duration_ms = self.started.elapsed().as_millis() as u64;
        let stats = &self.report.stats;
        self.reporter.finish(stats.processed, stats.failed);
        info!(
            "{}: {} processed, {} unchanged, {} reused, {} skipped, {} failed in {}ms",
            self.command,
            stats.processed,
            stats.unchanged,
            stats.skipped_existing,
            stats.skipped_type + stats.skipped_pages + stats.skipped_other,
            stats.failed,
            stats.duration_ms
        );
        self.report
    }
}

/// Turn a library error into a per-document failure, or pass a fatal one up.
pub(crate) fn document_failure(title: &str, err: CorpusError) -> Result<DocumentOutcome, CorpusError> {
    if err.is_per_document() {
        Ok(DocumentOutcome::failed(title, DocumentError::extraction(title, &err)))
    } else {
        Err(err)
    }
}

pub(crate) fn read_page(path: &Path, label: &str) -> Result<String, DocumentError> {
    std::fs::read_to_string(path).map_err(|e| DocumentError::PageIo {
        page: label.to_string(),
        detail: format!("read failed: {e}"),
    })
}

pub(crate) fn write_page(path: &Path, label: &str, contents: &str) -> Result<(), DocumentError> {
    write_atomic(path, contents).map_err(|e| DocumentError::PageIo {
        page: label.to_string(),
        detail: e.to_string(),
    })
}

/// Every `*.html` file in the posts directory, sorted by name.
pub(crate) fn list_posts(posts_dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    if !posts_dir.is_dir() {
        return Ok(Vec::new());
    }
    let read_err = |e| CorpusError::ReadFailed {
        path: posts_dir.to_path_buf(),
        source: e,
    };
    let mut posts = Vec::new();
    for entry in std::fs::read_dir(posts_dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            posts.push(path);
        }
    }
    posts.sort();
    Ok(posts)
}

/// `posts/<file name>` for log lines and outcomes.
pub(crate) fn post_label(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("posts/{name}")
}

/// Delete a downloaded PDF. Returns `true` when a file was removed; a file
/// that is already gone is not an error.
pub(crate) fn discard_download(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

pub(crate) fn write_index(
    config: &PipelineConfig,
    entries: &[ManifestEntry],
    style: IndexStyle,
) -> Result<(), CorpusError> {
    let html = render_index(entries, style, &config.site);
    write_atomic(&config.workspace.index_path, &html)?;
    info!("Wrote {}", config.workspace.index_path.display());
    Ok(())
}
