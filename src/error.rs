//! Error types for the corpus-press library.
//!
//! Two error types for two failure modes:
//!
//! * [`CorpusError`] — **Fatal**: the run cannot proceed at all (manifest
//!   unreadable, provider not configured, pdfium missing). Returned as
//!   `Err(CorpusError)` from the workflow entry points.
//!
//! * [`DocumentError`] — **Non-fatal**: one document failed (download glitch,
//!   OCR crash, rate limit that never cleared) but the rest of the manifest is
//!   fine. Stored inside [`crate::output::DocumentOutcome`] so a batch run
//!   over hundreds of records is not lost to one bad scan.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the corpus-press library.
#[derive(Debug, Error)]
pub enum CorpusError {
    // ── Manifest errors ───────────────────────────────────────────────────
    /// The manifest file does not exist.
    #[error("Manifest not found: '{path}'\nRun from the site root or pass --root.")]
    ManifestNotFound { path: PathBuf },

    /// The manifest exists but is not a JSON array of records.
    #[error("Manifest '{path}' is not valid: {source}")]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Record index given on the command line is past the end of the selection.
    #[error("Record {index} is out of range ({total} records selected)")]
    RecordOutOfRange { index: usize, total: usize },

    // ── Input errors ──────────────────────────────────────────────────────
    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The downloaded file is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/dir/containing/libpdfium.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The local OCR engine could not be started or exited non-zero.
    #[error("OCR engine failed on page {page}: {detail}")]
    OcrEngineFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned a non-retryable error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Rate limiting did not clear within the retry budget.
    #[error("Rate limit persisted after {attempts} attempts: {detail}")]
    RateLimitExceeded { attempts: u32, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read a file the run depends on.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CorpusError {
    /// Whether the failure is confined to one document, so a batch run can
    /// record it and move on to the next record.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            CorpusError::DownloadFailed { .. }
                | CorpusError::DownloadTimeout { .. }
                | CorpusError::NotAPdf { .. }
                | CorpusError::CorruptPdf { .. }
                | CorpusError::RasterisationFailed { .. }
                | CorpusError::OcrEngineFailed { .. }
                | CorpusError::LlmApiError { .. }
                | CorpusError::RateLimitExceeded { .. }
        )
    }
}

/// A non-fatal error for a single manifest record.
///
/// Stored in [`crate::output::DocumentOutcome`]. The run continues with the
/// next record.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The PDF could not be fetched.
    #[error("'{title}': download failed: {detail}")]
    DownloadFailed { title: String, detail: String },

    /// Local OCR or hosted extraction failed.
    #[error("'{title}': text extraction failed: {detail}")]
    ExtractionFailed { title: String, detail: String },

    /// LLM cleanup returned something unusable.
    #[error("'{title}': cleanup rejected: {detail}")]
    CleanupRejected { title: String, detail: String },

    /// The generated page exists but has no text body anchor.
    #[error("'{page}': no ocr-text block found")]
    MissingBody { page: String },

    /// The generated page could not be read or written.
    #[error("'{page}': {detail}")]
    PageIo { page: String, detail: String },
}

impl DocumentError {
    /// Wrap a fatal library error as a per-document extraction failure.
    pub fn extraction(title: &str, err: &CorpusError) -> Self {
        DocumentError::ExtractionFailed {
            title: title.to_string(),
            detail: err.to_string(),
        }
    }
}
