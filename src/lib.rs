//! # corpus-press
//!
//! Turn a manifest of scanned PDF documents into a searchable static site.
//!
//! Scanned speeches and memos come out of a flatbed as image-only PDFs. This
//! crate downloads them, reads the text back (with a local Tesseract engine or
//! a hosted multimodal LLM), scrubs the OCR debris, and writes one HTML page
//! per document plus an index page with client-side fuzzy search. The JSON
//! manifest that describes the archive is kept in sync along the way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! manifest.json
//!  │
//!  ├─ 1. Input    download the PDF from public storage, verify %PDF
//!  ├─ 2. Render   rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. OCR      tesseract on preprocessed pages │ page chunks → multimodal LLM
//!  ├─ 4. Cleanup  page numbers, banners, ALL CAPS, stray markdown
//!  ├─ 5. Site     posts/<slug>.html + blog.html
//!  └─ 6. Manifest blog_page / gemini / themes written back atomically
//! ```
//!
//! ## Commands
//!
//! Each step of the site's life is one function in [`workflow`]:
//!
//! | Function | CLI | What it does |
//! |----------|-----|--------------|
//! | [`run_ocr_pipeline`] | `ocr` | download, OCR and publish every record |
//! | [`run_hosted_extraction`] | `extract` | re-extract selected posts with the LLM |
//! | [`generate_pages`] | `generate` | placeholder posts and the index |
//! | [`clean_posts`] | `clean-posts` | title case and body cleanup in place |
//! | [`clean_summaries`] | `clean-summaries` | strip markdown from summaries |
//! | [`polish_posts`] | `polish` | LLM cleanup of extracted bodies |
//! | [`apply_themes`] | `themes` | theme tags and the themed index |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use corpus_press::{run_ocr_pipeline, OcrBackend, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .root("/srv/rickover")
//!         .max_pages(60)
//!         .types(["Speech"])
//!         .build()?;
//!     let report = run_ocr_pipeline(&config, OcrBackend::Local).await?;
//!     eprintln!(
//!         "{} processed, {} failed",
//!         report.stats.processed, report.stats.failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `corpus-press` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime requirements
//!
//! * a pdfium shared library (`PDFIUM_LIB_PATH`, the working directory, or
//!   system-wide) for page counts and rasterisation;
//! * `tesseract` on `PATH` for the local backend;
//! * an API key (`GEMINI_API_KEY` or any provider edgequake-llm detects) for
//!   `extract` and `polish`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cleanup;
pub mod config;
pub mod error;
pub mod manifest;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod site;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, RecordSelection, RetryPolicy, Workspace};
pub use error::{CorpusError, DocumentError};
pub use manifest::{Manifest, ManifestEntry};
pub use ocr::OcrBackend;
pub use output::{DocumentOutcome, DocumentStatus, RunReport, RunStats};
pub use progress::{NoopProgress, PipelineProgress, ProgressCallback};
pub use site::SiteConfig;
pub use workflow::{
    apply_themes, clean_posts, clean_summaries, generate_pages, polish_posts,
    run_hosted_extraction, run_ocr_pipeline,
};
