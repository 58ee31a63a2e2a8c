//! Configuration types for the corpus pipeline.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via
//! [`PipelineConfigBuilder`]. Every command reads the same struct so a run of
//! `ocr` followed by `clean-posts` sees one consistent set of paths, prompts
//! and retry settings.

use crate::error::CorpusError;
use crate::prompts::{CLEANUP_PROMPT, EXTRACTION_PROMPT};
use crate::progress::ProgressCallback;
use crate::site::SiteConfig;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Well-known locations inside a site checkout.
///
/// ```text
/// <root>/manifest.json
/// <root>/blog.html
/// <root>/posts/<slug>.html
/// <root>/ocr_output/<name>.txt   (and transient <name>.pdf)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub ocr_dir: PathBuf,
    pub posts_dir: PathBuf,
    pub index_path: PathBuf,
}

impl Workspace {
    /// Derive every path from the site root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            manifest_path: root.join("manifest.json"),
            ocr_dir: root.join("ocr_output"),
            posts_dir: root.join("posts"),
            index_path: root.join("blog.html"),
            root,
        }
    }

    /// Resolve a manifest-relative page path (`posts/x.html` or `/posts/x.html`).
    pub fn page_path(&self, blog_page: &str) -> PathBuf {
        self.root.join(blog_page.trim_start_matches('/'))
    }

    /// Make sure output directories exist.
    pub fn ensure_dirs(&self) -> Result<(), CorpusError> {
        for dir in [&self.ocr_dir, &self.posts_dir] {
            std::fs::create_dir_all(dir).map_err(|e| CorpusError::OutputWriteFailed {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Fixed-schedule retry around one rate-limited network call.
///
/// The wait before attempt `n + 1` is `base_delay × n` (30 s, 60 s, 90 s …).
/// Only rate-limit failures are retried; anything else surfaces at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Default: 5.
    pub max_attempts: u32,
    /// Base delay in milliseconds. Default: 30 000.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(attempt as u64))
    }
}

/// Which manifest records a command should touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSelection {
    /// Every eligible record (default).
    #[default]
    All,
    /// Positions within the eligible records (0-indexed, as given on the CLI).
    Indices(Vec<usize>),
}

impl RecordSelection {
    /// Apply the selection to `len` eligible records, returning their positions.
    ///
    /// Duplicates keep their first position. An index `>= len` is an error.
    pub fn apply(&self, len: usize) -> Result<Vec<usize>, CorpusError> {
        match self {
            RecordSelection::All => Ok((0..len).collect()),
            RecordSelection::Indices(wanted) => {
                let mut out = Vec::with_capacity(wanted.len());
                for &index in wanted {
                    if index >= len {
                        return Err(CorpusError::RecordOutOfRange { index, total: len });
                    }
                    if !out.contains(&index) {
                        out.push(index);
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Configuration shared by every pipeline command.
///
/// # Example
/// ```rust
/// use corpus_press::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .root("/srv/site")
///     .max_pages(40)
///     .types(["Speech", "Memo"])
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 10);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// File layout of the site checkout.
    pub workspace: Workspace,

    /// Skip PDFs with more pages than this (local OCR only). `None` = no limit.
    pub max_pages: Option<usize>,

    /// Only process these document types. Empty = all types.
    pub types: Vec<String>,

    /// Records to process for the per-record LLM commands.
    pub selection: RecordSelection,

    /// Rasterisation DPI for the local OCR engine. Default: 300.
    pub ocr_dpi: u32,

    /// Tesseract language code. Default: "eng".
    pub ocr_language: String,

    /// Tesseract executable. Default: "tesseract".
    pub tesseract_bin: PathBuf,

    /// Rasterisation DPI for hosted extraction. Default: 150.
    pub extract_dpi: u32,

    /// Longest rendered edge in pixels. Default: 2000 (hosted), ignored for OCR.
    pub max_rendered_pixels: u32,

    /// Maximum pages per hosted extraction request. Default: 10.
    pub chunk_size: usize,

    /// LLM model identifier. If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum output tokens per request. Default: 65 536.
    pub max_tokens: usize,

    /// Rate-limit retry schedule.
    pub retry: RetryPolicy,

    /// Pause between consecutive remote requests (chunks and documents). Default: 2 s.
    pub request_pause_ms: u64,

    /// Download timeout in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom extraction prompt (overrides [`EXTRACTION_PROMPT`]).
    pub extraction_prompt: Option<String>,

    /// Custom cleanup prompt (overrides [`CLEANUP_PROMPT`]).
    pub cleanup_prompt: Option<String>,

    /// Polished text shorter than this fraction of the input is rejected. Default: 0.5.
    pub min_cleanup_ratio: f64,

    /// Bodies shorter than this are not worth an LLM cleanup call. Default: 100.
    pub min_polish_chars: usize,

    /// Keep downloaded PDFs in `ocr_output/` after the OCR run. Default: false.
    pub keep_downloads: bool,

    /// Branding for generated pages.
    pub site: SiteConfig,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace: Workspace::default(),
            max_pages: None,
            types: Vec::new(),
            selection: RecordSelection::default(),
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            tesseract_bin: PathBuf::from("tesseract"),
            extract_dpi: 150,
            max_rendered_pixels: 2000,
            chunk_size: 10,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 65_536,
            retry: RetryPolicy::default(),
            request_pause_ms: 2_000,
            download_timeout_secs: 120,
            extraction_prompt: None,
            cleanup_prompt: None,
            min_cleanup_ratio: 0.5,
            min_polish_chars: 100,
            keep_downloads: false,
            site: SiteConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("workspace", &self.workspace)
            .field("max_pages", &self.max_pages)
            .field("types", &self.types)
            .field("selection", &self.selection)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("extract_dpi", &self.extract_dpi)
            .field("chunk_size", &self.chunk_size)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("request_pause_ms", &self.request_pause_ms)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether a record of this type passes the `--types` filter.
    pub fn accepts_type(&self, doc_type: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t == doc_type)
    }

    /// Pause inserted between remote requests.
    pub fn request_pause(&self) -> Duration {
        Duration::from_millis(self.request_pause_ms)
    }

    /// The extraction prompt in effect.
    pub fn extraction_prompt(&self) -> &str {
        self.extraction_prompt.as_deref().unwrap_or(EXTRACTION_PROMPT)
    }

    /// The cleanup prompt in effect.
    pub fn cleanup_prompt(&self) -> &str {
        self.cleanup_prompt.as_deref().unwrap_or(CLEANUP_PROMPT)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.workspace = Workspace::new(root.as_ref());
        self
    }

    pub fn workspace(mut self, workspace: Workspace) -> Self {
        self.config.workspace = workspace;
        self
    }

    /// `0` means no limit.
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = (n > 0).then_some(n);
        self
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn selection(mut self, selection: RecordSelection) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi.clamp(72, 600);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.config.tesseract_bin = bin.into();
        self
    }

    pub fn extract_dpi(mut self, dpi: u32) -> Self {
        self.config.extract_dpi = dpi.clamp(72, 400);
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunk_size = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn request_pause_ms(mut self, ms: u64) -> Self {
        self.config.request_pause_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Replace the extraction prompt sent with every page chunk.
    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
        self
    }

    /// Replace the cleanup prompt; the page body is appended to it as-is.
    pub fn cleanup_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.cleanup_prompt = Some(prompt.into());
        self
    }

    pub fn min_cleanup_ratio(mut self, ratio: f64) -> Self {
        self.config.min_cleanup_ratio = ratio;
        self
    }

    pub fn min_polish_chars(mut self, n: usize) -> Self {
        self.config.min_polish_chars = n;
        self
    }

    pub fn keep_downloads(mut self, v: bool) -> Self {
        self.config.keep_downloads = v;
        self
    }

    pub fn site(mut self, site: SiteConfig) -> Self {
        self.config.site = site;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, CorpusError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(CorpusError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.retry.max_attempts == 0 {
            return Err(CorpusError::InvalidConfig(
                "Retry attempts must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.min_cleanup_ratio) {
            return Err(CorpusError::InvalidConfig(format!(
                "Cleanup ratio must be within 0–1, got {}",
                c.min_cleanup_ratio
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_layout() {
        let ws = Workspace::new("/srv/site");
        assert_eq!(ws.manifest_path, PathBuf::from("/srv/site/manifest.json"));
        assert_eq!(ws.posts_dir, PathBuf::from("/srv/site/posts"));
        assert_eq!(ws.ocr_dir, PathBuf::from("/srv/site/ocr_output"));
        assert_eq!(ws.index_path, PathBuf::from("/srv/site/blog.html"));
        assert_eq!(
            ws.page_path("/posts/a.html"),
            PathBuf::from("/srv/site/posts/a.html")
        );
        assert_eq!(
            ws.page_path("posts/a.html"),
            PathBuf::from("/srv/site/posts/a.html")
        );
    }

    #[test]
    fn retry_delays_are_linear() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_after(1), Duration::from_secs(30));
        assert_eq!(p.delay_after(2), Duration::from_secs(60));
        assert_eq!(p.delay_after(4), Duration::from_secs(120));
    }

    #[test]
    fn selection_keeps_order_and_drops_duplicates() {
        assert_eq!(RecordSelection::All.apply(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(
            RecordSelection::Indices(vec![2, 0, 2, 0]).apply(4).unwrap(),
            vec![2, 0]
        );
        assert!(RecordSelection::Indices(vec![]).apply(4).unwrap().is_empty());
    }

    #[test]
    fn selection_rejects_index_past_the_end() {
        let err = RecordSelection::Indices(vec![0, 4, 9]).apply(4).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::RecordOutOfRange { index: 4, total: 4 }
        ));
        assert!(RecordSelection::All.apply(0).unwrap().is_empty());
    }

    #[test]
    fn prompts_default_to_the_built_in_text() {
        let c = PipelineConfig::default();
        assert_eq!(c.extraction_prompt(), EXTRACTION_PROMPT);
        assert_eq!(c.cleanup_prompt(), CLEANUP_PROMPT);

        let c = PipelineConfig::builder()
            .cleanup_prompt("Tidy this:\n\n")
            .build()
            .unwrap();
        assert_eq!(c.cleanup_prompt(), "Tidy this:\n\n");
        assert_eq!(c.extraction_prompt(), EXTRACTION_PROMPT);
    }

    #[test]
    fn max_pages_zero_means_unlimited() {
        let c = PipelineConfig::builder().max_pages(0).build().unwrap();
        assert_eq!(c.max_pages, None);
        let c = PipelineConfig::builder().max_pages(25).build().unwrap();
        assert_eq!(c.max_pages, Some(25));
    }

    #[test]
    fn type_filter() {
        let c = PipelineConfig::default();
        assert!(c.accepts_type("Speech"));
        let c = PipelineConfig::builder()
            .types(["Speech", "Memo"])
            .build()
            .unwrap();
        assert!(c.accepts_type("Memo"));
        assert!(!c.accepts_type("Testimony"));
    }

    #[test]
    fn build_rejects_zero_chunk() {
        let err = PipelineConfig::builder().chunk_size(0).build().unwrap_err();
        assert!(err.to_string().contains("Chunk size"));
    }

    #[test]
    fn build_rejects_bad_ratio() {
        assert!(PipelineConfig::builder()
            .min_cleanup_ratio(1.5)
            .build()
            .is_err());
    }
}
