//! CLI binary for corpus-press.
//!
//! A thin shim over the library crate: one subcommand per workflow command,
//! flags mapped onto `PipelineConfig`, a progress bar, and a run summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corpus_press::{
    apply_themes, clean_posts, clean_summaries, generate_pages, polish_posts,
    run_hosted_extraction, run_ocr_pipeline, OcrBackend, PipelineConfig, PipelineProgress,
    ProgressCallback, RecordSelection, RetryPolicy, RunReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar per run, one log line per record.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Loading");
        bar.set_message("manifest…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn short(text: &str, max: usize) -> String {
        if text.chars().count() > max {
            let cut: String = text.chars().take(max - 1).collect();
            format!("{cut}\u{2026}")
        } else {
            text.to_string()
        }
    }
}

impl PipelineProgress for CliProgress {
    fn on_run_start(&self, command: &str, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} records  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(command.to_string());
        self.bar.set_message("");
        self.bar.reset_eta();
    }

    fn on_document_start(&self, _index: usize, _total: usize, title: &str) {
        self.bar.set_message(Self::short(title, 40));
    }

    fn on_document_complete(&self, index: usize, total: usize, title: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            Self::short(title, 70)
        ));
        self.bar.inc(1);
    }

    fn on_document_skipped(&self, index: usize, total: usize, title: &str, reason: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            dim("–"),
            index,
            total,
            dim(&Self::short(title, 60)),
            dim(&format!("({reason})"))
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, title: &str, error: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            Self::short(title, 40),
            red(&Self::short(error, 80))
        ));
        self.bar.inc(1);
    }

    fn on_step(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn on_run_complete(&self, _processed: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Local OCR of every speech under 60 pages
  corpus-press ocr --types Speech --max-pages 60

  # Placeholder pages for the whole manifest
  corpus-press generate

  # Re-extract records 0, 4 and 7 with the hosted model
  corpus-press extract 0 4 7

  # LLM cleanup of every hosted-extraction page
  corpus-press polish

  # Deterministic cleanup, then themes
  corpus-press clean-posts && corpus-press clean-summaries && corpus-press themes

SITE LAYOUT (relative to --root):
  manifest.json        document records
  ocr_output/          downloaded PDFs (removed after ocr) and text caches
  posts/<slug>.html    one page per document
  blog.html            searchable index

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (also read from <root>/.env)
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium
  RUST_LOG                Log filter, overrides --verbose
"#;

/// Build and maintain a static site from a manifest of scanned PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "corpus-press",
    version,
    about = "Build and maintain a static site from a manifest of scanned PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Site root containing manifest.json.
    #[arg(long, global = true, env = "CORPUS_ROOT", default_value = ".")]
    root: PathBuf,

    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Pause between remote requests, in milliseconds.
    #[arg(long, global = true, env = "CORPUS_PAUSE_MS", default_value_t = 2000)]
    pause_ms: u64,

    /// Attempts per request when the provider rate-limits.
    #[arg(long, global = true, env = "CORPUS_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Base back-off after a rate limit, in seconds (grows linearly).
    #[arg(long, global = true, env = "CORPUS_RETRY_BASE_SECS", default_value_t = 30)]
    retry_base_secs: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "CORPUS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "CORPUS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CORPUS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CORPUS_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download, OCR and publish every record.
    Ocr {
        /// OCR engine: local (tesseract) or hosted (LLM).
        #[arg(long, env = "CORPUS_BACKEND", default_value = "local")]
        backend: OcrBackend,

        /// Skip PDFs with more pages than this (0 = no limit).
        #[arg(long, env = "CORPUS_MAX_PAGES", default_value_t = 0)]
        max_pages: usize,

        /// Only process these document types (comma separated).
        #[arg(long, env = "CORPUS_TYPES", value_delimiter = ',')]
        types: Vec<String>,

        /// Rasterisation DPI for tesseract.
        #[arg(long, env = "CORPUS_OCR_DPI", default_value_t = 300)]
        dpi: u32,

        /// Tesseract language code.
        #[arg(long, env = "CORPUS_OCR_LANG", default_value = "eng")]
        lang: String,

        /// Tesseract executable.
        #[arg(long, env = "CORPUS_TESSERACT", default_value = "tesseract")]
        tesseract: PathBuf,

        /// Keep downloaded PDFs in ocr_output/.
        #[arg(long, env = "CORPUS_KEEP_DOWNLOADS")]
        keep_downloads: bool,
    },

    /// Re-extract post bodies with the hosted model.
    Extract {
        /// Positions among records with a PDF and a page (default: all).
        indices: Vec<usize>,

        /// Rendering DPI for the page images.
        #[arg(long, env = "CORPUS_EXTRACT_DPI", default_value_t = 150)]
        dpi: u32,

        /// Pages per request.
        #[arg(long, env = "CORPUS_CHUNK_SIZE", default_value_t = 10)]
        chunk_size: usize,
    },

    /// Write placeholder posts for every record and the index page.
    Generate,

    /// Title-case ALL CAPS titles and scrub OCR bodies in place.
    CleanPosts,

    /// Strip markdown from summaries in the manifest and the posts.
    CleanSummaries,

    /// LLM cleanup of hosted-extraction bodies.
    Polish {
        /// Positions among hosted-extraction records (default: all).
        indices: Vec<usize>,
    },

    /// Assign themes to hosted-extraction records and rebuild the index.
    Themes,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Ocr { .. } => "ocr",
            Command::Extract { .. } => "extract",
            Command::Generate => "generate",
            Command::CleanPosts => "clean-posts",
            Command::CleanSummaries => "clean-summaries",
            Command::Polish { .. } => "polish",
            Command::Themes => "themes",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the working directory may set CORPUS_ROOT itself.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    dotenvy::from_path(cli.root.join(".env")).ok();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new() as Arc<dyn PipelineProgress>)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;
    let command = cli.command.name();

    let report = match &cli.command {
        Command::Ocr { backend, .. } => run_ocr_pipeline(&config, *backend).await,
        Command::Extract { .. } => run_hosted_extraction(&config).await,
        Command::Generate => generate_pages(&config),
        Command::CleanPosts => clean_posts(&config),
        Command::CleanSummaries => clean_summaries(&config),
        Command::Polish { .. } => polish_posts(&config).await,
        Command::Themes => apply_themes(&config),
    }
    .with_context(|| format!("{command} failed"))?;

    if !cli.quiet {
        print_summary(command, &report);
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .root(&cli.root)
        .request_pause_ms(cli.pause_ms)
        .download_timeout_secs(cli.download_timeout)
        .retry(RetryPolicy {
            max_attempts: cli.max_attempts,
            base_delay_ms: cli.retry_base_secs.saturating_mul(1000),
        });

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder = match &cli.command {
        Command::Ocr {
            max_pages,
            types,
            dpi,
            lang,
            tesseract,
            keep_downloads,
            ..
        } => builder
            .max_pages(*max_pages)
            .types(types.iter().map(|t| t.trim()).filter(|t| !t.is_empty()))
            .ocr_dpi(*dpi)
            .ocr_language(lang)
            .tesseract_bin(tesseract)
            .keep_downloads(*keep_downloads),
        Command::Extract {
            indices,
            dpi,
            chunk_size,
        } => builder
            .selection(selection(indices))
            .extract_dpi(*dpi)
            .chunk_size(*chunk_size),
        Command::Polish { indices } => builder.selection(selection(indices)),
        _ => builder,
    };

    builder.build().context("Invalid configuration")
}

fn selection(indices: &[usize]) -> RecordSelection {
    if indices.is_empty() {
        RecordSelection::All
    } else {
        RecordSelection::Indices(indices.to_vec())
    }
}

fn print_summary(command: &str, report: &RunReport) {
    let s = &report.stats;
    let skipped = s.skipped_type + s.skipped_pages + s.skipped_other;
    let mark = if s.failed == 0 {
        green("✔")
    } else if s.failed == s.total {
        red("✘")
    } else {
        yellow("⚠")
    };
    eprintln!(
        "{}  {}  {} processed, {} unchanged, {} reused, {} skipped, {} failed  {}",
        mark,
        bold(command),
        s.processed,
        s.unchanged,
        s.skipped_existing,
        skipped,
        if s.failed > 0 {
            red(&s.failed.to_string())
        } else {
            s.failed.to_string()
        },
        dim(&format!("{}ms", s.duration_ms)),
    );
    for err in report.errors() {
        eprintln!("   {} {}", red("•"), err);
    }
}
