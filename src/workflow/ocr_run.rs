//! `ocr`: download, extract and publish every record end to end.

use super::{discard_download, document_failure, write_index, Run};
use crate::cleanup::{format_ocr_text, OCR_UNAVAILABLE_HTML};
use crate::config::PipelineConfig;
use crate::error::{CorpusError, DocumentError};
use crate::manifest::{write_atomic, Manifest, ManifestEntry};
use crate::ocr::{HostedExtractor, LocalOcr, OcrBackend};
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::pipeline::input::download_pdf;
use crate::pipeline::render::page_count;
use crate::site::{render_post, IndexStyle};
use std::path::Path;
use tracing::{info, warn};

/// The engines a run may call, built once up front.
struct Engines {
    backend: OcrBackend,
    local: LocalOcr,
    hosted: Option<HostedExtractor>,
}

/// Run the full pipeline over the manifest with the chosen backend.
///
/// Each record is filtered by type, downloaded, checked against the page
/// limit, extracted and rendered to `posts/<slug>.html`. A record whose post
/// and text cache both exist is rebuilt from the cache without downloading.
/// Afterwards the archive index is rewritten, the manifest saved and the
/// downloaded PDFs removed.
pub async fn run_ocr_pipeline(
    config: &PipelineConfig,
    backend: OcrBackend,
) -> Result<RunReport, CorpusError> {
    let ws = &config.workspace;
    ws.ensure_dirs()?;
    let mut manifest = Manifest::load(&ws.manifest_path)?;
    info!("Loaded {} records, backend {}", manifest.len(), backend);

    let engines = Engines {
        backend,
        local: LocalOcr {
            dpi: config.ocr_dpi,
            language: config.ocr_language.clone(),
            tesseract_bin: config.tesseract_bin.clone(),
        },
        hosted: match backend {
            OcrBackend::Hosted => Some(HostedExtractor::from_config(config)?),
            OcrBackend::Local => None,
        },
    };

    let mut run = Run::new(config, "ocr", manifest.len());
    for (i, entry) in manifest.entries.iter_mut().enumerate() {
        let index = i + 1;
        run.start(index, entry.title());
        let outcome = process_record(config, &engines, entry, index, &run).await?;
        if !matches!(outcome.status, DocumentStatus::Processed | DocumentStatus::Reused) {
            keep_previous_page(entry);
        }
        run.record(index, outcome);
    }

    write_index(config, &manifest.entries, IndexStyle::Archive)?;
    manifest.save()?;
    info!("Saved manifest to {}", manifest.path.display());

    if !config.keep_downloads {
        remove_downloads(&ws.ocr_dir);
    }
    Ok(run.finish())
}

/// A record the run did not publish keeps whatever page it had before.
fn keep_previous_page(entry: &mut ManifestEntry) {
    entry.blog_page.get_or_insert_with(String::new);
}

async fn process_record(
    config: &PipelineConfig,
    engines: &Engines,
    entry: &mut ManifestEntry,
    index: usize,
    run: &Run<'_>,
) -> Result<DocumentOutcome, CorpusError> {
    let title = entry.title().to_string();
    if !config.accepts_type(entry.doc_type()) {
        return Ok(DocumentOutcome::new(title, DocumentStatus::SkippedType));
    }
    let Some(pdf_name) = entry.pdf_filename() else {
        return Ok(DocumentOutcome::new(
            title,
            DocumentStatus::Skipped {
                reason: "no PDF URL".to_string(),
            },
        ));
    };

    let ws = &config.workspace;
    let pdf_path = ws.ocr_dir.join(&pdf_name);
    let stem = Path::new(&pdf_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.slug());
    let cache = ws
        .ocr_dir
        .join(format!("{}.{}", stem, engines.backend.cache_extension()));
    let post_file = ws.posts_dir.join(format!("{}.html", entry.slug()));

    let (text, status) = if post_file.exists() && cache.exists() {
        info!("[{}/{}] Rebuilding from cache: {}", index, run.total(), title);
        let text = std::fs::read_to_string(&cache).map_err(|e| CorpusError::ReadFailed {
            path: cache.clone(),
            source: e,
        })?;
        (text, DocumentStatus::Reused)
    } else {
        info!("[{}/{}] Processing: {}", index, run.total(), title);
        if let Err(e) = download_pdf(entry.pdf_url(), &pdf_path, config.download_timeout_secs).await {
            return Ok(DocumentOutcome::failed(
                &title,
                DocumentError::DownloadFailed {
                    title: title.clone(),
                    detail: e.to_string(),
                },
            ));
        }

        if let Some(max) = config.max_pages {
            let pages = page_count(&pdf_path).await.unwrap_or_else(|e| {
                warn!("Could not count pages of {}: {}", pdf_path.display(), e);
                0
            });
            if pages > max {
                discard_download(&pdf_path);
                return Ok(DocumentOutcome::new(
                    title,
                    DocumentStatus::SkippedPages { pages },
                ));
            }
        }

        match extract(config, engines, &pdf_path, &cache, &title, run).await {
            Ok(text) => (text, DocumentStatus::Processed),
            Err(e) => return document_failure(&title, e),
        }
    };

    let body = match engines.backend {
        OcrBackend::Local => format_ocr_text(&text),
        OcrBackend::Hosted if text.trim().is_empty() => OCR_UNAVAILABLE_HTML.to_string(),
        OcrBackend::Hosted => text,
    };
    if engines.backend == OcrBackend::Hosted {
        entry.gemini = Some(true);
    }

    write_atomic(&post_file, &render_post(entry, &body, &config.site))?;
    entry.blog_page = Some(entry.post_path());
    Ok(DocumentOutcome::new(title, status))
}

async fn extract(
    config: &PipelineConfig,
    engines: &Engines,
    pdf: &Path,
    cache: &Path,
    title: &str,
    run: &Run<'_>,
) -> Result<String, CorpusError> {
    match &engines.hosted {
        Some(extractor) => {
            let html = extractor.extract(pdf, title).await?;
            write_atomic(cache, &html)?;
            run.step("pausing between documents");
            tokio::time::sleep(config.request_pause()).await;
            Ok(html)
        }
        None => {
            engines
                .local
                .ocr_pdf(pdf, cache, config.progress_callback.clone())
                .await
        }
    }
}

/// Delete downloaded PDFs; text caches stay.
fn remove_downloads(ocr_dir: &Path) {
    let Ok(dir) = std::fs::read_dir(ocr_dir) else {
        return;
    };
    for path in dir.flatten().map(|e| e.path()) {
        if path.extension().is_some_and(|ext| ext == "pdf") {
            discard_download(&path);
        }
    }
}
