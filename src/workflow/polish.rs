//! `polish`: LLM cleanup of hosted-extraction bodies.

use super::{read_page, write_page, Run};
use crate::cleanup::unwrap_html_response;
use crate::config::PipelineConfig;
use crate::error::{CorpusError, DocumentError};
use crate::manifest::{Manifest, ManifestEntry};
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::pipeline::llm::{complete, resolve_provider};
use crate::site::{extract_ocr_body, replace_ocr_body};
use edgequake_llm::{ChatMessage, LLMProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a polished body is long enough to replace the original.
///
/// A model that truncates or summarises returns far less than it was given;
/// anything below `min_ratio` of the input length (in characters) is discarded.
pub(crate) fn accept_polished(original: &str, polished: &str, min_ratio: f64) -> bool {
    !polished.trim().is_empty()
        && polished.chars().count() as f64 >= original.chars().count() as f64 * min_ratio
}

fn skipped(title: &str, reason: &str) -> DocumentOutcome {
    DocumentOutcome::new(
        title,
        DocumentStatus::Skipped {
            reason: reason.to_string(),
        },
    )
}

/// Send the bodies of `gemini` records through the cleanup prompt.
///
/// `config.selection` indexes into the `gemini` records. Records without a
/// page, with a missing page file or with a body shorter than
/// `min_polish_chars` are skipped. Requests run one at a time with
/// `request_pause_ms` between them.
pub async fn polish_posts(config: &PipelineConfig) -> Result<RunReport, CorpusError> {
    let manifest = Manifest::load(&config.workspace.manifest_path)?;
    let hosted: Vec<&ManifestEntry> = manifest.entries.iter().filter(|e| e.is_gemini()).collect();
    let selected: Vec<&ManifestEntry> = config
        .selection
        .apply(hosted.len())?
        .into_iter()
        .map(|pos| hosted[pos])
        .collect();
    info!(
        "{} hosted-extraction records, {} selected for cleanup",
        hosted.len(),
        selected.len()
    );

    let provider = resolve_provider(config)?;
    let mut run = Run::new(config, "polish", selected.len());
    for (n, entry) in selected.iter().enumerate() {
        let index = n + 1;
        if n > 0 {
            tokio::time::sleep(config.request_pause()).await;
        }
        run.start(index, entry.title());
        let outcome = polish_record(config, &provider, entry).await?;
        run.record(index, outcome);
    }
    Ok(run.finish())
}

async fn polish_record(
    config: &PipelineConfig,
    provider: &Arc<dyn LLMProvider>,
    entry: &ManifestEntry,
) -> Result<DocumentOutcome, CorpusError> {
    let title = entry.title();
    if entry.blog_page().is_empty() {
        return Ok(skipped(title, "no page"));
    }
    let label = entry.blog_page().trim_start_matches('/').to_string();
    let path = config.workspace.page_path(entry.blog_page());
    if !path.exists() {
        return Ok(skipped(title, "page not found"));
    }

    let page = match read_page(&path, &label) {
        Ok(page) => page,
        Err(e) => return Ok(DocumentOutcome::failed(title, e)),
    };
    let body = match extract_ocr_body(&page) {
        Some(body) if body.chars().count() >= config.min_polish_chars => body,
        _ => return Ok(skipped(title, "no OCR content")),
    };

    let body_chars = body.chars().count();
    info!("Polishing {} ({} chars)", label, body_chars);
    let prompt = format!("{}{}", config.cleanup_prompt(), body);
    let messages = [ChatMessage::user(prompt)];
    let raw = match complete(provider, &messages, config, &format!("'{title}'")).await {
        Ok(raw) => raw,
        Err(e) if e.is_per_document() => {
            return Ok(DocumentOutcome::failed(
                title,
                DocumentError::CleanupRejected {
                    title: title.to_string(),
                    detail: e.to_string(),
                },
            ));
        }
        Err(e) => return Err(e),
    };
    let polished = unwrap_html_response(&raw);
    let polished_chars = polished.chars().count();
    debug!("{}: {} → {} chars", label, body_chars, polished_chars);

    if !accept_polished(&body, &polished, config.min_cleanup_ratio) {
        warn!(
            "{}: response too short ({} of {} chars), keeping original",
            label, polished_chars, body_chars
        );
        return Ok(DocumentOutcome::failed(
            title,
            DocumentError::CleanupRejected {
                title: title.to_string(),
                detail: format!("{} of {} chars returned", polished_chars, body_chars),
            },
        ));
    }

    let Some(updated) = replace_ocr_body(&page, &polished) else {
        return Ok(DocumentOutcome::failed(
            title,
            DocumentError::MissingBody { page: label },
        ));
    };
    if let Err(e) = write_page(&path, &label, &updated) {
        return Ok(DocumentOutcome::failed(title, e));
    }
    Ok(DocumentOutcome::new(title, DocumentStatus::Processed))
}
