//! `clean-posts` and `clean-summaries`: deterministic fixes to generated output.

use super::{list_posts, post_label, read_page, write_page, Run};
use crate::cleanup::{clean_br_tags, clean_ocr_html, strip_markdown};
use crate::config::PipelineConfig;
use crate::error::{CorpusError, DocumentError};
use crate::manifest::Manifest;
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::site::{
    clean_summary_markup, extract_ocr_body, is_placeholder_body, replace_ocr_body, retitle,
    SiteConfig,
};
use std::path::Path;
use tracing::{debug, info};

/// Retitle one page and clean its body; `None` when the page has no body anchor.
pub(crate) fn clean_page(page: &str, site: &SiteConfig) -> Option<String> {
    let body = extract_ocr_body(page)?;
    let retitled = retitle(page, site);
    if !body.contains("<p>") || is_placeholder_body(&body) {
        return Some(retitled);
    }
    let cleaned = clean_br_tags(&clean_ocr_html(&body));
    replace_ocr_body(&retitled, &cleaned)
}

/// Clean every generated post in place.
///
/// Titles in all caps are converted to title case; paragraph bodies go
/// through artifact removal, case restoration and `<br>` cleanup. Placeholder
/// bodies are left alone. A file is only rewritten when its content changed.
pub fn clean_posts(config: &PipelineConfig) -> Result<RunReport, CorpusError> {
    let posts = list_posts(&config.workspace.posts_dir)?;
    info!("Cleaning {} posts", posts.len());

    let mut run = Run::new(config, "clean-posts", posts.len());
    for (i, path) in posts.iter().enumerate() {
        let label = post_label(path);
        run.start(i + 1, &label);
        let outcome = match clean_post_file(path, &label, &config.site) {
            Ok(status) => DocumentOutcome::new(&label, status),
            Err(e) => DocumentOutcome::failed(&label, e),
        };
        run.record(i + 1, outcome);
    }
    Ok(run.finish())
}

fn clean_post_file(
    path: &Path,
    label: &str,
    site: &SiteConfig,
) -> Result<DocumentStatus, DocumentError> {
    let page = read_page(path, label)?;
    let cleaned = clean_page(&page, site).ok_or_else(|| DocumentError::MissingBody {
        page: label.to_string(),
    })?;
    if cleaned == page {
        debug!("{} unchanged", label);
        return Ok(DocumentStatus::Unchanged);
    }
    write_page(path, label, &cleaned)?;
    info!("Cleaned {}", label);
    Ok(DocumentStatus::Processed)
}

/// Strip markdown from summaries, in the manifest and in every post.
///
/// The manifest is saved only when at least one summary changed. Posts get
/// the same treatment on their meta description and summary paragraph.
/// Manifest records are reported first, then posts.
pub fn clean_summaries(config: &PipelineConfig) -> Result<RunReport, CorpusError> {
    let mut manifest = Manifest::load(&config.workspace.manifest_path)?;
    let posts = list_posts(&config.workspace.posts_dir)?;
    let mut run = Run::new(config, "clean-summaries", manifest.len() + posts.len());

    let mut changed = 0;
    for (i, entry) in manifest.entries.iter_mut().enumerate() {
        let title = entry.title().to_string();
        run.start(i + 1, &title);
        let status = match entry.summary.as_deref().map(strip_markdown) {
            Some(cleaned) if Some(cleaned.as_str()) != entry.summary.as_deref() => {
                entry.summary = Some(cleaned);
                changed += 1;
                DocumentStatus::Processed
            }
            _ => DocumentStatus::Unchanged,
        };
        run.record(i + 1, DocumentOutcome::new(title, status));
    }
    if changed > 0 {
        manifest.save()?;
        info!("Cleaned {} summaries in {}", changed, manifest.path.display());
    } else {
        info!("No manifest summaries needed cleaning");
    }

    let offset = manifest.len();
    for (i, path) in posts.iter().enumerate() {
        let index = offset + i + 1;
        let label = post_label(path);
        run.start(index, &label);
        let outcome = match clean_post_summary(path, &label) {
            Ok(status) => DocumentOutcome::new(&label, status),
            Err(e) => DocumentOutcome::failed(&label, e),
        };
        run.record(index, outcome);
    }
    Ok(run.finish())
}

fn clean_post_summary(path: &Path, label: &str) -> Result<DocumentStatus, DocumentError> {
    let page = read_page(path, label)?;
    let cleaned = clean_summary_markup(&page);
    if cleaned == page {
        return Ok(DocumentStatus::Unchanged);
    }
    write_page(path, label, &cleaned)?;
    debug!("Cleaned summary in {}", label);
    Ok(DocumentStatus::Processed)
}
