//! `extract`: replace the bodies of existing posts with hosted extraction.

use super::{discard_download, read_page, write_page, Run};
use crate::config::PipelineConfig;
use crate::error::{CorpusError, DocumentError};
use crate::manifest::{Manifest, ManifestEntry};
use crate::ocr::HostedExtractor;
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::pipeline::input::download_pdf;
use crate::site::replace_ocr_body;
use std::path::Path;
use tracing::{info, warn};

/// Records that already have both a PDF link and a generated page.
pub(crate) fn extraction_candidates(entries: &[ManifestEntry]) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.pdf_url().is_empty() && !e.blog_page().is_empty())
        .map(|(i, _)| i)
        .collect()
}

/// Re-extract the selected records with the hosted model.
///
/// `config.selection` indexes into the records that have a PDF link and a
/// page. PDFs go to a temporary directory that is removed when the run ends.
/// Each successful record gets its post body replaced and `gemini = true`;
/// the manifest is saved once at the end.
pub async fn run_hosted_extraction(config: &PipelineConfig) -> Result<RunReport, CorpusError> {
    let mut manifest = Manifest::load(&config.workspace.manifest_path)?;
    let candidates = extraction_candidates(&manifest.entries);
    let selected: Vec<usize> = config
        .selection
        .apply(candidates.len())?
        .into_iter()
        .map(|pos| candidates[pos])
        .collect();
    info!(
        "{} records eligible, {} selected for extraction",
        candidates.len(),
        selected.len()
    );

    let extractor = HostedExtractor::from_config(config)?;
    let downloads = tempfile::Builder::new()
        .prefix("corpus-press-")
        .tempdir()
        .map_err(|e| CorpusError::OutputWriteFailed {
            path: std::env::temp_dir(),
            source: e,
        })?;

    let mut run = Run::new(config, "extract", selected.len());
    let mut changed = false;
    for (n, &record) in selected.iter().enumerate() {
        let index = n + 1;
        if n > 0 {
            tokio::time::sleep(config.request_pause()).await;
        }
        let entry = &mut manifest.entries[record];
        run.start(index, entry.title());
        info!("[{}/{}] Extracting: {}", index, selected.len(), entry.title());

        let pdf = downloads.path().join(format!("doc_{record}.pdf"));
        let outcome = extract_record(config, &extractor, entry, &pdf).await?;
        discard_download(&pdf);
        if outcome.status == DocumentStatus::Processed {
            entry.gemini = Some(true);
            changed = true;
        }
        run.record(index, outcome);
    }

    if changed {
        manifest.save()?;
        info!("Saved manifest to {}", manifest.path.display());
    }
    Ok(run.finish())
}

async fn extract_record(
    config: &PipelineConfig,
    extractor: &HostedExtractor,
    entry: &ManifestEntry,
    pdf: &Path,
) -> Result<DocumentOutcome, CorpusError> {
    let title = entry.title();
    if let Err(e) = download_pdf(entry.pdf_url(), pdf, config.download_timeout_secs).await {
        return Ok(DocumentOutcome::failed(
            title,
            DocumentError::DownloadFailed {
                title: title.to_string(),
                detail: e.to_string(),
            },
        ));
    }

    match extractor.extract(pdf, title).await {
        Ok(html) => Ok(apply_extraction(config, entry, &html)),
        Err(e) => super::document_failure(title, e),
    }
}

/// Put extracted HTML into the record's existing post.
pub(crate) fn apply_extraction(
    config: &PipelineConfig,
    entry: &ManifestEntry,
    html: &str,
) -> DocumentOutcome {
    let title = entry.title();
    if html.trim().is_empty() {
        return DocumentOutcome::failed(
            title,
            DocumentError::ExtractionFailed {
                title: title.to_string(),
                detail: "model returned no text".to_string(),
            },
        );
    }

    let label = entry.blog_page().trim_start_matches('/').to_string();
    let page_path = config.workspace.page_path(entry.blog_page());
    let page = match read_page(&page_path, &label) {
        Ok(page) => page,
        Err(e) => return DocumentOutcome::failed(title, e),
    };
    let Some(updated) = replace_ocr_body(&page, html) else {
        warn!("{} has no ocr-text block", label);
        return DocumentOutcome::failed(title, DocumentError::MissingBody { page: label });
    };
    if let Err(e) = write_page(&page_path, &label, &updated) {
        return DocumentOutcome::failed(title, e);
    }
    info!("Updated {} ({} chars)", label, html.len());
    DocumentOutcome::new(title, DocumentStatus::Processed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pdf: &str, page: &str) -> ManifestEntry {
        ManifestEntry {
            file_pdf: (!pdf.is_empty()).then(|| pdf.to_string()),
            blog_page: (!page.is_empty()).then(|| page.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn candidates_need_pdf_and_page() {
        let entries = vec![
            entry("https://x/a.pdf", "posts/a.html"),
            entry("", "posts/b.html"),
            entry("https://x/c.pdf", ""),
            entry("https://x/d.pdf", "posts/d.html"),
        ];
        assert_eq!(extraction_candidates(&entries), vec![0, 3]);
    }

    fn site_with_page(page: &str) -> (tempfile::TempDir, PipelineConfig, ManifestEntry) {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder().root(dir.path()).build().unwrap();
        let entry: ManifestEntry = serde_json::from_str(
            r#"{"Title": "Doing a Job", "file_pdf": "https://x/a.pdf", "blog_page": "posts/doing-a-job.html"}"#,
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("posts")).unwrap();
        std::fs::write(dir.path().join(entry.blog_page()), page).unwrap();
        (dir, config, entry)
    }

    fn post(entry: &ManifestEntry, body: &str) -> String {
        crate::site::render_post(entry, body, &crate::site::SiteConfig::default())
    }

    #[test]
    fn extracted_html_replaces_the_body() {
        let (dir, config, entry) = site_with_page("");
        std::fs::write(dir.path().join(entry.blog_page()), post(&entry, "<p>old</p>")).unwrap();

        let outcome = apply_extraction(&config, &entry, "<p>new text</p>");
        assert_eq!(outcome.status, DocumentStatus::Processed);
        let page = std::fs::read_to_string(dir.path().join(entry.blog_page())).unwrap();
        assert_eq!(
            crate::site::extract_ocr_body(&page).as_deref(),
            Some("<p>new text</p>")
        );
    }

    #[test]
    fn blank_extraction_is_a_failure() {
        let (dir, config, entry) = site_with_page("");
        let original = post(&entry, "<p>old</p>");
        std::fs::write(dir.path().join(entry.blog_page()), &original).unwrap();

        let outcome = apply_extraction(&config, &entry, "  \n ");
        assert_eq!(outcome.status, DocumentStatus::Failed);
        assert!(matches!(
            outcome.error,
            Some(DocumentError::ExtractionFailed { .. })
        ));
        let page = std::fs::read_to_string(dir.path().join(entry.blog_page())).unwrap();
        assert_eq!(page, original);
    }

    #[test]
    fn page_without_body_block_is_left_alone() {
        let (dir, config, entry) = site_with_page("<html><p>hand-written</p></html>");

        let outcome = apply_extraction(&config, &entry, "<p>new text</p>");
        match outcome.error {
            Some(DocumentError::MissingBody { page }) => assert_eq!(page, "posts/doing-a-job.html"),
            other => panic!("expected MissingBody, got {other:?}"),
        }
        let page = std::fs::read_to_string(dir.path().join(entry.blog_page())).unwrap();
        assert_eq!(page, "<html><p>hand-written</p></html>");
    }
}
