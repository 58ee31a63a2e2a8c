//! Hosted extraction: page images → multimodal LLM → `<p>` paragraphs.
//!
//! Pages are rendered at a modest DPI and sent in chunks of at most
//! `chunk_size` pages, one request per chunk, strictly one after another
//! with a pause in between. Long documents get a note telling the model which
//! slice it is looking at so it does not start with a fresh preamble.

use crate::cleanup::unwrap_html_response;
use crate::config::PipelineConfig;
use crate::error::CorpusError;
use crate::pipeline::encode::encode_page;
use crate::pipeline::llm::{complete, resolve_provider};
use crate::pipeline::render::{chunk_ranges, page_count, render_pages};
use crate::prompts::chunk_note;
use edgequake_llm::{ChatMessage, LLMProvider};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// System prompt for pages `first..=last` of a `total`-page document.
fn system_prompt(
    base: &str,
    chunk_size: usize,
    (first, last): (usize, usize),
    total: usize,
) -> String {
    let mut prompt = base.to_string();
    if total > chunk_size {
        prompt.push_str(&chunk_note(first, last, total));
    }
    prompt
}

/// Sends scanned pages to a multimodal model and collects its HTML.
pub struct HostedExtractor {
    provider: Arc<dyn LLMProvider>,
    config: PipelineConfig,
}

impl HostedExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            config: config.clone(),
        }
    }

    /// Build an extractor with the provider the config resolves to.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, CorpusError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Extract the text of `pdf` as `<p>` paragraphs.
    pub async fn extract(&self, pdf: &Path, title: &str) -> Result<String, CorpusError> {
        let total = page_count(pdf).await?;
        if total == 0 {
            return Err(CorpusError::CorruptPdf {
                path: pdf.to_path_buf(),
                detail: "document has no pages".to_string(),
            });
        }

        let ranges = chunk_ranges(total, self.config.chunk_size);
        info!(
            "Extracting '{}': {} pages in {} request(s)",
            title,
            total,
            ranges.len()
        );

        let mut parts = Vec::with_capacity(ranges.len());
        for (i, &(first, last)) in ranges.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.request_pause()).await;
            }
            let label = if ranges.len() > 1 {
                format!("'{}' pages {}-{} of {}", title, first, last, total)
            } else {
                format!("'{}'", title)
            };
            if let Some(cb) = &self.config.progress_callback {
                cb.on_step(&format!("chunk {}/{}", i + 1, ranges.len()));
            }

            let indices: Vec<usize> = (first - 1..last).collect();
            let rendered = render_pages(
                pdf,
                self.config.extract_dpi,
                Some(self.config.max_rendered_pixels),
                &indices,
            )
            .await?;
            let images = rendered
                .iter()
                .map(|(idx, img)| encode_page(img, idx + 1))
                .collect::<Result<Vec<_>, _>>()?;

            let messages = vec![
                ChatMessage::system(system_prompt(
                    self.config.extraction_prompt(),
                    self.config.chunk_size,
                    (first, last),
                    total,
                )),
                ChatMessage::user_with_images("", images),
            ];
            let raw = complete(&self.provider, &messages, &self.config, &label).await?;
            let html = unwrap_html_response(&raw);
            debug!("{}: {} chars of HTML", label, html.len());
            parts.push(html);
        }

        Ok(parts.join("\n\n"))
    }
}
