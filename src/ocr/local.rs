//! Local OCR: pdfium rasterisation at 300 DPI, light image cleanup, then the
//! `tesseract` binary page by page.
//!
//! The engine runs as a subprocess with the page written to a temporary PNG,
//! so no native OCR bindings are linked into the crate.

use crate::cleanup::paragraphs::PAGE_BREAK;
use crate::error::CorpusError;
use crate::manifest::write_atomic;
use crate::pipeline::encode::png_bytes;
use crate::pipeline::render::for_each_page;
use crate::progress::ProgressCallback;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info};

/// `adjust_contrast` percentage giving a ×1.5 contrast stretch.
const CONTRAST_PERCENT: f32 = 22.5;

/// 3×3 sharpen kernel (normalised by its sum, 16).
const SHARPEN: [f32; 9] = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];

/// Log a progress line every this many pages.
const LOG_EVERY: usize = 10;

/// Settings for one local OCR run.
#[derive(Debug, Clone)]
pub struct LocalOcr {
    pub dpi: u32,
    pub language: String,
    pub tesseract_bin: PathBuf,
}

impl Default for LocalOcr {
    fn default() -> Self {
        Self {
            dpi: 300,
            language: "eng".to_string(),
            tesseract_bin: PathBuf::from("tesseract"),
        }
    }
}

/// Grayscale, stretch contrast, sharpen.
pub fn preprocess_page(image: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageLuma8(image.to_luma8())
        .adjust_contrast(CONTRAST_PERCENT)
        .filter3x3(&SHARPEN)
}

impl LocalOcr {
    /// Run tesseract on one page image and return its text.
    ///
    /// `page` is 1-indexed and only used in error messages.
    pub fn recognise(&self, image: &DynamicImage, page: usize) -> Result<String, CorpusError> {
        let engine_error = |detail: String| CorpusError::OcrEngineFailed { page, detail };

        let mut input = tempfile::Builder::new()
            .prefix("corpus-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| engine_error(format!("temp file: {e}")))?;
        input
            .write_all(&png_bytes(image, page)?)
            .map_err(|e| engine_error(format!("temp file write: {e}")))?;

        let output = Command::new(&self.tesseract_bin)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                engine_error(format!(
                    "failed to run '{}': {e}",
                    self.tesseract_bin.display()
                ))
            })?;

        if !output.status.success() {
            return Err(engine_error(format!(
                "{} exited with {}: {}",
                self.tesseract_bin.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// OCR every page of `pdf`, caching the joined text at `txt_cache`.
    ///
    /// An existing cache is returned without touching the PDF. A PDF that
    /// cannot be rasterised yields empty text and no cache file, so the post
    /// shows "OCR text not available" and the next run tries again.
    pub async fn ocr_pdf(
        &self,
        pdf: &Path,
        txt_cache: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<String, CorpusError> {
        if txt_cache.exists() {
            info!("OCR already done: {}", txt_cache.display());
            return tokio::fs::read_to_string(txt_cache)
                .await
                .map_err(|e| CorpusError::ReadFailed {
                    path: txt_cache.to_path_buf(),
                    source: e,
                });
        }

        let engine = self.clone();
        let path = pdf.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            let mut pages = Vec::new();
            for_each_page(&path, engine.dpi, None, None, |idx, total, image| {
                let text = engine.recognise(&preprocess_page(&image), idx + 1)?;
                debug!("OCR page {}: {} chars", idx + 1, text.len());
                pages.push(text);
                if (idx + 1) % LOG_EVERY == 0 {
                    info!("OCR page {}/{}", idx + 1, total);
                    if let Some(cb) = &progress {
                        cb.on_step(&format!("OCR page {}/{}", idx + 1, total));
                    }
                }
                Ok(())
            })?;
            Ok::<_, CorpusError>(pages)
        })
        .await
        .map_err(|e| CorpusError::Internal(format!("OCR task panicked: {}", e)))?;

        let pages = match result {
            Ok(pages) => pages,
            Err(e @ (CorpusError::CorruptPdf { .. } | CorpusError::RasterisationFailed { .. })) => {
                error!("PDF-to-image failed for {}: {}", pdf.display(), e);
                return Ok(String::new());
            }
            Err(e) => return Err(e),
        };

        let full_text = pages.join(PAGE_BREAK);
        write_atomic(txt_cache, &full_text)?;
        info!(
            "OCR complete: {} pages -> {}",
            pages.len(),
            txt_cache.display()
        );
        Ok(full_text)
    }
}
