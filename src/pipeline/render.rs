//! PDF rasterisation: page counts and page images via pdfium.
//!
//! pdfium keeps thread-local state and every call blocks, so the async entry
//! points hand the work to `tokio::task::spawn_blocking`. Callers that do
//! more blocking work per page (local OCR) use [`for_each_page`] from inside
//! their own blocking task so only one page image is alive at a time.

use crate::error::CorpusError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Bind to a pdfium library.
///
/// Looks in `$PDFIUM_LIB_PATH`, then the working directory, then the system
/// library path.
pub fn bind_pdfium() -> Result<Pdfium, CorpusError> {
    let from_env = std::env::var("PDFIUM_LIB_PATH")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(|dir| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)));

    let bindings = match from_env {
        Some(Ok(bindings)) => Ok(bindings),
        Some(Err(e)) => {
            warn!("PDFIUM_LIB_PATH is set but binding failed: {:?}", e);
            Err(e)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")),
    }
    .or_else(|_| Pdfium::bind_to_system_library())
    .map_err(|e| CorpusError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn open<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, CorpusError> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| CorpusError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

/// Number of pages in a PDF.
pub async fn page_count(pdf_path: &Path) -> Result<usize, CorpusError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = open(&pdfium, &path)?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| CorpusError::Internal(format!("Page count task panicked: {}", e)))?
}

/// Rasterise the given 0-based pages at `dpi`, longest edge capped at
/// `max_edge` pixels when set.
///
/// Returns `(page_index, image)` pairs; out-of-range indices are skipped.
pub async fn render_pages(
    pdf_path: &Path,
    dpi: u32,
    max_edge: Option<u32>,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, CorpusError> {
    let path: PathBuf = pdf_path.to_path_buf();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        let mut images = Vec::with_capacity(indices.len());
        for_each_page(&path, dpi, max_edge, Some(indices.as_slice()), |idx, _total, image| {
            images.push((idx, image));
            Ok(())
        })?;
        Ok(images)
    })
    .await
    .map_err(|e| CorpusError::Internal(format!("Render task panicked: {}", e)))?
}

/// Render pages one at a time and hand each `(index, page_count, image)` to
/// `f`. `None` renders every page. Blocking.
///
/// Returns the total page count of the document.
pub fn for_each_page<F>(
    pdf_path: &Path,
    dpi: u32,
    max_edge: Option<u32>,
    page_indices: Option<&[usize]>,
    mut f: F,
) -> Result<usize, CorpusError>
where
    F: FnMut(usize, usize, DynamicImage) -> Result<(), CorpusError>,
{
    let pdfium = bind_pdfium()?;
    let document = open(&pdfium, pdf_path)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);
    if let Some(edge) = max_edge {
        render_config = render_config
            .set_maximum_width(edge as i32)
            .set_maximum_height(edge as i32);
    }

    let all: Vec<usize>;
    let page_indices = match page_indices {
        Some(indices) => indices,
        None => {
            all = (0..total_pages).collect();
            &all
        }
    };

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = pages
            .get(idx as u16)
            .map_err(|e| CorpusError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            CorpusError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        f(idx, total_pages, image)?;
    }

    Ok(total_pages)
}

/// Split pages `1..=total` into consecutive inclusive ranges of at most
/// `chunk_size` pages.
///
/// ```
/// use corpus_press::pipeline::render::chunk_ranges;
/// assert_eq!(chunk_ranges(23, 10), vec![(1, 10), (11, 20), (21, 23)]);
/// ```
pub fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let size = chunk_size.max(1);
    (1..=total)
        .step_by(size)
        .map(|first| (first, (first + size - 1).min(total)))
        .collect()
}
