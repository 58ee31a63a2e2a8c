//! Image encoding: rendered pages → PNG bytes, and PNG → base64 `ImageData`
//! for multimodal requests.
//!
//! PNG throughout: JPEG artefacts around glyph edges hurt both tesseract and
//! vision models on typewritten scans.

use crate::error::CorpusError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a page image as PNG bytes.
pub fn png_bytes(img: &DynamicImage, page: usize) -> Result<Vec<u8>, CorpusError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| CorpusError::RasterisationFailed {
            page,
            detail: format!("PNG encoding failed: {}", e),
        })?;
    Ok(buf)
}

/// Encode a rendered page as a base64 PNG attachment with `detail: "high"`,
/// so small typewriter print is not downsampled away.
pub fn encode_page(img: &DynamicImage, page: usize) -> Result<ImageData, CorpusError> {
    let b64 = STANDARD.encode(png_bytes(img, page)?);
    debug!("Encoded page {} → {} bytes base64", page, b64.len());
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
