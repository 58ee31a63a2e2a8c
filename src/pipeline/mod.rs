//! Building blocks shared by the OCR backends and the workflow commands.
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ postprocess
//! (URL)     (pdfium)   (PNG/b64)  (retry)  (unwrap fences)
//! ```
//!
//! 1. [`input`]  — stream a PDF from public storage to disk, verify `%PDF`
//! 2. [`render`] — page counts, rasterisation and chunk ranges; pdfium work
//!    runs on the blocking pool
//! 3. [`encode`] — PNG bytes for tesseract, base64 `ImageData` for the LLM
//! 4. [`llm`]    — provider resolution and the rate-limit retry loop
//! 5. [`postprocess`] — strip code fences and invisible characters from
//!    model output

pub mod encode;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
