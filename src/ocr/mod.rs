//! Text extraction backends.
//!
//! ```text
//!            ┌─ Local  ─▶ pdfium 300 DPI ─▶ preprocess ─▶ tesseract ─▶ plain text (.txt cache)
//! PDF path ──┤
//!            └─ Hosted ─▶ pdfium 150 DPI ─▶ PNG chunks ─▶ multimodal LLM ─▶ <p> HTML
//! ```

pub mod hosted;
pub mod local;

pub use hosted::HostedExtractor;
pub use local::{preprocess_page, LocalOcr};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which engine turns scans into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Tesseract on this machine; produces plain text.
    #[default]
    Local,
    /// A multimodal LLM; produces `<p>` paragraphs.
    Hosted,
}

impl OcrBackend {
    /// Extension of the per-document cache file in the OCR output directory.
    pub fn cache_extension(self) -> &'static str {
        match self {
            OcrBackend::Local => "txt",
            OcrBackend::Hosted => "html",
        }
    }
}

impl fmt::Display for OcrBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OcrBackend::Local => "local",
            OcrBackend::Hosted => "hosted",
        })
    }
}

impl FromStr for OcrBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "tesseract" => Ok(OcrBackend::Local),
            "hosted" | "llm" | "gemini" => Ok(OcrBackend::Hosted),
            other => Err(format!("unknown OCR backend '{other}' (expected local or hosted)")),
        }
    }
}
