//! Deterministic cleanup of noisy extracted text.
//!
//! Every function here is a pure `&str → String` (or `&str → bool`) pass with
//! no I/O, so the workflow commands can compose them and the tests can pin
//! them down one rule at a time.
//!
//! ```text
//! raw OCR text ──▶ paragraphs::format_ocr_text ──▶ <p>…</p> body
//! <p> body     ──▶ paragraphs::clean_ocr_html  ──▶ artifacts dropped, case restored
//! summaries    ──▶ markdown::strip_markdown    ──▶ plain prose
//! ```

pub mod artifacts;
pub mod case;
pub mod markdown;
pub mod paragraphs;

pub use crate::pipeline::postprocess::unwrap_html_response;
pub use artifacts::{
    has_garbled_caps, is_boilerplate, is_ocr_noise, is_page_number, is_repeated_header,
};
pub use case::{capitalize_first, is_all_caps, sentence_case, title_case_smart};
pub use markdown::{strip_markdown, strip_markdown_fragment};
pub use paragraphs::{clean_br_tags, clean_ocr_html, format_ocr_text, OCR_UNAVAILABLE_HTML};
