//! Post-processing: deterministic cleanup of LLM-generated HTML bodies.
//!
//! Even well-prompted models occasionally wrap their answer in a
//! ` ```html … ``` ` fence despite the prompt saying not to, answer with
//! Windows line endings, or sprinkle zero-width characters copied from the
//! scan's text layer. These rules fix that without touching content.
//!
//! ## Rule Order
//!
//! Fences are stripped first (they sit outside everything else), then line
//! endings are normalised, then invisible characters go, and the result is
//! trimmed last.

/// Apply all post-processing rules to a raw model response.
///
/// Rules (applied in order):
/// 1. Strip an outer ` ```html ` / ` ``` ` fence
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 4. Trim surrounding whitespace
pub fn unwrap_html_response(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer fences ───────────────────────────────────────────────

fn strip_outer_fence(input: &str) -> &str {
    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix("```html") {
        s = rest;
    }
    if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────────
//
// Zero-width space (U+200B), BOM (U+FEFF), soft hyphen (U+00AD), ZWNJ
// (U+200C), ZWJ (U+200D) and word joiner (U+2060) render as nothing but break
// search and string comparison.

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}
