//! Paragraph-level HTML: building `<p>` bodies from raw OCR and scrubbing them.

use super::artifacts::{
    has_garbled_caps, is_boilerplate, is_ocr_noise, is_page_number, is_repeated_header,
};
use super::case::sentence_case;
use once_cell::sync::Lazy;
use regex::Regex;

/// Page separator written between pages of a local OCR text file.
pub const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";

/// Body used when OCR produced nothing.
pub const OCR_UNAVAILABLE_HTML: &str = "<p class='text-gray-500 italic'>OCR text not available.</p>";

static RE_BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<p>(.*?)</p>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_LEADING_PAGE_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}\s*<br>\s*").unwrap());
static RE_EMBEDDED_PAGE_NO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<br>\s*\d{1,3}\s*<br>").unwrap());
static RE_TRAILING_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(<br>\s*)+</p>").unwrap());
static RE_LEADING_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<p>\s*(<br>\s*)+").unwrap());
static RE_BR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(<br>\s*){3,}").unwrap());

/// Raw OCR text → `<p>` paragraphs, one per blank-line separated block.
///
/// Page-break markers become paragraph breaks; single newlines inside a block
/// become `<br>`.
pub fn format_ocr_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return OCR_UNAVAILABLE_HTML.to_string();
    }

    let text = raw.replace("--- Page Break ---", "\n\n");
    RE_BLANK_LINE
        .split(&text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let escaped = html_escape::encode_quoted_attribute(p);
            format!("<p>{}</p>", escaped.replace('\n', "<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether a paragraph's plain text should be dropped entirely.
fn is_debris(plain: &str) -> bool {
    if is_page_number(plain) || is_ocr_noise(plain) {
        return true;
    }
    if is_repeated_header(plain) || is_boilerplate(plain) {
        return true;
    }
    // Short paragraphs that are almost entirely garbled capitals.
    if has_garbled_caps(plain) && plain.chars().count() < 200 {
        let (letters, upper) = plain
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(n, u), c| (n + 1, u + c.is_uppercase() as usize));
        if letters > 0 && upper as f64 / letters as f64 > 0.8 {
            return true;
        }
    }
    false
}

/// Scrub an OCR body: drop debris paragraphs, strip stray page numbers,
/// merge `<br>` lines and restore sentence case.
pub fn clean_ocr_html(html: &str) -> String {
    let mut cleaned = Vec::new();

    for caps in RE_PARAGRAPH.captures_iter(html) {
        let text = caps[1].trim();
        if text.is_empty() {
            continue;
        }

        let stripped = RE_TAG.replace_all(text, " ");
        let plain = html_escape::decode_html_entities(&stripped);
        if is_debris(plain.trim()) {
            continue;
        }

        let text = RE_LEADING_PAGE_NO.replace(text, "");
        let text = RE_EMBEDDED_PAGE_NO.replace_all(&text, "<br>");

        let merged = text.replace("<br>", " ");
        let unescaped = html_escape::decode_html_entities(&merged);
        let converted = sentence_case(&unescaped);
        cleaned.push(format!(
            "<p>{}</p>",
            html_escape::encode_double_quoted_attribute(&converted)
        ));
    }

    cleaned.join("\n")
}

/// Drop `<br>` at the start and end of paragraphs; cap runs at two.
pub fn clean_br_tags(html: &str) -> String {
    let s = RE_TRAILING_BR.replace_all(html, "</p>");
    let s = RE_LEADING_BR.replace_all(&s, "<p>");
    RE_BR_RUN.replace_all(&s, "<br><br>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_splits_blocks_and_escapes() {
        let raw = "First line\nsecond line\n\n  \nR&D <matters>";
        assert_eq!(
            format_ocr_text(raw),
            "<p>First line<br>second line</p>\n<p>R&amp;D &lt;matters&gt;</p>"
        );
    }

    #[test]
    fn format_treats_page_break_as_paragraph_break() {
        let raw = format!("end of page one{PAGE_BREAK}start of page two");
        assert_eq!(
            format_ocr_text(&raw),
            "<p>end of page one</p>\n<p>start of page two</p>"
        );
    }

    #[test]
    fn format_empty_input() {
        assert_eq!(format_ocr_text("  \n\n "), OCR_UNAVAILABLE_HTML);
    }

    #[test]
    fn clean_drops_debris_and_restores_case() {
        let body = "<p>12</p>\n\
                    <p>THE SHIP SAILED.<br>IT WAS COLD, WASN'T IT?</p>\n\
                    <p>Copyright 1982 by H. G. Rickover</p>\n\
                    <p>Doing a Job https://govleaders.org/rickover.htm</p>\n\
                    <p>Responsibility is a unique concept.</p>";
        assert_eq!(
            clean_ocr_html(body),
            "<p>The ship sailed. It was cold, wasn't it?</p>\n<p>Responsibility is a unique concept.</p>"
        );
    }

    #[test]
    fn clean_drops_all_caps_lines_without_prose_punctuation() {
        assert_eq!(clean_ocr_html("<p>REMARKS BY H. G. RICKOVER</p>"), "");
    }

    #[test]
    fn clean_strips_page_numbers_inside_paragraphs() {
        let body = "<p>4<br>Our people must learn<br>5<br>to think.</p>";
        assert_eq!(clean_ocr_html(body), "<p>Our people must learn to think.</p>");
    }

    #[test]
    fn clean_reescapes_text() {
        let body = "<p>Spending on R&amp;D &quot;grew&quot; fast.</p>";
        assert_eq!(
            clean_ocr_html(body),
            "<p>Spending on R&amp;D &quot;grew&quot; fast.</p>"
        );
    }

    #[test]
    fn br_cleanup() {
        assert_eq!(clean_br_tags("<p><br> a<br><br><br><br>b<br></p>"), "<p>a<br><br>b</p>");
        assert_eq!(clean_br_tags("<p>a<br>b</p>"), "<p>a<br>b</p>");
    }
}
