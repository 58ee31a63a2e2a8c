//! In-place edits of generated post pages.
//!
//! Every edit anchors on markup the templates in [`super::post`] emit. A page
//! whose anchor is missing is left untouched.

use super::themes::tag_spans;
use super::SiteConfig;
use crate::cleanup::{strip_markdown_fragment, title_case_smart};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_OCR_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(<div class="ocr-text text-gray-800">)\s*(.*?)\s*(</div>)"#).unwrap()
});
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title>(.*?)</title>").unwrap());
static RE_H1: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<h1 class="text-3xl font-bold tracking-tight mb-3">(.*?)</h1>"#).unwrap()
});
static RE_META_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<meta\s+name="description"\s+content="(.*?)""#).unwrap());
static RE_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<h2 class="text-lg font-semibold mb-2">Summary</h2>\s*<p class="text-gray-700 leading-relaxed">(.*?)</p>"#,
    )
    .unwrap()
});
static RE_TAG_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(<div class="flex flex-wrap gap-3 text-sm text-gray-600 mb-4">)\s*(.*?)\s*(</div>)"#)
        .unwrap()
});
static RE_TXT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s*<a href="[^"]+\.txt"[^>]*>View Original TXT</a>"#).unwrap()
});

/// Marker text of [`super::placeholder_body`].
const PLACEHOLDER_MARKER: &str = "Full OCR text will be available";

/// Replace capture group `group` of the first match of `re`, if any.
fn rewrite_group(page: &str, re: &Regex, group: usize, f: impl FnOnce(&str) -> String) -> String {
    match re.captures(page).and_then(|c| c.get(group)) {
        Some(m) => {
            let replacement = f(m.as_str());
            format!("{}{}{}", &page[..m.start()], replacement, &page[m.end()..])
        }
        None => page.to_string(),
    }
}

/// Rebuild a `open\n        inner\n      close` block around `inner`.
fn wrap_block(page: &str, caps: &Captures<'_>, inner: &str) -> String {
    let whole = caps.get(0).map_or(0..0, |m| m.range());
    format!(
        "{}{}\n        {}\n      {}{}",
        &page[..whole.start],
        &caps[1],
        inner,
        &caps[3],
        &page[whole.end..]
    )
}

/// The body inside `<div class="ocr-text text-gray-800">`, trimmed.
pub fn extract_ocr_body(page: &str) -> Option<String> {
    RE_OCR_DIV.captures(page).map(|c| c[2].trim().to_string())
}

/// Replace the body inside the ocr div. `None` when the page has no ocr div.
pub fn replace_ocr_body(page: &str, new_body: &str) -> Option<String> {
    RE_OCR_DIV
        .captures(page)
        .map(|caps| wrap_block(page, &caps, new_body))
}

/// Whether a body is still the "available after running the pipeline" placeholder.
pub fn is_placeholder_body(body: &str) -> bool {
    body.contains(PLACEHOLDER_MARKER)
}

fn title_case_escaped(escaped: &str) -> String {
    let plain = html_escape::decode_html_entities(escaped);
    title_case_smart(&plain).replace('&', "&amp;")
}

/// Title-case an ALL CAPS `<title>` and `<h1>`.
pub fn retitle(page: &str, site: &SiteConfig) -> String {
    let suffix = format!(" — {}", site.site_name);
    let page = rewrite_group(page, &RE_TITLE, 1, |inner| match inner.strip_suffix(&suffix) {
        Some(title) => format!("{}{suffix}", title_case_escaped(title)),
        None => inner.to_string(),
    });
    rewrite_group(&page, &RE_H1, 1, title_case_escaped)
}

/// Strip markdown decorators from the meta description and the summary paragraph.
pub fn clean_summary_markup(page: &str) -> String {
    let page = rewrite_group(page, &RE_META_DESCRIPTION, 1, strip_markdown_fragment);
    rewrite_group(&page, &RE_SUMMARY, 1, strip_markdown_fragment)
}

/// Replace the tag row with year + theme tags and drop "View Original TXT" links.
pub fn retag(page: &str, year: &str, themes: &[String]) -> String {
    let page = match RE_TAG_ROW.captures(page) {
        Some(caps) => {
            let spans = tag_spans(year, themes, "py-1", "bg-gray-200").join("\n        ");
            wrap_block(page, &caps, &spans)
        }
        None => page.to_string(),
    };
    RE_TXT_LINK.replace_all(&page, "").into_owned()
}
