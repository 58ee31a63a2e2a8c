//! Static HTML output: one page per document and a searchable index.
//!
//! Pages are plain strings built from templates; nothing is parsed as a DOM.
//! Later commands edit generated pages in place by anchoring on fixed markup
//! (see [`patch`]), so the class strings in the templates are load-bearing.

pub mod index;
pub mod patch;
pub mod post;
pub mod themes;

pub use index::{render_index, IndexStyle};
pub use patch::{
    clean_summary_markup, extract_ocr_body, is_placeholder_body, replace_ocr_body, retag,
    retitle,
};
pub use post::{placeholder_body, render_post};
pub use themes::{theme_color, themes_for};

use serde::{Deserialize, Serialize};

/// Branding and fixed links shared by every generated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Appended to every page title: `"<title> — <site_name>"`.
    pub site_name: String,
    /// `<title>` prefix of the archive-style index page.
    pub index_title: String,
    /// Meta description of the archive-style index page.
    pub index_description: String,
    /// Line under the heading on the archive-style index page.
    pub index_tagline: String,
    /// Meta description of the themed index page.
    pub themed_index_description: String,
    /// Intro paragraph of the themed index page.
    pub themed_index_intro: String,
    /// Google Analytics measurement id; no tag when `None`.
    pub analytics_id: Option<String>,
    pub favicon: String,
    /// Portrait shown above the archive-style index heading.
    pub portrait: Option<String>,
    /// Link back to the main archive page.
    pub archive_url: String,
    /// Credit line in the footer (HTML).
    pub footer_credit_html: String,
    pub footer_logo: Option<String>,
    pub footer_logo_link: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "The Rickover Corpus".to_string(),
            index_title: "Blog".to_string(),
            index_description: "Browse Admiral Hyman G. Rickover's speeches, congressional \
                                testimonies, and memos in full text."
                .to_string(),
            index_tagline: "Full-text archive of Admiral Rickover's documents".to_string(),
            themed_index_description: "Full-text blog posts from Admiral Hyman G. Rickover's \
                                       speeches, testimonies, and writings."
                .to_string(),
            themed_index_intro: "Admiral Rickover's speeches, testimonies, and writings, \
                                 transcribed and searchable."
                .to_string(),
            analytics_id: Some("G-M0H8BLJN0S".to_string()),
            favicon: "/assets/rickover_favicon.png".to_string(),
            portrait: Some("/assets/rickover.jpg".to_string()),
            archive_url: "/index.html".to_string(),
            footer_credit_html: "This project was compiled and digitized by \
                <a href=\"https://charlesyang.io\" target=\"_blank\">Charles Yang</a>\n      \
                under the <a href=\"https://industrialstrategy.org\" target=\"_blank\">Center \
                for Industrial Strategy</a>."
                .to_string(),
            footer_logo: Some("/assets/CIS_logo.png".to_string()),
            footer_logo_link: "https://www.industrialstrategy.org".to_string(),
        }
    }
}

impl SiteConfig {
    /// `"<title> — <site_name>"`, the `<title>` of a post.
    pub fn page_title(&self, title: &str) -> String {
        format!("{title} — {}", self.site_name)
    }

    /// `<head>` elements shared by every page: stylesheet, favicon, analytics.
    pub(crate) fn head_assets(&self) -> String {
        let mut out = format!(
            "  <link href=\"https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css\" rel=\"stylesheet\">\n  \
             <link rel=\"icon\" type=\"image/png\" href=\"{}\" sizes=\"256x256\">\n",
            attr(&self.favicon)
        );
        if let Some(id) = &self.analytics_id {
            let id = attr(id);
            out.push_str(&format!(
                "  <!-- Google tag (gtag.js) -->\n  \
                 <script async src=\"https://www.googletagmanager.com/gtag/js?id={id}\"></script>\n  \
                 <script>\n    \
                 window.dataLayer = window.dataLayer || [];\n    \
                 function gtag(){{dataLayer.push(arguments);}}\n    \
                 gtag('js', new Date());\n    \
                 gtag('config', '{id}');\n  \
                 </script>\n"
            ));
        }
        out
    }

    /// Footer shared by every page.
    pub(crate) fn footer(&self, width_class: &str) -> String {
        let mut out = format!(
            "  <footer class=\"mt-12 border-t border-gray-300 pt-6 pb-8 text-sm {width_class} mx-auto px-4 text-center text-gray-600\">\n    \
             <p>\n      {}\n    </p>\n",
            self.footer_credit_html
        );
        if let Some(logo) = &self.footer_logo {
            out.push_str(&format!(
                "    <a href=\"{}\" target=\"_blank\" class=\"mt-4 inline-block\">\n      \
                 <img src=\"{}\" alt=\"Logo\" class=\"h-10 w-auto mx-auto\"\n           \
                 style=\"clip-path: inset(1px 1px 1px 1px);\">\n    \
                 </a>\n",
                attr(&self.footer_logo_link),
                attr(logo)
            ));
        }
        out.push_str("  </footer>\n");
        out
    }
}

/// Escape text for element content or a double-quoted attribute.
pub(crate) fn esc(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Escape a URL or class list for a double-quoted attribute.
pub(crate) fn attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// First `n` characters of `text`.
pub(crate) fn truncate_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
