//! Per-document post page.

use super::themes::tag_spans;
use super::{attr, esc, truncate_chars, SiteConfig};
use crate::manifest::ManifestEntry;

/// Characters of the escaped summary used for the meta description.
const META_DESCRIPTION_CHARS: usize = 160;

/// Body shown until a document has been through OCR or extraction.
pub fn placeholder_body(entry: &ManifestEntry) -> String {
    format!(
        "<p class=\"text-gray-500 italic\">Full OCR text will be available after running the pipeline. \
         In the meantime, you can <a href=\"{}\" target=\"_blank\">view the existing TXT file</a> \
         or <a href=\"{}\" target=\"_blank\">view the original PDF</a>.</p>",
        attr(entry.ocr_url()),
        attr(entry.pdf_url())
    )
}

/// Tag row: year and themes when the record has themes, otherwise year, type
/// and source.
fn tag_row(entry: &ManifestEntry) -> String {
    let year = entry.year_label();
    if !entry.themes().is_empty() {
        return tag_spans(&year, entry.themes(), "py-1", "bg-gray-200").join("\n        ");
    }

    let doc_type = entry.doc_type.as_deref().unwrap_or("Document");
    let mut row = format!(
        "<span class=\"bg-gray-200 px-2 py-1 rounded\">{}</span>\n        \
         <span class=\"bg-blue-100 text-blue-800 px-2 py-1 rounded\">{}</span>",
        esc(&year),
        esc(doc_type)
    );
    let source = entry.source();
    if !source.is_empty() {
        let source_html = if source.starts_with("http") {
            format!(
                "<a href=\"{}\" target=\"_blank\" class=\"text-blue-600 underline\">{}</a>",
                attr(source),
                esc(source)
            )
        } else {
            esc(source)
        };
        row.push_str(&format!("\n        <span>Source: {source_html}</span>"));
    }
    row
}

fn original_links(entry: &ManifestEntry) -> String {
    let mut links = format!(
        "<a href=\"{}\" target=\"_blank\">View Original PDF</a>",
        attr(entry.pdf_url())
    );
    // Themed pages link the PDF only.
    if !entry.ocr_url().is_empty() && entry.themes().is_empty() {
        links.push_str(&format!(
            "\n        <a href=\"{}\" target=\"_blank\">View Original TXT</a>",
            attr(entry.ocr_url())
        ));
    }
    links
}

/// Render the full post page for one record around an already-built body.
pub fn render_post(entry: &ManifestEntry, body_html: &str, site: &SiteConfig) -> String {
    let title = esc(entry.title());
    let summary = esc(entry.summary());
    let meta_desc = truncate_chars(&summary, META_DESCRIPTION_CHARS);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{page_title}</title>
  <meta name="description" content="{meta_desc}">
{head_assets}  <style>
    a {{ color: #1d4ed8; text-decoration: underline; }}
    a:hover {{ color: #1e40af; }}
    .ocr-text p {{ margin-bottom: 1rem; line-height: 1.75; }}
  </style>
</head>
<body class="bg-gray-50 text-gray-900 font-sans">

  <nav class="max-w-3xl mx-auto px-4 py-6 flex space-x-4 text-sm">
    <a href="{archive}">&larr; Archive</a>
    <a href="/blog.html">&larr; Blog Index</a>
  </nav>

  <article class="max-w-3xl mx-auto px-4 pb-12">
    <header class="mb-8">
      <h1 class="text-3xl font-bold tracking-tight mb-3">{title}</h1>
      <div class="flex flex-wrap gap-3 text-sm text-gray-600 mb-4">
        {tags}
      </div>
      <div class="flex space-x-4 text-sm">
        {links}
      </div>
    </header>

    <section class="bg-white border border-gray-200 rounded-lg p-6 mb-8 shadow-sm">
      <h2 class="text-lg font-semibold mb-2">Summary</h2>
      <p class="text-gray-700 leading-relaxed">{summary}</p>
    </section>

    <section>
      <h2 class="text-lg font-semibold mb-4">Full Text (OCR)</h2>
      <div class="ocr-text text-gray-800">
        {body_html}
      </div>
    </section>
  </article>

{footer}
</body>
</html>"#,
        page_title = site.page_title(&title),
        head_assets = site.head_assets(),
        archive = attr(&site.archive_url),
        tags = tag_row(entry),
        links = original_links(entry),
        footer = site.footer("max-w-3xl"),
    )
}
