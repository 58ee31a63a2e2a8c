//! The searchable index page (`blog.html`).

use super::themes::tag_spans;
use super::{attr, esc, truncate_chars, SiteConfig};
use crate::manifest::{sorted_for_index, ManifestEntry};

/// Which flavour of index page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    /// Every record, tagged by year and document type.
    Archive,
    /// Only records with hosted-extracted text, tagged by year and theme.
    Themed,
}

impl IndexStyle {
    fn preview_chars(self) -> usize {
        match self {
            IndexStyle::Archive => 200,
            IndexStyle::Themed => 280,
        }
    }

    /// Fields searched by the client-side fuzzy matcher.
    fn search_facet(self) -> &'static str {
        match self {
            IndexStyle::Archive => "type",
            IndexStyle::Themed => "themes",
        }
    }
}

/// Characters of the summary carried in `data-summary` on archive cards.
const DATA_SUMMARY_CHARS: usize = 300;

fn card(entry: &ManifestEntry, style: IndexStyle) -> String {
    let title = esc(entry.title());
    let year = entry.year_label();
    let summary = entry.summary();

    let limit = style.preview_chars();
    let mut preview = esc(truncate_chars(summary, limit));
    if summary.chars().count() > limit {
        preview.push_str("...");
    }

    let (href, data_summary, facet, tags) = match style {
        IndexStyle::Archive => {
            let doc_type = esc(entry.doc_type.as_deref().unwrap_or("Document"));
            let tags = format!(
                "<span class=\"bg-gray-200 px-2 py-0.5 rounded text-gray-700\">{}</span>\n          \
                 <span class=\"bg-blue-100 text-blue-800 px-2 py-0.5 rounded\">{doc_type}</span>",
                esc(&year)
            );
            (
                entry.post_path(),
                esc(truncate_chars(summary, DATA_SUMMARY_CHARS)),
                format!("data-type=\"{doc_type}\""),
                tags,
            )
        }
        IndexStyle::Themed => (
            entry.blog_page().to_string(),
            esc(summary),
            format!("data-themes=\"{}\"", esc(&entry.themes().join(","))),
            tag_spans(&year, entry.themes(), "py-0.5", "bg-gray-200 text-gray-700").join("\n          "),
        ),
    };

    format!(
        r#"      <a href="{href}" class="block bg-white border border-gray-200 rounded-lg p-5 shadow-sm hover:shadow-md transition-shadow no-underline" data-title="{title}" data-summary="{data_summary}" data-year="{year}" {facet}>
        <div class="flex items-start justify-between mb-2">
          <h2 class="text-lg font-semibold text-gray-900" style="text-decoration:none">{title}</h2>
        </div>
        <div class="flex flex-wrap gap-2 mb-3 text-sm">
          {tags}
        </div>
        <p class="text-sm text-gray-600 leading-relaxed" style="text-decoration:none">{preview}</p>
      </a>"#,
        href = attr(&href),
        year = esc(&year),
    )
}

/// Render the index page.
///
/// `Archive` lists every record ordered by year (newest first) then title.
/// `Themed` lists only records marked as hosted-extracted that have a page,
/// in the same order.
pub fn render_index(entries: &[ManifestEntry], style: IndexStyle, site: &SiteConfig) -> String {
    let listed = sorted_for_index(entries.iter().filter(|e| match style {
        IndexStyle::Archive => true,
        IndexStyle::Themed => e.is_gemini() && !e.blog_page().is_empty(),
    }));
    let cards: Vec<String> = listed.iter().map(|e| card(e, style)).collect();

    let (page_title, description, intro) = match style {
        IndexStyle::Archive => (
            format!("{} — {}", site.index_title, site.site_name),
            &site.index_description,
            &site.index_tagline,
        ),
        IndexStyle::Themed => (
            format!("Full Text — {}", site.site_name),
            &site.themed_index_description,
            &site.themed_index_intro,
        ),
    };
    let portrait = match &site.portrait {
        Some(src) => format!(
            "      <img src=\"{}\" alt=\"Portrait\"\n           \
             class=\"w-28 h-28 rounded-full border border-gray-300 object-cover shadow-sm mx-auto mb-4\">\n",
            attr(src)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{page_title}</title>
  <meta name="description" content="{description}">
{head_assets}  <style>
    a {{ color: #1d4ed8; text-decoration: underline; }}
    a:hover {{ color: #1e40af; }}
    a.no-underline {{ text-decoration: none; }}
    a.no-underline:hover {{ text-decoration: none; }}
  </style>
</head>
<body class="bg-gray-50 text-gray-900 font-sans">

  <header class="py-8 bg-gray-50">
    <div class="max-w-5xl mx-auto px-4 text-center">
{portrait}      <h1 class="text-3xl font-bold tracking-tight">{site_name}</h1>
      <p class="text-sm text-gray-600 italic mb-4">{intro}</p>
      <nav class="text-sm space-x-4">
        <a href="{archive}">&larr; Back to Archive</a>
      </nav>
    </div>
  </header>

  <main class="max-w-4xl mx-auto px-4 pb-12">
    <input id="blogSearch" type="text" placeholder="Search documents..."
           class="w-full px-4 py-2 border border-gray-300 rounded mb-6">

    <p id="resultCount" class="text-sm text-gray-500 mb-4"></p>

    <div id="blogCards" class="space-y-4">
{cards}
    </div>

    <p id="noResults" class="hidden text-center text-gray-500 mt-8">No documents match your search.</p>
  </main>

{footer}
  <script src="https://cdn.jsdelivr.net/npm/fuse.js@6.6.2"></script>
  <script>
    (function() {{
      const cards = document.querySelectorAll('#blogCards > a');
      const searchInput = document.getElementById('blogSearch');
      const noResults = document.getElementById('noResults');
      const resultCount = document.getElementById('resultCount');

      const items = Array.from(cards).map((card, i) => ({{
        title: card.dataset.title,
        summary: card.dataset.summary,
        year: card.dataset.year,
        {facet}: card.dataset.{facet},
        index: i
      }}));

      const fuse = new Fuse(items, {{
        keys: ['title', 'summary', '{facet}'],
        threshold: 0.4,
        minMatchCharLength: 2
      }});

      resultCount.textContent = items.length + ' documents';

      searchInput.addEventListener('input', function() {{
        const query = this.value.trim();

        if (!query) {{
          cards.forEach(c => c.style.display = '');
          noResults.classList.add('hidden');
          resultCount.textContent = items.length + ' documents';
          return;
        }}

        const results = fuse.search(query);
        const matched = new Set(results.map(r => r.item.index));

        cards.forEach((card, i) => {{
          card.style.display = matched.has(i) ? '' : 'none';
        }});

        noResults.classList.toggle('hidden', results.length > 0);
        resultCount.textContent = results.length + ' of ' + items.length + ' documents';
      }});
    }})();
  </script>

</body>
</html>"#,
        page_title = esc(&page_title),
        description = esc(description),
        head_assets = site.head_assets(),
        site_name = esc(&site.site_name),
        intro = esc(intro),
        archive = attr(&site.archive_url),
        cards = cards.join("\n"),
        footer = site.footer("max-w-5xl"),
        facet = style.search_facet(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(json: &str) -> Vec<ManifestEntry> {
        serde_json::from_str(json).unwrap()
    }

    fn card_titles(page: &str) -> Vec<String> {
        page.split("data-title=\"")
            .skip(1)
            .map(|s| s.split('"').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn empty_manifest_renders_zero_cards() {
        let page = render_index(&[], IndexStyle::Archive, &SiteConfig::default());
        assert!(page.contains("<div id=\"blogCards\" class=\"space-y-4\">\n\n    </div>"));
        assert!(card_titles(&page).is_empty());
        assert!(page.contains("fuse.js@6.6.2"));
    }

    #[test]
    fn archive_orders_by_year_then_title() {
        let list = entries(
            r#"[{"Title": "B", "Year": 1960}, {"Title": "C", "Year": "Unknown"},
                {"Title": "A", "Year": 1960}, {"Title": "D", "Year": 1975}]"#,
        );
        let page = render_index(&list, IndexStyle::Archive, &SiteConfig::default());
        assert_eq!(card_titles(&page), vec!["D", "A", "B", "C"]);
        assert!(page.contains("href=\"posts/d.html\""));
        assert!(page.contains("data-type=\"Document\""));
        assert!(page.contains("<title>Blog — The Rickover Corpus</title>"));
    }

    #[test]
    fn archive_preview_and_data_summary_lengths() {
        let long = "s".repeat(350);
        let list = entries(&format!(r#"[{{"Title": "T", "Summary": "{long}"}}]"#));
        let page = render_index(&list, IndexStyle::Archive, &SiteConfig::default());
        assert!(page.contains(&format!("data-summary=\"{}\"", "s".repeat(300))));
        assert!(page.contains(&format!("\">{}...</p>", "s".repeat(200))));
    }

    #[test]
    fn short_summary_has_no_ellipsis() {
        let list = entries(r#"[{"Title": "T", "Summary": "Brief."}]"#);
        let page = render_index(&list, IndexStyle::Archive, &SiteConfig::default());
        assert!(page.contains("\">Brief.</p>"));
    }

    #[test]
    fn themed_lists_only_extracted_records() {
        let list = entries(
            r#"[{"Title": "Doing a Job", "Year": 1982, "gemini": true,
                 "blog_page": "posts/doing-a-job.html", "themes": ["Management", "Leadership"]},
                {"Title": "Not Yet", "Year": 1990},
                {"Title": "No Page", "gemini": true}]"#,
        );
        let page = render_index(&list, IndexStyle::Themed, &SiteConfig::default());
        assert_eq!(card_titles(&page), vec!["Doing a Job"]);
        assert!(page.contains("data-themes=\"Management,Leadership\""));
        assert!(page.contains("keys: ['title', 'summary', 'themes']"));
        assert!(page.contains("<title>Full Text — The Rickover Corpus</title>"));
    }
}
