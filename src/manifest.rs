//! The manifest: a flat JSON array of document records.
//!
//! The manifest is the only persistent state. Every command loads it, walks
//! the records in order and (for commands that change records) writes it
//! back. Key spelling follows the existing file (`Title`, `Year`, `file_pdf`,
//! `file_OCR` …) and keys this crate does not know about are carried through
//! untouched.

use crate::error::CorpusError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum slug length in characters.
const SLUG_MAX_CHARS: usize = 120;

/// Publication year: usually a number, occasionally free text ("Unknown", "c. 1960").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(i64),
    Text(String),
}

impl Year {
    /// Numeric sort key; text years sort as 0.
    pub fn sort_key(&self) -> i64 {
        match self {
            Year::Number(n) => *n,
            Year::Text(_) => 0,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Number(n) => write!(f, "{n}"),
            Year::Text(s) => f.write_str(s),
        }
    }
}

/// One document record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "Year", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Year>,

    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(rename = "Summary", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(rename = "Source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pdf: Option<String>,

    #[serde(rename = "file_OCR", default, skip_serializing_if = "Option::is_none")]
    pub file_ocr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_page: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<String>>,

    /// Set once the hosted extractor has produced the page body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<bool>,

    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestEntry {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn doc_type(&self) -> &str {
        self.doc_type.as_deref().unwrap_or("")
    }

    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    pub fn pdf_url(&self) -> &str {
        self.file_pdf.as_deref().unwrap_or("")
    }

    pub fn ocr_url(&self) -> &str {
        self.file_ocr.as_deref().unwrap_or("")
    }

    pub fn blog_page(&self) -> &str {
        self.blog_page.as_deref().unwrap_or("")
    }

    pub fn themes(&self) -> &[String] {
        self.themes.as_deref().unwrap_or(&[])
    }

    pub fn is_gemini(&self) -> bool {
        self.gemini.unwrap_or(false)
    }

    /// Year as displayed on pages; `"Unknown"` when absent.
    pub fn year_label(&self) -> String {
        self.year
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn year_sort_key(&self) -> i64 {
        self.year.as_ref().map(Year::sort_key).unwrap_or(0)
    }

    pub fn slug(&self) -> String {
        slugify(self.title())
    }

    /// Site-relative page path: `posts/<slug>.html`.
    pub fn post_path(&self) -> String {
        format!("posts/{}.html", self.slug())
    }

    /// Local filename for the PDF, decoded from the last URL segment.
    pub fn pdf_filename(&self) -> Option<String> {
        let url = self.pdf_url();
        if url.is_empty() {
            return None;
        }
        let last = url.rsplit('/').next().unwrap_or(url);
        let name = decode_plus(last);
        (!name.is_empty()).then_some(name)
    }
}

/// Percent-decode a URL component, treating `+` as a space.
fn decode_plus(component: &str) -> String {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => spaced,
    }
}

static RE_SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SLUG_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").unwrap());
static RE_SLUG_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Convert a title into a URL-friendly slug.
///
/// ```
/// use corpus_press::manifest::slugify;
/// assert_eq!(slugify("Liberty, Science, and Law"), "liberty-science-and-law");
/// ```
pub fn slugify(title: &str) -> String {
    let slug = title.to_lowercase();
    let slug = RE_SLUG_STRIP.replace_all(&slug, "");
    let slug = RE_SLUG_SPACES.replace_all(&slug, "-");
    let slug = RE_SLUG_DASHES.replace_all(&slug, "-");
    slug.trim_matches('-').chars().take(SLUG_MAX_CHARS).collect()
}

/// Records ordered for the index page: year descending, then title.
pub fn sorted_for_index<'a, I>(entries: I) -> Vec<&'a ManifestEntry>
where
    I: IntoIterator<Item = &'a ManifestEntry>,
{
    let mut v: Vec<&ManifestEntry> = entries.into_iter().collect();
    v.sort_by(|a, b| {
        b.year_sort_key()
            .cmp(&a.year_sort_key())
            .then_with(|| a.title().cmp(b.title()))
    });
    v
}

/// The loaded manifest and where it came from.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read and parse the manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CorpusError::ManifestNotFound { path: path.clone() }
            } else {
                CorpusError::ReadFailed {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;
        let entries: Vec<ManifestEntry> =
            serde_json::from_str(&raw).map_err(|e| CorpusError::ManifestInvalid {
                path: path.clone(),
                source: e,
            })?;
        debug!("Loaded {} records from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    /// Write the manifest back (pretty JSON, UTF-8, atomic).
    pub fn save(&self) -> Result<(), CorpusError> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CorpusError::Internal(format!("manifest serialisation: {e}")))?;
        write_atomic(&self.path, &json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Atomic write: write to a sibling temp file, then rename over the target.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), CorpusError> {
    let write_err = |e| CorpusError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, contents).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> ManifestEntry {
        serde_json::from_str(json).expect("valid record")
    }

    #[test]
    fn slugify_matches_existing_pages() {
        assert_eq!(slugify("Doing a Job"), "doing-a-job");
        assert_eq!(
            slugify("Some Thoughts on the Future of the United States Government by Admiral H. G. Rickover, USN"),
            "some-thoughts-on-the-future-of-the-united-states-government-by-admiral-h-g-rickover-usn"
        );
        assert_eq!(
            slugify("Accounting Practices - Do They Protect the Public"),
            "accounting-practices-do-they-protect-the-public"
        );
        assert_eq!(slugify("  __Energy -- A Diminishing__ "), "energy-a-diminishing");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_truncates() {
        let long = "word ".repeat(60);
        assert_eq!(slugify(&long).chars().count(), 120);
    }

    #[test]
    fn pdf_filename_decodes_plus_and_percent() {
        let e = entry(
            r#"{"file_pdf": "https://bucket.s3.amazonaws.com/Liberty%2C+Science+and+Law.pdf"}"#,
        );
        assert_eq!(e.pdf_filename().as_deref(), Some("Liberty, Science and Law.pdf"));
        assert_eq!(ManifestEntry::default().pdf_filename(), None);
    }

    #[test]
    fn year_number_or_text() {
        let a = entry(r#"{"Title": "A", "Year": 1962}"#);
        let b = entry(r#"{"Title": "B", "Year": "Unknown"}"#);
        assert_eq!(a.year_label(), "1962");
        assert_eq!(b.year_label(), "Unknown");
        assert_eq!(ManifestEntry::default().year_label(), "Unknown");
        assert_eq!(b.year_sort_key(), 0);
    }

    #[test]
    fn defaults_for_missing_fields() {
        let e = ManifestEntry::default();
        assert_eq!(e.title(), "Untitled");
        assert_eq!(e.post_path(), "posts/untitled.html");
        assert!(!e.is_gemini());
        assert!(e.themes().is_empty());
    }

    #[test]
    fn unknown_keys_round_trip() {
        let raw = r#"{"Title":"Doing a Job","Year":1982,"Pages":14,"Notes":{"a":1}}"#;
        let e = entry(raw);
        assert_eq!(e.extra.get("Pages"), Some(&Value::from(14)));
        let back = serde_json::to_value(&e).unwrap();
        assert_eq!(back["Notes"]["a"], Value::from(1));
        assert!(back.get("Summary").is_none(), "absent keys stay absent");
    }

    #[test]
    fn index_order_year_desc_then_title() {
        let entries = vec![
            entry(r#"{"Title": "B", "Year": 1960}"#),
            entry(r#"{"Title": "C", "Year": "Unknown"}"#),
            entry(r#"{"Title": "A", "Year": 1960}"#),
            entry(r#"{"Title": "D", "Year": 1975}"#),
        ];
        let titles: Vec<&str> = sorted_for_index(&entries)
            .iter()
            .map(|e| e.title())
            .collect();
        assert_eq!(titles, vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn load_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"[{"Title": "Rickover and Education", "Year": 1959, "Type": "Speech"}]"#,
        )
        .unwrap();

        let mut m = Manifest::load(&path).unwrap();
        assert_eq!(m.len(), 1);
        m.entries[0].blog_page = Some(m.entries[0].post_path());
        m.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"blog_page\": \"posts/rickover-and-education.html\""));
        assert!(!dir.path().join("manifest.json.tmp").exists());
    }

    #[test]
    fn save_keeps_non_ascii_literal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, r#"[{"Title": "Café — Talk"}]"#).unwrap();
        let m = Manifest::load(&path).unwrap();
        m.save().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Café — Talk"));
    }

    #[test]
    fn load_missing_manifest() {
        let err = Manifest::load("/definitely/not/here/manifest.json").unwrap_err();
        assert!(matches!(err, CorpusError::ManifestNotFound { .. }));
    }

    #[test]
    fn load_rejects_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, r#"{"Title": "not an array"}"#).unwrap();
        assert!(matches!(
            Manifest::load(&path),
            Err(CorpusError::ManifestInvalid { .. })
        ));
    }
}
