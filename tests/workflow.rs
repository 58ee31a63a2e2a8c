//! Integration tests for the workflow commands.
//!
//! Every test builds a throwaway site in a temp directory and runs commands
//! against it. Nothing here needs the network or tesseract: records either
//! have no PDF, point at a closed local port, already have a text cache, or
//! are served by a local `wiremock` server. LLM calls go to edgequake-llm's
//! `MockProvider`. The one test that renders pages skips itself when pdfium
//! cannot be loaded.
//!
//! Run with:
//!   cargo test --test workflow -- --nocapture

use corpus_press::pipeline::render::bind_pdfium;
use corpus_press::site::{extract_ocr_body, render_post};
use corpus_press::{
    apply_themes, clean_posts, clean_summaries, generate_pages, polish_posts,
    run_hosted_extraction, run_ocr_pipeline, CorpusError, DocumentError, DocumentStatus, Manifest,
    ManifestEntry, OcrBackend, PipelineConfig, RecordSelection, RetryPolicy, SiteConfig,
};
use edgequake_llm::{LLMProvider, MockProvider};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("corpus_press=debug"))
        .with_test_writer()
        .try_init();
}

/// A site root containing `manifest.json` with the given records.
fn site(manifest_json: &str) -> TempDir {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("manifest.json"), manifest_json).expect("write manifest");
    dir
}

fn config(root: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .root(root)
        .request_pause_ms(0)
        .download_timeout_secs(2)
        .build()
        .expect("valid config")
}

fn load(root: &Path) -> Vec<ManifestEntry> {
    Manifest::load(root.join("manifest.json"))
        .expect("manifest reloads")
        .entries
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).expect("file exists")
}

fn card_count(index: &str) -> usize {
    index.matches("data-title=\"").count()
}

/// Write a post for `entry` with `body`, as a previous run would have.
fn write_post(root: &Path, entry_json: &str, body: &str) -> String {
    let entry: ManifestEntry = serde_json::from_str(entry_json).expect("entry json");
    let path = root.join(entry.post_path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, render_post(&entry, body, &SiteConfig::default())).unwrap();
    entry.post_path()
}

/// A provider that answers every request from `replies`, in turn.
async fn stub_llm(replies: &[&str]) -> Arc<dyn LLMProvider> {
    let mock = MockProvider::new();
    for reply in replies {
        mock.add_response(*reply).await;
    }
    Arc::new(mock)
}

fn llm_config(root: &Path, provider: Arc<dyn LLMProvider>) -> PipelineConfig {
    PipelineConfig::builder()
        .root(root)
        .request_pause_ms(0)
        .download_timeout_secs(2)
        .retry(RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 0,
        })
        .provider(provider)
        .build()
        .expect("valid config")
}

/// A well-formed PDF with one blank letter-size page.
fn one_page_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> >>",
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

/// Serve `one_page_pdf()` for every `GET /scans/*.pdf`.
async fn scan_server() -> MockServer {
    let server = MockServer::start().await;
    for name in ["doing-a-job.pdf", "hand-written.pdf"] {
        Mock::given(method("GET"))
            .and(path(format!("/scans/{name}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(one_page_pdf()),
            )
            .mount(&server)
            .await;
    }
    server
}

fn pdfium_available() -> bool {
    match bind_pdfium() {
        Ok(_) => true,
        Err(e) => {
            eprintln!("Skipping: {e}");
            false
        }
    }
}

const THREE_RECORDS: &str = r###"[
  {"Title": "Doing a Job", "Year": 1982, "Type": "Speech",
   "Summary": "A **classic** talk on responsibility.",
   "file_pdf": "https://storage.example.org/rickover/Doing+a+Job.pdf"},
  {"Year": "n.d.", "Type": "Memo", "Summary": "Unsigned."},
  {"Title": "The Role of the Critic", "Year": 1964, "Type": "Speech",
   "Summary": "## Critics\nOn critics.", "custom": {"kept": true}}
]"###;

// ── generate ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_writes_posts_index_and_manifest() {
    let dir = site(THREE_RECORDS);
    let report = generate_pages(&config(dir.path())).expect("generate succeeds");

    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.processed, 3);

    let posts = dir.path().join("posts");
    assert!(posts.join("doing-a-job.html").exists());
    assert!(posts.join("untitled.html").exists());
    assert!(posts.join("the-role-of-the-critic.html").exists());

    let page = read(posts.join("doing-a-job.html"));
    let body = extract_ocr_body(&page).expect("post has an ocr block");
    assert!(body.contains("Full OCR text will be available"));

    let index = read(dir.path().join("blog.html"));
    assert_eq!(card_count(&index), 3);
    // Newest first; the undated record sorts last.
    let doing = index.find("data-title=\"Doing a Job\"").unwrap();
    let critic = index.find("data-title=\"The Role of the Critic\"").unwrap();
    let untitled = index.find("data-title=\"Untitled\"").unwrap();
    assert!(doing < critic && critic < untitled);

    let entries = load(dir.path());
    assert_eq!(entries[0].blog_page(), "posts/doing-a-job.html");
    assert_eq!(entries[1].blog_page(), "posts/untitled.html");
    assert!(
        entries[2].extra.contains_key("custom"),
        "unknown keys survive a save"
    );
}

#[tokio::test]
async fn test_generate_with_empty_manifest() {
    let dir = site("[]");
    let report = generate_pages(&config(dir.path())).expect("generate succeeds");

    assert_eq!(report.stats.total, 0);
    let index = read(dir.path().join("blog.html"));
    assert_eq!(card_count(&index), 0);
    assert_eq!(read(dir.path().join("manifest.json")).trim(), "[]");
}

#[tokio::test]
async fn test_missing_manifest_is_fatal() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let err = generate_pages(&config(dir.path())).unwrap_err();
    assert!(matches!(err, CorpusError::ManifestNotFound { .. }), "got {err:?}");
}

// ── clean-posts ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clean_posts_retitles_and_scrubs_bodies() {
    let dir = site("[]");
    write_post(
        dir.path(),
        r#"{"Title": "DOING A JOB", "Year": 1982}"#,
        "<p>12</p>\n<p>THE MAN WHO DOES THE WORK IS RESPONSIBLE, ISN'T HE?</p>\n<p>Keep <br><br><br><br>going</p>",
    );
    write_post(
        dir.path(),
        r#"{"Title": "Placeholder Only"}"#,
        "<p class='text-gray-500 italic'>Full OCR text will be available after running the pipeline.</p>",
    );

    let report = clean_posts(&config(dir.path())).expect("clean succeeds");
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.unchanged, 1);

    let page = read(dir.path().join("posts/doing-a-job.html"));
    assert!(page.contains("<title>Doing a Job — The Rickover Corpus</title>"));
    assert!(page.contains(">Doing a Job</h1>"));
    let body = extract_ocr_body(&page).unwrap();
    assert!(!body.contains("<p>12</p>"), "page number dropped: {body}");
    assert!(body.contains("<p>The man who does the work is responsible, isn't he?</p>"));

    // A second pass finds nothing left to do.
    let again = clean_posts(&config(dir.path())).expect("clean succeeds");
    assert_eq!(again.stats.processed, 0);
    assert_eq!(again.stats.unchanged, 2);
}

#[tokio::test]
async fn test_clean_posts_reports_page_without_body_block() {
    let dir = site("[]");
    let posts = dir.path().join("posts");
    std::fs::create_dir_all(&posts).unwrap();
    let original = "<html><title>HAND WRITTEN</title><p>No anchor here.</p></html>";
    std::fs::write(posts.join("hand-written.html"), original).unwrap();

    let report = clean_posts(&config(dir.path())).expect("clean succeeds");
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.errors().next(),
        Some(DocumentError::MissingBody { page }) if page == "posts/hand-written.html"
    ));
    assert_eq!(read(posts.join("hand-written.html")), original);
}

// ── clean-summaries ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clean_summaries_updates_manifest_and_posts() {
    let dir = site(THREE_RECORDS);
    generate_pages(&config(dir.path())).expect("generate succeeds");

    let report = clean_summaries(&config(dir.path())).expect("clean succeeds");
    // 3 manifest records + 3 posts.
    assert_eq!(report.stats.total, 6);

    let entries = load(dir.path());
    assert_eq!(entries[0].summary(), "A classic talk on responsibility.");
    assert_eq!(entries[1].summary(), "Unsigned.");
    assert!(!entries[2].summary().contains("##"));

    let page = read(dir.path().join("posts/doing-a-job.html"));
    assert!(page.contains("content=\"A classic talk on responsibility.\""));
    assert!(!page.contains("**classic**"));

    let again = clean_summaries(&config(dir.path())).expect("clean succeeds");
    assert_eq!(again.stats.processed, 0);
}

// ── themes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_themes_tags_hosted_records_and_rebuilds_index() {
    let dir = site(
        r#"[
  {"Title": "Doing a Job", "Year": 1982, "gemini": true, "blog_page": "posts/doing-a-job.html",
   "file_OCR": "https://storage.example.org/doing-a-job.txt"},
  {"Title": "A Letter Nobody Tagged", "Year": 1970, "gemini": true,
   "blog_page": "posts/a-letter-nobody-tagged.html"},
  {"Title": "Liberty, Science, and Law", "Year": 1969, "blog_page": "posts/liberty-science-and-law.html"}
]"#,
    );
    write_post(
        dir.path(),
        r#"{"Title": "Doing a Job", "Year": 1982, "Type": "Speech",
            "file_OCR": "https://storage.example.org/doing-a-job.txt"}"#,
        "<p>Text.</p>",
    );

    let report = apply_themes(&config(dir.path())).expect("themes succeeds");
    assert_eq!(report.stats.total, 2, "only hosted-extraction records");
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.skipped_other, 1);

    let entries = load(dir.path());
    assert_eq!(entries[0].themes(), ["Management", "Leadership"]);
    assert!(entries[1].themes().is_empty());
    assert!(entries[2].themes().is_empty(), "non-hosted records untouched");

    let page = read(dir.path().join("posts/doing-a-job.html"));
    assert!(page.contains(">Management</span>"));
    assert!(!page.contains("View Original TXT"));
    assert!(!page.contains(">Speech</span>"));

    let index = read(dir.path().join("blog.html"));
    assert_eq!(card_count(&index), 2);
    assert!(index.contains("data-themes=\"Management,Leadership\""));
}

// ── ocr ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ocr_skips_filters_and_keeps_failed_pages() {
    let dir = site(
        r#"[
  {"Title": "A Memo", "Type": "Memo", "file_pdf": "http://127.0.0.1:9/a-memo.pdf",
   "blog_page": "posts/old-memo.html"},
  {"Title": "No Scan Yet", "Type": "Speech"},
  {"Title": "Unreachable", "Type": "Speech", "file_pdf": "http://127.0.0.1:9/unreachable.pdf",
   "blog_page": "posts/unreachable.html"}
]"#,
    );
    let config = PipelineConfig::builder()
        .root(dir.path())
        .types(["Speech"])
        .download_timeout_secs(2)
        .build()
        .unwrap();

    let report = run_ocr_pipeline(&config, OcrBackend::Local)
        .await
        .expect("run completes");
    assert_eq!(report.stats.skipped_type, 1);
    assert_eq!(report.stats.skipped_other, 1);
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.documents[2].error,
        Some(DocumentError::DownloadFailed { .. })
    ));

    let entries = load(dir.path());
    assert_eq!(entries[0].blog_page(), "posts/old-memo.html");
    assert_eq!(entries[1].blog_page.as_deref(), Some(""));
    assert_eq!(entries[2].blog_page(), "posts/unreachable.html");
    assert_eq!(card_count(&read(dir.path().join("blog.html"))), 3);
}

#[tokio::test]
async fn test_ocr_rebuilds_post_from_text_cache() {
    let record = r#"{"Title": "Doing a Job", "Year": 1982, "Type": "Speech",
        "file_pdf": "http://127.0.0.1:9/Doing+a+Job.pdf"}"#;
    let dir = site(&format!("[{record}]"));
    write_post(dir.path(), record, "<p>stale</p>");
    let ocr_dir = dir.path().join("ocr_output");
    std::fs::create_dir_all(&ocr_dir).unwrap();
    std::fs::write(
        ocr_dir.join("Doing a Job.txt"),
        "First page text\n\n--- Page Break ---\n\nSecond page & more",
    )
    .unwrap();

    let report = run_ocr_pipeline(&config(dir.path()), OcrBackend::Local)
        .await
        .expect("run completes");
    assert_eq!(report.stats.skipped_existing, 1);
    assert_eq!(report.documents[0].status, DocumentStatus::Reused);

    let body = extract_ocr_body(&read(dir.path().join("posts/doing-a-job.html"))).unwrap();
    assert_eq!(
        body,
        "<p>First page text</p>\n<p>Second page &amp; more</p>"
    );
    assert_eq!(load(dir.path())[0].blog_page(), "posts/doing-a-job.html");
    assert!(ocr_dir.join("Doing a Job.txt").exists(), "text caches are kept");
}

// ── extract ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_updates_posts_and_marks_records() {
    if !pdfium_available() {
        return;
    }
    let server = scan_server().await;
    let dir = site(&format!(
        r#"[
  {{"Title": "Doing a Job", "Year": 1982, "file_pdf": "{0}/scans/doing-a-job.pdf",
   "blog_page": "posts/doing-a-job.html"}},
  {{"Title": "Hand Written", "Year": 1970, "file_pdf": "{0}/scans/hand-written.pdf",
   "blog_page": "posts/hand-written.html"}}
]"#,
        server.uri()
    ));
    write_post(dir.path(), r#"{"Title": "Doing a Job", "Year": 1982}"#, "<p>old</p>");
    let hand_written = "<html><p>No anchor here.</p></html>";
    std::fs::write(dir.path().join("posts/hand-written.html"), hand_written).unwrap();

    let reply = "```html\n<p>The man who does the work is responsible.</p>\n```";
    let provider = stub_llm(&[reply, reply]).await;
    let report = run_hosted_extraction(&llm_config(dir.path(), provider))
        .await
        .expect("run completes");

    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.documents[1].error,
        Some(DocumentError::MissingBody { ref page }) if page == "posts/hand-written.html"
    ));

    let body = extract_ocr_body(&read(dir.path().join("posts/doing-a-job.html"))).unwrap();
    assert_eq!(body, "<p>The man who does the work is responsible.</p>");
    assert_eq!(read(dir.path().join("posts/hand-written.html")), hand_written);

    let entries = load(dir.path());
    assert!(entries[0].is_gemini());
    assert_eq!(entries[0].blog_page(), "posts/doing-a-job.html");
    assert!(!entries[1].is_gemini());
    assert_eq!(entries[1].blog_page(), "posts/hand-written.html");
}

#[tokio::test]
async fn test_extract_counts_blank_reply_as_failure() {
    if !pdfium_available() {
        return;
    }
    let server = scan_server().await;
    let manifest = format!(
        r#"[{{"Title": "Doing a Job", "file_pdf": "{}/scans/doing-a-job.pdf",
   "blog_page": "posts/doing-a-job.html"}}]"#,
        server.uri()
    );
    let dir = site(&manifest);
    write_post(dir.path(), r#"{"Title": "Doing a Job"}"#, "<p>old</p>");

    let report = run_hosted_extraction(&llm_config(dir.path(), stub_llm(&["   "]).await))
        .await
        .expect("run completes");

    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.documents[0].error,
        Some(DocumentError::ExtractionFailed { .. })
    ));
    let body = extract_ocr_body(&read(dir.path().join("posts/doing-a-job.html"))).unwrap();
    assert_eq!(body, "<p>old</p>");
    assert_eq!(read(dir.path().join("manifest.json")), manifest, "manifest not rewritten");
}

#[tokio::test]
async fn test_extract_keeps_going_after_a_failed_download() {
    let manifest = r#"[
  {"Title": "Unreachable", "file_pdf": "http://127.0.0.1:9/unreachable.pdf",
   "blog_page": "posts/unreachable.html"},
  {"Title": "No Page Yet", "file_pdf": "http://127.0.0.1:9/no-page.pdf"}
]"#;
    let dir = site(manifest);
    write_post(dir.path(), r#"{"Title": "Unreachable"}"#, "<p>old</p>");

    let report = run_hosted_extraction(&llm_config(dir.path(), stub_llm(&[]).await))
        .await
        .expect("run completes");

    assert_eq!(report.stats.total, 1, "only records with a PDF and a page");
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.documents[0].error,
        Some(DocumentError::DownloadFailed { .. })
    ));
    assert_eq!(read(dir.path().join("manifest.json")), manifest);
}

#[tokio::test]
async fn test_extract_rejects_index_past_the_end() {
    let dir = site(
        r#"[{"Title": "Doing a Job", "file_pdf": "http://127.0.0.1:9/a.pdf",
   "blog_page": "posts/doing-a-job.html"}]"#,
    );
    let config = PipelineConfig::builder()
        .root(dir.path())
        .provider(stub_llm(&[]).await)
        .selection(RecordSelection::Indices(vec![1]))
        .build()
        .unwrap();

    let err = run_hosted_extraction(&config).await.unwrap_err();
    assert!(
        matches!(err, CorpusError::RecordOutOfRange { index: 1, total: 1 }),
        "got {err:?}"
    );
}

// ── polish ───────────────────────────────────────────────────────────────────

/// Two hosted records with long bodies and one with a stub body.
fn polish_site() -> TempDir {
    let dir = site(
        r#"[
  {"Title": "Doing a Job", "Year": 1982, "gemini": true, "blog_page": "posts/doing-a-job.html"},
  {"Title": "Stub", "Year": 1980, "gemini": true, "blog_page": "posts/stub.html"},
  {"Title": "Not Hosted", "Year": 1979, "blog_page": "posts/not-hosted.html"}
]"#,
    );
    write_post(dir.path(), r#"{"Title": "Doing a Job", "Year": 1982}"#, LONG_BODY);
    write_post(dir.path(), r#"{"Title": "Stub", "Year": 1980}"#, "<p>Too short.</p>");
    dir
}

const LONG_BODY: &str = "<p>12</p>\n<p>Human experience shows that people, not organizations or \
management systems, get things done. For this reason, subordinates must be given authority \
and responsibility early in their careers.</p>";

#[tokio::test]
async fn test_polish_replaces_body_with_accepted_reply() {
    let dir = polish_site();
    let polished = "<p>Human experience shows that people, not organizations or management \
systems, get things done. For this reason, subordinates must be given authority and \
responsibility early in their careers.</p>";
    let provider = stub_llm(&[&format!("```html\n{polished}\n```")]).await;

    let report = polish_posts(&llm_config(dir.path(), provider))
        .await
        .expect("run completes");

    assert_eq!(report.stats.total, 2, "only hosted-extraction records");
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.skipped_other, 1);
    assert_eq!(
        report.documents[1].status,
        DocumentStatus::Skipped {
            reason: "no OCR content".into()
        }
    );

    let body = extract_ocr_body(&read(dir.path().join("posts/doing-a-job.html"))).unwrap();
    assert_eq!(body, polished);
    let stub = extract_ocr_body(&read(dir.path().join("posts/stub.html"))).unwrap();
    assert_eq!(stub, "<p>Too short.</p>");
}

#[tokio::test]
async fn test_polish_keeps_original_when_reply_is_too_short() {
    let dir = polish_site();
    let before = read(dir.path().join("posts/doing-a-job.html"));
    let provider = stub_llm(&["<p>People get things done.</p>"]).await;

    let report = polish_posts(&llm_config(dir.path(), provider))
        .await
        .expect("run completes");

    assert_eq!(report.stats.processed, 0);
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.documents[0].error,
        Some(DocumentError::CleanupRejected { .. })
    ));
    assert_eq!(read(dir.path().join("posts/doing-a-job.html")), before);
}

#[tokio::test]
async fn test_polish_selection_indexes_hosted_records() {
    let dir = polish_site();
    let config = PipelineConfig::builder()
        .root(dir.path())
        .request_pause_ms(0)
        .provider(stub_llm(&[]).await)
        .selection(RecordSelection::Indices(vec![1]))
        .build()
        .unwrap();

    let report = polish_posts(&config).await.expect("run completes");
    assert_eq!(report.stats.total, 1);
    assert_eq!(report.documents[0].title, "Stub");
    assert_eq!(report.stats.skipped_other, 1);

    let out_of_range = PipelineConfig::builder()
        .root(dir.path())
        .provider(stub_llm(&[]).await)
        .selection(RecordSelection::Indices(vec![2]))
        .build()
        .unwrap();
    let err = polish_posts(&out_of_range).await.unwrap_err();
    assert!(matches!(err, CorpusError::RecordOutOfRange { index: 2, total: 2 }));
}
