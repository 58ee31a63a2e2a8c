//! PDF acquisition: fetch a record's scan from public storage to a local file.
//!
//! pdfium needs a file-system path, so every PDF is written to disk before
//! anything else touches it. The body is streamed rather than buffered; some
//! scans are hundreds of megabytes. A download that fails for any reason
//! leaves no file behind, so a later run never mistakes a truncated body for
//! a cached one.

use crate::error::CorpusError;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Magic bytes every PDF starts with.
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Download `url` to `dest`.
///
/// An existing `dest` is reused as-is. A link that is not `http(s)://` is
/// rejected before any request. Non-2xx responses, timeouts and bodies that
/// do not start with `%PDF` are errors; on any error `dest` is removed.
pub async fn download_pdf(url: &str, dest: &Path, timeout_secs: u64) -> Result<(), CorpusError> {
    if dest.exists() {
        debug!("Reusing downloaded PDF: {}", dest.display());
        return Ok(());
    }
    if !is_url(url) {
        return Err(CorpusError::DownloadFailed {
            url: url.to_string(),
            reason: "not an http(s) URL".to_string(),
        });
    }

    info!("Downloading PDF from: {}", url);
    let result = stream_to_file(url, dest, timeout_secs).await;
    if let Err(ref e) = result {
        warn!("Download of '{}' failed: {}", url, e);
        if tokio::fs::remove_file(dest).await.is_ok() {
            debug!("Removed partial download: {}", dest.display());
        }
    } else {
        info!("Downloaded to: {}", dest.display());
    }
    result
}

async fn stream_to_file(url: &str, dest: &Path, timeout_secs: u64) -> Result<(), CorpusError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CorpusError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?;

    if !response.status().is_success() {
        return Err(CorpusError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(dest, e))?;
    }
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| write_error(dest, e))?;

    let mut head: Vec<u8> = Vec::with_capacity(PDF_MAGIC.len());
    let mut written = 0usize;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| request_error(url, timeout_secs, e))?;
        if head.len() < PDF_MAGIC.len() {
            let need = (PDF_MAGIC.len() - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..need]);
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| write_error(dest, e))?;
        written += chunk.len();
    }
    file.flush().await.map_err(|e| write_error(dest, e))?;
    debug!("Wrote {} bytes to {}", written, dest.display());

    check_magic(&head, dest)
}

/// Verify that `head` starts with the PDF magic bytes.
fn check_magic(head: &[u8], path: &Path) -> Result<(), CorpusError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(CorpusError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

fn request_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> CorpusError {
    if e.is_timeout() {
        CorpusError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        CorpusError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

fn write_error(path: &Path, source: std::io::Error) -> CorpusError {
    CorpusError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}
