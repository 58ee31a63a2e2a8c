//! `generate`: placeholder posts for every record.

use super::{write_index, Run};
use crate::config::PipelineConfig;
use crate::error::CorpusError;
use crate::manifest::{write_atomic, Manifest};
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::site::{placeholder_body, render_post, IndexStyle};
use tracing::{debug, info};

/// Write a post with the placeholder body for every record, then the index.
///
/// Existing posts are overwritten. Every record's `blog_page` is pointed at
/// its post and the manifest is saved.
pub fn generate_pages(config: &PipelineConfig) -> Result<RunReport, CorpusError> {
    let ws = &config.workspace;
    ws.ensure_dirs()?;
    let mut manifest = Manifest::load(&ws.manifest_path)?;
    info!("Generating {} posts", manifest.len());

    let mut run = Run::new(config, "generate", manifest.len());
    for (i, entry) in manifest.entries.iter_mut().enumerate() {
        run.start(i + 1, entry.title());
        let path = ws.posts_dir.join(format!("{}.html", entry.slug()));
        let html = render_post(entry, &placeholder_body(entry), &config.site);
        write_atomic(&path, &html)?;
        debug!("Wrote {}", path.display());
        entry.blog_page = Some(entry.post_path());
        run.record(i + 1, DocumentOutcome::new(entry.title(), DocumentStatus::Processed));
    }

    write_index(config, &manifest.entries, IndexStyle::Archive)?;
    manifest.save()?;
    Ok(run.finish())
}
