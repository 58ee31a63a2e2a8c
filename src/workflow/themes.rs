//! `themes`: assign theme tags to hosted-extraction records.

use super::{read_page, write_index, write_page, Run};
use crate::config::PipelineConfig;
use crate::error::{CorpusError, DocumentError};
use crate::manifest::{Manifest, ManifestEntry};
use crate::output::{DocumentOutcome, DocumentStatus, RunReport};
use crate::site::{retag, themes_for, IndexStyle};
use tracing::{debug, info, warn};

/// Tag every `gemini` record with themes from its title and rebuild the index.
///
/// Records whose title matches no theme keyword keep their current tags. The
/// manifest is always saved and the themed index regenerated, even when no
/// record changed.
pub fn apply_themes(config: &PipelineConfig) -> Result<RunReport, CorpusError> {
    let mut manifest = Manifest::load(&config.workspace.manifest_path)?;
    let total = manifest.entries.iter().filter(|e| e.is_gemini()).count();
    info!("Assigning themes to {} records", total);

    let mut run = Run::new(config, "themes", total);
    let hosted = manifest.entries.iter_mut().filter(|e| e.is_gemini());
    for (n, entry) in hosted.enumerate() {
        let index = n + 1;
        run.start(index, entry.title());
        let outcome = theme_record(config, entry);
        run.record(index, outcome);
    }

    manifest.save()?;
    write_index(config, &manifest.entries, IndexStyle::Themed)?;
    Ok(run.finish())
}

fn theme_record(config: &PipelineConfig, entry: &mut ManifestEntry) -> DocumentOutcome {
    let title = entry.title().to_string();
    let themes = themes_for(&title);
    if themes.is_empty() {
        warn!("No themes match '{}'", title);
        return DocumentOutcome::new(
            title,
            DocumentStatus::Skipped {
                reason: "no themes".to_string(),
            },
        );
    }
    debug!("{}: {}", title, themes.join(", "));
    entry.themes = Some(themes);

    if entry.blog_page().is_empty() {
        return DocumentOutcome::new(title, DocumentStatus::Processed);
    }
    let label = entry.blog_page().trim_start_matches('/').to_string();
    let path = config.workspace.page_path(entry.blog_page());
    if !path.exists() {
        debug!("{} not generated yet", label);
        return DocumentOutcome::new(title, DocumentStatus::Processed);
    }

    let retagged = read_page(&path, &label).and_then(|page| {
        let updated = retag(&page, &entry.year_label(), entry.themes());
        if updated != page {
            write_page(&path, &label, &updated)?;
        }
        Ok::<_, DocumentError>(())
    });
    match retagged {
        Ok(()) => DocumentOutcome::new(title, DocumentStatus::Processed),
        Err(e) => DocumentOutcome::failed(title, e),
    }
}
