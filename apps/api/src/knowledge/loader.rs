use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::extraction::{extract_text, DocumentKind};
use crate::knowledge::{ChunkSource, KnowledgeBase};
use crate::models::profile::Profile;
use crate::store::ResumeBlob;

pub const PROFILE_ORIGIN: &str = "profile";

/// Replaces the profile chunks with the profile's current facts.
pub fn index_profile(kb: &mut KnowledgeBase, profile: &Profile) -> usize {
    kb.replace_source(ChunkSource::Profile, PROFILE_ORIGIN, &profile.facts())
}

/// Replaces the résumé chunks with the stored résumé text.
pub fn index_resume(kb: &mut KnowledgeBase, resume: &ResumeBlob) -> usize {
    if resume.text.trim().is_empty() {
        warn!("Stored résumé {} has no extracted text", resume.file.file_name);
        kb.remove_source(ChunkSource::Resume);
        return 0;
    }
    kb.replace_source(ChunkSource::Resume, &resume.file.file_name, &resume.text)
}

/// Indexes every supported file in `dir` as `ChunkSource::Document`.
///
/// Unsupported files are ignored; unreadable ones are logged and skipped.
/// Returns the number of files indexed.
pub fn index_directory(kb: &mut KnowledgeBase, dir: &Path) -> Result<usize> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read knowledge directory {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    let mut indexed = 0;
    for path in entries {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if DocumentKind::from_file_name(&file_name).is_err() {
            continue;
        }

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };

        match extract_text(&file_name, &bytes) {
            Ok(extracted) => {
                let chunks = kb.add_text(ChunkSource::Document, &file_name, &extracted.text);
                info!("Indexed {file_name}: {} words, {chunks} chunks", extracted.word_count);
                indexed += 1;
            }
            Err(e) => warn!("Skipping {file_name}: {e}"),
        }
    }

    Ok(indexed)
}
