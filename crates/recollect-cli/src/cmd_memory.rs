use std::path::Path;

use anyhow::Context;
use recollect_core::memory::{MemoryDocument, MemoryKind};
use recollect_core::rfc3339;
use recollect_store::RecollectPaths;
use time::OffsetDateTime;

pub struct MemoryParams<'a> {
    pub repo_root: &'a Path,
    pub file: &'a Path,
    pub title: &'a str,
    pub kind: &'a str,
    pub tags: &'a [String],
    pub out_dir: Option<&'a Path>,
}

fn parse_kind(s: &str) -> anyhow::Result<MemoryKind> {
    match s.trim().to_ascii_lowercase().as_str() {
        "axiom" => Ok(MemoryKind::Axiom),
        "knowledge" => Ok(MemoryKind::Knowledge),
        "experience" => Ok(MemoryKind::Experience),
        "conversation" => Ok(MemoryKind::Conversation),
        other => anyhow::bail!(
            "unknown memory type '{other}' (expected axiom, knowledge, experience, or conversation)"
        ),
    }
}

/// `recollect memory <file> --title <title>`
pub fn execute(params: MemoryParams<'_>) -> anyhow::Result<()> {
    let kind = parse_kind(params.kind)?;
    if params.title.trim().is_empty() {
        anyhow::bail!("memory title must not be empty");
    }
    let content = std::fs::read_to_string(params.file)
        .with_context(|| format!("failed to read {}", params.file.display()))?;
    if content.trim().is_empty() {
        anyhow::bail!("{} is empty", params.file.display());
    }

    let doc = MemoryDocument::manual(
        kind,
        &content,
        params.tags,
        rfc3339(OffsetDateTime::now_utc())?,
    );
    let default_dir = RecollectPaths::discover(params.repo_root).memory_dir;
    let dir = params.out_dir.unwrap_or(&default_dir);
    let path = recollect_store::write_memory(dir, params.title, &doc)?;
    println!("Created {}", path.display());
    Ok(())
}
