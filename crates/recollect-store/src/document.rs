use recollect_core::memory::{memory_file_name, MemoryDocument};
use recollect_core::{Message, ParsedConversation};
use std::path::{Path, PathBuf};

use crate::write_atomic;

/// Write the intermediate document as pretty JSON.
pub fn save_conversation(path: &Path, doc: &ParsedConversation) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(doc)?;
    write_atomic(path, json.as_bytes())?;
    tracing::debug!(
        path = %path.display(),
        messages = doc.messages.len(),
        "saved parsed conversation"
    );
    Ok(())
}

/// Load a document previously written by [`save_conversation`].
pub fn load_conversation(path: &Path) -> anyhow::Result<ParsedConversation> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("parsed conversation not found: {}", path.display())
        } else {
            anyhow::anyhow!("failed to read {}: {e}", path.display())
        }
    })?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("malformed parsed conversation {}: {e}", path.display()))
}

/// Write messages as NDJSON, one message object per line.
pub fn write_ndjson(path: &Path, messages: &[Message]) -> anyhow::Result<()> {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&serde_json::to_string(msg)?);
        out.push('\n');
    }
    write_atomic(path, out.as_bytes())
}

/// Write a memory document into `dir`, named after `title`.
pub fn write_memory(dir: &Path, title: &str, doc: &MemoryDocument) -> anyhow::Result<PathBuf> {
    let path = dir.join(memory_file_name(title));
    let json = serde_json::to_string_pretty(doc)?;
    write_atomic(&path, json.as_bytes())?;
    Ok(path)
}
