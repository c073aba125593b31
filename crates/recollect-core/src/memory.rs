use serde::{Deserialize, Serialize};

/// Kind of a standalone memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Axiom,
    Knowledge,
    Experience,
    Conversation,
}

/// A knowledge document wrapped for the memory store's `memories` import slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub content: String,
    pub tags: Vec<String>,
    pub source: String,
    pub timestamp: String,
}

impl MemoryDocument {
    pub fn manual(kind: MemoryKind, content: &str, tags: &[String], timestamp: String) -> Self {
        Self {
            kind,
            content: content.trim().to_string(),
            tags: tags.to_vec(),
            source: "manual".to_string(),
            timestamp,
        }
    }
}

/// File name for a memory titled `title`: spaces and path separators become
/// underscores, colons are dropped, everything lowercased. The result never
/// names a parent or nested directory.
pub fn memory_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .filter(|c| *c != ':')
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{}.json", stem.to_lowercase())
}
