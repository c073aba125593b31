use std::path::PathBuf;

/// Errors surfaced while loading or parsing a transcript.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    /// Source file does not exist.
    #[error("Transcript not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    /// Source file exists but could not be read as UTF-8 text.
    #[error("Failed to read transcript {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source was read but no speaker turn survived cleaning.
    #[error("No messages were parsed from {}", path.display())]
    NoMessages { path: PathBuf },

    /// A rule in a rules file could not be compiled.
    #[error("Invalid rule '{name}': {detail}")]
    InvalidRule { name: String, detail: String },

    /// A rules file could not be read or decoded.
    #[error("Failed to load rules from {}: {detail}", path.display())]
    RulesFile { path: PathBuf, detail: String },

    /// The synthetic timeline ran past the representable date range.
    #[error("Timestamp for message {sequence} is out of range")]
    TimestampOutOfRange { sequence: usize },

    #[error("Failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}
