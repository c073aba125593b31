use std::io::ErrorKind;
use std::path::Path;

use recollect_core::ParsedConversation;

use crate::error::TranscriptError;
use crate::parse::TranscriptParser;

/// Read a transcript as lines, without terminators.
///
/// A missing file and an unreadable one are reported separately; a file
/// that is not valid UTF-8 counts as unreadable.
pub fn read_transcript(path: &Path) -> Result<Vec<String>, TranscriptError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TranscriptError::SourceMissing {
            path: path.to_path_buf(),
        },
        _ => TranscriptError::SourceUnreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Read and parse `path` into the intermediate document.
///
/// Fails with [`TranscriptError::NoMessages`] when nothing survives parsing,
/// so callers never persist an empty conversation.
pub fn parse_file(
    parser: &TranscriptParser,
    path: &Path,
) -> Result<ParsedConversation, TranscriptError> {
    let lines = read_transcript(path)?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "read transcript");

    let parsed = parser.parse_lines(&lines)?;
    if parsed.messages.is_empty() {
        return Err(TranscriptError::NoMessages {
            path: path.to_path_buf(),
        });
    }

    let source_file = path.display().to_string();
    Ok(parsed.into_document(&source_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use time::macros::datetime;

    #[test]
    fn reads_lines_without_terminators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "Hi there?\r\nThat's fine.\n\nlast").unwrap();
        let lines = read_transcript(&path).unwrap();
        assert_eq!(lines, ["Hi there?", "That's fine.", "", "last"]);
    }

    #[test]
    fn missing_file_is_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_transcript(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, TranscriptError::SourceMissing { .. }));
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        let err = read_transcript(&path).unwrap_err();
        assert!(matches!(err, TranscriptError::SourceUnreadable { .. }));
    }

    #[test]
    fn blank_file_has_no_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "\n   \n\n").unwrap();
        let err = parse_file(&TranscriptParser::default(), &path).unwrap_err();
        assert!(matches!(err, TranscriptError::NoMessages { .. }));
    }

    #[test]
    fn parse_file_fills_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, "Hi, how are you?\nI am fine.\n").unwrap();

        let parser = TranscriptParser::default()
            .with_clock(FixedClock(datetime!(2024-08-01 00:00:00 UTC)));
        let doc = parse_file(&parser, &path).unwrap();

        assert_eq!(doc.conversation_metadata.source_file, path.display().to_string());
        assert_eq!(doc.conversation_metadata.total_messages, 2);
        assert_eq!(doc.conversation_metadata.parsing_timestamp, "2024-08-01T00:00:00Z");
        assert_eq!(doc.messages[1].content, "I am fine.");
    }
}
