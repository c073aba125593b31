//! End-to-end parsing of transcript files on disk.
//!
//! Writes small transcripts into temp directories and checks the document
//! the parser produces: attribution, ordering, determinism, and custom rules.

use std::path::Path;

use recollect_core::Role;
use recollect_transcript::{
    parse_file, FixedClock, ParseOptions, RuleTable, TranscriptError, TranscriptParser,
};
use time::macros::datetime;

fn pinned(drop_system: bool) -> TranscriptParser {
    TranscriptParser::default()
        .with_clock(FixedClock(datetime!(2024-08-01 00:00:00 UTC)))
        .with_options(ParseOptions {
            base_time: Some(datetime!(2024-06-01 09:00:00 UTC)),
            drop_system,
            ..ParseOptions::default()
        })
}

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

const CONVERSATION: &str = "\u{feff}Hi, how are you?
I am doing well, thank you. How can I help?

Google Search
Can you explain loops?
That's a good question.
   A loop repeats a block of code.
* for loops iterate over a range
* while loops run until a condition fails

Same loop?
No, thanks.
";

#[test]
fn conversation_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "chat.txt", CONVERSATION);

    let doc = parse_file(&pinned(false), &path).unwrap();
    let roles: Vec<Role> = doc.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [
            Role::User,
            Role::Assistant,
            Role::System,
            Role::User,
            Role::Assistant,
            Role::System,
            Role::User,
        ]
    );

    assert_eq!(doc.messages[0].content, "Hi, how are you?");
    assert_eq!(
        doc.messages[4].content,
        "That's a good question. A loop repeats a block of code. \
         * for loops iterate over a range * while loops run until a condition fails"
    );
    assert_eq!(doc.messages[4].metadata["line_start"], 6);
    assert_eq!(doc.messages[4].metadata["line_end"], 9);

    let meta = &doc.conversation_metadata;
    assert_eq!(meta.total_messages, 7);
    assert_eq!(meta.user_messages, 3);
    assert_eq!(meta.assistant_messages, 2);
    assert_eq!(meta.system_messages, 2);
}

#[test]
fn dropping_system_removes_filler_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "chat.txt", CONVERSATION);

    let doc = parse_file(&pinned(true), &path).unwrap();
    assert_eq!(doc.messages.len(), 5);
    assert!(doc.messages.iter().all(|m| m.role != Role::System));
    assert_eq!(doc.conversation_metadata.system_messages, 0);
    assert_eq!(doc.messages[4].timestamp, "2024-06-01T09:08:00Z");
}

#[test]
fn reparse_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "chat.txt", CONVERSATION);

    let a = serde_json::to_string_pretty(&parse_file(&pinned(false), &path).unwrap()).unwrap();
    let b = serde_json::to_string_pretty(&parse_file(&pinned(false), &path).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn timestamps_strictly_increase() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "chat.txt", CONVERSATION);

    let doc = parse_file(&pinned(false), &path).unwrap();
    let stamps: Vec<time::OffsetDateTime> = doc
        .messages
        .iter()
        .map(|m| {
            time::OffsetDateTime::parse(&m.timestamp, &time::format_description::well_known::Rfc3339)
                .unwrap()
        })
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn line_number_prefixes_are_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "numbered.txt",
        "1→Hi there, anyone home?\n2→That is a fair question.\n",
    );

    let doc = parse_file(&pinned(false), &path).unwrap();
    assert_eq!(doc.messages.len(), 1);
    assert_eq!(doc.messages[0].content, "Hi there, anyone home? 2→That is a fair question.");
}

#[test]
fn custom_rules_file_changes_attribution() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(
        dir.path(),
        "rules.json",
        r#"{
            "fallback": "user",
            "rules": [
                { "name": "bot", "kind": "prefix", "values": ["BOT:"], "role": "assistant" },
                { "name": "me", "kind": "prefix", "values": ["ME:"], "role": "user" }
            ]
        }"#,
    );
    let transcript = write(
        dir.path(),
        "chat.txt",
        "ME: hello\nBOT: hi\nstill the bot\nME: bye\n",
    );

    let parser = TranscriptParser::new(RuleTable::load(&rules).unwrap())
        .with_clock(FixedClock(datetime!(2024-08-01 00:00:00 UTC)));
    let doc = parse_file(&parser, &transcript).unwrap();
    let roles: Vec<Role> = doc.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::User]);
    assert_eq!(doc.messages[1].content, "BOT: hi still the bot");
}

#[test]
fn missing_transcript_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = parse_file(&pinned(false), &path).unwrap_err();
    assert!(matches!(err, TranscriptError::SourceMissing { .. }));
    assert!(err.to_string().contains("absent.txt"));
}
