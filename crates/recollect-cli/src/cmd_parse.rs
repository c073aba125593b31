use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use recollect_core::hash::digest_ids;
use recollect_core::{ParsedConversation, Role};
use recollect_store::RecollectPaths;
use recollect_transcript::{parse_file, preview, ParseOptions, RuleTable, TranscriptParser};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const PREVIEW_COUNT: usize = 3;
const PREVIEW_BYTES: usize = 100;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Transcript text file
    pub transcript: PathBuf,
    /// Output path (default: ./parsed_conversation.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Timestamp of the first message, RFC 3339 (default: 30 days ago)
    #[arg(long)]
    pub base_time: Option<String>,
    /// Leave system filler lines out of the document
    #[arg(long)]
    pub drop_system: bool,
    /// JSON rules file replacing the built-in attribution rules
    #[arg(long)]
    pub rules: Option<PathBuf>,
    /// Also write the messages as NDJSON to this path
    #[arg(long)]
    pub ndjson: Option<PathBuf>,
}

fn parse_base_time(s: &str) -> anyhow::Result<OffsetDateTime> {
    OffsetDateTime::parse(s.trim(), &Rfc3339)
        .with_context(|| format!("invalid --base-time '{s}' (expected RFC 3339)"))
}

fn build_parser(args: &ParseArgs) -> anyhow::Result<TranscriptParser> {
    let rules = match &args.rules {
        Some(path) => RuleTable::load(path)?,
        None => RuleTable::default(),
    };
    let base_time = args.base_time.as_deref().map(parse_base_time).transpose()?;
    Ok(TranscriptParser::new(rules).with_options(ParseOptions {
        base_time,
        drop_system: args.drop_system,
        ..ParseOptions::default()
    }))
}

/// Parse `args.transcript` and persist the document. Nothing is written when
/// parsing fails; the NDJSON export goes first so a failed export leaves no
/// document behind.
pub(crate) fn parse_and_save(
    repo_root: &Path,
    args: &ParseArgs,
) -> anyhow::Result<(ParsedConversation, PathBuf)> {
    let parser = build_parser(args)?;
    let doc = parse_file(&parser, &args.transcript)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| RecollectPaths::discover(repo_root).parsed_json);
    if let Some(ndjson) = &args.ndjson {
        recollect_store::write_ndjson(ndjson, &doc.messages)?;
        println!("Wrote {} messages to {}", doc.messages.len(), ndjson.display());
    }
    recollect_store::save_conversation(&output, &doc)?;
    Ok((doc, output))
}

fn print_summary(doc: &ParsedConversation, output: &Path) {
    let meta = &doc.conversation_metadata;
    println!(
        "Parsed {} messages from {}",
        meta.total_messages, meta.source_file
    );
    let counts = meta.role_counts();
    for role in Role::ALL {
        println!("  {:<10} {}", format!("{role}:"), counts.get(role));
    }
    for msg in doc.messages.iter().take(PREVIEW_COUNT) {
        println!("  [{}] {}", msg.role, preview(&msg.content, PREVIEW_BYTES));
    }
    println!(
        "Digest: {}",
        digest_ids(doc.messages.iter().map(|m| m.id.as_str()))
    );
    println!("Saved to {}", output.display());
}

/// `recollect parse <transcript>`
pub fn execute(repo_root: &Path, args: &ParseArgs) -> anyhow::Result<()> {
    let (doc, output) = parse_and_save(repo_root, args)?;
    print_summary(&doc, &output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(transcript: PathBuf, output: PathBuf) -> ParseArgs {
        ParseArgs {
            transcript,
            output: Some(output),
            base_time: Some("2024-07-01T00:00:00Z".to_string()),
            drop_system: false,
            rules: None,
            ndjson: None,
        }
    }

    #[test]
    fn base_time_must_be_rfc3339() {
        assert!(parse_base_time("2024-07-01T00:00:00Z").is_ok());
        assert!(parse_base_time("2024-07-01T00:00:00+02:00").is_ok());
        assert!(parse_base_time("yesterday").is_err());
    }

    #[test]
    fn writes_document_and_ndjson() {
        let tmp = tempfile::tempdir().unwrap();
        let transcript = tmp.path().join("chat.txt");
        std::fs::write(&transcript, "Hi, how are you?\nI am well.\nGoogle Search\n").unwrap();
        let output = tmp.path().join("out.json");
        let ndjson = tmp.path().join("out.ndjson");

        let mut a = args(transcript, output.clone());
        a.ndjson = Some(ndjson.clone());
        let (doc, written) = parse_and_save(tmp.path(), &a).unwrap();

        assert_eq!(written, output);
        assert_eq!(doc.messages.len(), 3);
        let reloaded = recollect_store::load_conversation(&output).unwrap();
        assert_eq!(reloaded, doc);
        let lines = std::fs::read_to_string(&ndjson).unwrap();
        assert_eq!(lines.lines().count(), 3);
    }

    #[test]
    fn drop_system_flag_applies() {
        let tmp = tempfile::tempdir().unwrap();
        let transcript = tmp.path().join("chat.txt");
        std::fs::write(&transcript, "Hi, how are you?\nI am well.\nGoogle Search\n").unwrap();

        let mut a = args(transcript, tmp.path().join("out.json"));
        a.drop_system = true;
        let (doc, _) = parse_and_save(tmp.path(), &a).unwrap();
        assert_eq!(doc.conversation_metadata.system_messages, 0);
        assert_eq!(doc.messages.len(), 2);
    }

    #[test]
    fn failed_parse_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("out.json");

        let missing = args(tmp.path().join("absent.txt"), output.clone());
        assert!(parse_and_save(tmp.path(), &missing).is_err());

        let blank = tmp.path().join("blank.txt");
        std::fs::write(&blank, "\n\n").unwrap();
        assert!(parse_and_save(tmp.path(), &args(blank, output.clone())).is_err());

        assert!(!output.exists());
    }

    #[test]
    fn failed_ndjson_export_skips_document() {
        let tmp = tempfile::tempdir().unwrap();
        let transcript = tmp.path().join("chat.txt");
        std::fs::write(&transcript, "Hi there?\n").unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let output = tmp.path().join("out.json");

        let mut a = args(transcript, output.clone());
        a.ndjson = Some(blocker.join("out.ndjson"));
        assert!(parse_and_save(tmp.path(), &a).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn default_output_is_under_repo_root() {
        let tmp = tempfile::tempdir().unwrap();
        let transcript = tmp.path().join("chat.txt");
        std::fs::write(&transcript, "Hi there?\n").unwrap();
        let a = ParseArgs {
            output: None,
            ..args(transcript, PathBuf::new())
        };
        let (_, written) = parse_and_save(tmp.path(), &a).unwrap();
        assert_eq!(written, tmp.path().join("parsed_conversation.json"));
        assert!(written.exists());
    }
}
