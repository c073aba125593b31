use std::path::Path;

use crate::cmd_import::{self, UploadArgs};
use crate::cmd_parse::{self, ParseArgs};

/// `recollect run <transcript>`: parse, save, then upload the saved document.
pub fn execute(repo_root: &Path, parse: &ParseArgs, upload: &UploadArgs) -> anyhow::Result<()> {
    let (doc, output) = cmd_parse::parse_and_save(repo_root, parse)?;
    println!(
        "Parsed {} messages into {}",
        doc.messages.len(),
        output.display()
    );
    cmd_import::upload_conversation(repo_root, &doc, upload)
}
