use std::path::Path;
use std::time::Duration;

use clap::Args;
use recollect_core::ParsedConversation;
use recollect_import::{
    bootstrap, import_messages, Account, HttpTransport, ImportConfig, ImportReport, RunPlan,
};
use recollect_store::RecollectPaths;

#[derive(Args, Debug, Default)]
pub struct UploadArgs {
    /// Messages per request (default: config or 50)
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Pause between batches in milliseconds (default: config or 1000)
    #[arg(long)]
    pub pause_ms: Option<u64>,
    /// Memory store base URL (default: config or http://localhost:5000)
    #[arg(long)]
    pub base_url: Option<String>,
    /// Leave system messages out of the upload
    #[arg(long)]
    pub skip_system: bool,
    /// Ask the store to validate without persisting
    #[arg(long)]
    pub dry_run: bool,
    /// Send `<prefix>_<batch>` as each batch's idempotency key
    #[arg(long)]
    pub idempotency_prefix: Option<String>,
    /// Skip site-password and account handshake
    #[arg(long)]
    pub no_auth: bool,
    /// Skip the status check before the first batch
    #[arg(long)]
    pub no_precheck: bool,
}

impl UploadArgs {
    /// Layer command-line flags over file and environment settings.
    fn apply(&self, config: &mut ImportConfig) -> anyhow::Result<()> {
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.pause_ms {
            config.pause = Duration::from_millis(v);
        }
        if let Some(v) = &self.base_url {
            config.base_url = v.clone();
        }
        if self.skip_system {
            config.skip_system = true;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(v) = &self.idempotency_prefix {
            config.idempotency_prefix = Some(v.clone());
        }
        config.validate()?;
        Ok(())
    }
}

fn summary_lines(report: &ImportReport) -> Vec<String> {
    let t = &report.tally;
    let rate = match t.success_rate() {
        Some(r) => format!("{r:.1}%"),
        None => "N/A".to_string(),
    };
    let mut lines = vec![
        format!("Batches:    {}", report.batches.len()),
        format!("Sent:       {}", t.attempted),
        format!("Processed:  {}", t.processed),
        format!("Successful: {}", t.successful),
        format!("Failed:     {}", t.failed),
        format!("Duplicates: {}", t.duplicates),
        format!("Success rate: {rate}"),
    ];
    if report.skipped_system > 0 {
        lines.push(format!("Skipped system messages: {}", report.skipped_system));
    }
    if t.failed_batches > 0 {
        lines.push(format!("Failed batches: {}", t.failed_batches));
    }
    lines
}

/// Upload `doc` using settings from `.recollect/config.json`, `RECOLLECT_*`
/// variables, and `upload`, in increasing precedence. Exits with status 1
/// when the run completes without a single accepted message.
pub(crate) fn upload_conversation(
    repo_root: &Path,
    doc: &ParsedConversation,
    upload: &UploadArgs,
) -> anyhow::Result<()> {
    let paths = RecollectPaths::discover(repo_root);
    let mut config = ImportConfig::load_with_env(&paths.config_json)?;
    upload.apply(&mut config)?;

    println!(
        "Importing {} messages to {} (batch size {}{})",
        doc.messages.len(),
        config.base_url,
        config.batch_size,
        if config.dry_run { ", dry run" } else { "" }
    );

    let mut transport = HttpTransport::new(&config.base_url);
    if !upload.no_auth {
        match bootstrap(&mut transport, &config.auth)? {
            Account::Registered => println!("Registered account"),
            Account::LoggedIn => println!("Logged in"),
            Account::Anonymous => {}
        }
    }

    let mut plan = RunPlan::from_config(&config);
    plan.precheck = !upload.no_precheck;
    let report = import_messages(&mut transport, &doc.messages, &plan)?;

    println!();
    for line in summary_lines(&report) {
        println!("{line}");
    }

    if !report.tally.is_success() {
        eprintln!("Import failed: no messages were accepted");
        std::process::exit(1);
    }
    Ok(())
}

/// `recollect import [parsed.json]`
pub fn execute(repo_root: &Path, input: Option<&Path>, upload: &UploadArgs) -> anyhow::Result<()> {
    let default_input = RecollectPaths::discover(repo_root).parsed_json;
    let input = input.unwrap_or(&default_input);
    tracing::debug!(path = %input.display(), "loading parsed conversation");
    let doc = recollect_store::load_conversation(input)?;
    upload_conversation(repo_root, &doc, upload)
}
