mod cmd_config;
mod cmd_import;
mod cmd_memory;
mod cmd_parse;
mod cmd_run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "recollect",
    version,
    about = "Migrate an unlabeled conversation transcript into a memory store"
)]
struct Cli {
    /// Debug-level logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attribute speakers in a transcript and write the parsed document
    Parse {
        #[command(flatten)]
        args: cmd_parse::ParseArgs,
    },
    /// Upload a parsed document to the memory store in batches
    Import {
        /// Parsed document (default: ./parsed_conversation.json)
        input: Option<PathBuf>,
        #[command(flatten)]
        upload: cmd_import::UploadArgs,
    },
    /// Parse a transcript, then upload the result
    Run {
        #[command(flatten)]
        parse: cmd_parse::ParseArgs,
        #[command(flatten)]
        upload: cmd_import::UploadArgs,
    },
    /// Wrap a text file as a standalone memory document
    Memory {
        /// Text file holding the memory content
        file: PathBuf,
        /// Title; also names the output file
        #[arg(long)]
        title: String,
        /// axiom, knowledge, experience, or conversation
        #[arg(long = "type", default_value = "knowledge")]
        kind: String,
        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output directory (default: ./memory_files)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Read or write settings (.recollect/config.json)
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. base_url, batch_size)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("recollect=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recollect=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cwd = std::env::current_dir()?;
    let repo_root = recollect_store::RecollectPaths::find_root(&cwd).unwrap_or(cwd);

    match cli.cmd {
        Command::Parse { args } => cmd_parse::execute(&repo_root, &args),
        Command::Import { input, upload } => {
            cmd_import::execute(&repo_root, input.as_deref(), &upload)
        }
        Command::Run { parse, upload } => cmd_run::execute(&repo_root, &parse, &upload),
        Command::Memory {
            file,
            title,
            kind,
            tags,
            out_dir,
        } => cmd_memory::execute(cmd_memory::MemoryParams {
            repo_root: &repo_root,
            file: &file,
            title: &title,
            kind: &kind,
            tags: &tags,
            out_dir: out_dir.as_deref(),
        }),
        Command::Config { cmd } => match cmd {
            ConfigCmd::Set { key, value } => cmd_config::set(&repo_root, &key, &value),
            ConfigCmd::Get { key } => cmd_config::get(&repo_root, &key),
            ConfigCmd::List => cmd_config::list(&repo_root),
        },
    }
}
