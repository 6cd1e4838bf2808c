//! LLMhub CLI: match model catalogs and maintain model series from the terminal.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// LLMhub: model identity resolution for LLM catalogs
#[derive(Parser, Debug)]
#[command(name = "llmhub", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Match two model catalogs and print merged rows as JSON
    Match {
        /// Left catalog (JSON array or {"data": [...]})
        #[arg(long)]
        left: PathBuf,
        /// Right catalog (JSON array or {"data": [...]})
        #[arg(long)]
        right: PathBuf,
        /// Write rows to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Order in which left records claim partners: input, primary-key
        #[arg(long)]
        left_order: Option<String>,
    },
    /// Print the canonical series of model names
    Series {
        /// Model display names
        #[arg(required = true)]
        names: Vec<String>,
        /// Modality (llm, text_to_image, image_editing, text_to_speech, text_to_video, image_to_video)
        #[arg(short, long, default_value = "llm")]
        modality: String,
    },
    /// Look up model names in a catalog by primary key and aliases
    Lookup {
        /// Catalog to search (JSON array or {"data": [...]})
        #[arg(short, long)]
        catalog: PathBuf,
        /// Model names or ids
        #[arg(required = true)]
        names: Vec<String>,
        /// Write rows to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Resolve queries against a series registry file
    Resolve {
        /// Series registry (JSON array of series)
        #[arg(short, long)]
        registry: PathBuf,
        /// Raw series queries
        #[arg(required = true)]
        queries: Vec<String>,
        /// Write created series and new aliases back to the registry file
        #[arg(long)]
        save: bool,
    },
    /// Assign catalog records to series and create missing series
    Sync {
        /// Records to place (JSON array or {"data": [...]})
        #[arg(long)]
        records: PathBuf,
        /// Series registry (JSON array of series)
        #[arg(short, long)]
        registry: PathBuf,
        /// Print the plan without writing the registry
        #[arg(long)]
        dry_run: bool,
    },
    /// Rank candidates by weighted dimension scores
    Rank {
        /// Ranking payload with optional "weights" and a "models" list
        #[arg(short, long)]
        input: PathBuf,
        /// Limit output ranking count (0 keeps all)
        #[arg(long, default_value = "3")]
        top_k: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "llmhub", "llmhub")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "llmhub.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace)
}
