//! sync-articles: mirror dated summary folders into the directories the
//! article summary server reads from.
//!
//! # Commands
//!
//! - `run` (default) - copy the newest folders' summaries and publish
//! - `configure` - update connection settings in the config file

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use article_summary_server::sync::{
    self,
    config::{SyncConfig, SyncMode, DEFAULT_SYNC_CONFIG_PATH},
};
use article_summary_server::telemetry;

/// Mirror article summaries locally or to a remote host.
#[derive(Parser)]
#[command(name = "sync-articles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the sync config (JSON, or TOML by extension)
    #[arg(global = true, short, long, default_value = DEFAULT_SYNC_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the most recent folders of every source
    Run,

    /// Update connection settings and save the config file
    Configure {
        /// Remote host name
        #[arg(long)]
        host: Option<String>,

        /// Remote user name
        #[arg(long)]
        username: Option<String>,

        /// Private key used for ssh/scp
        #[arg(long)]
        private_key: Option<PathBuf>,

        /// Transfer mode (local, remote)
        #[arg(long)]
        mode: Option<SyncMode>,

        /// Number of newest folders to mirror
        #[arg(long)]
        keep_recent: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        "article_summary_server=debug,sync_articles=debug"
    } else {
        telemetry::DEFAULT_FILTER
    };
    telemetry::init_tracing(filter);

    let mut config = SyncConfig::load_from(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let transport = sync::transport_for(&config)?;
            info!(mode = %config.mode, sources = config.sources.len(), "starting sync");
            let summary = sync::run(&config, transport.as_ref()).await?;
            for r in &summary.reports {
                info!(
                    source = %r.source,
                    folders = r.folders.len(),
                    copied = r.copied,
                    skipped = r.skipped,
                    "source synced"
                );
            }
            info!(
                combined = summary.combined_written,
                published = summary.published,
                "sync completed"
            );
        }
        Commands::Configure {
            host,
            username,
            private_key,
            mode,
            keep_recent,
        } => {
            if let Some(h) = host {
                config.host = h;
            }
            if let Some(u) = username {
                config.username = u;
            }
            if let Some(k) = private_key {
                config.private_key_path = k.display().to_string();
            }
            if let Some(m) = mode {
                config.mode = m;
            }
            if let Some(n) = keep_recent {
                config.keep_recent = n;
            }
            config.validate()?;
            config.save_to(&cli.config)?;
            info!(path = %cli.config.display(), "configuration saved");
        }
    }
    Ok(())
}
