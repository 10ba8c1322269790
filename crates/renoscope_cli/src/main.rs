//! Renoscope CLI
//!
//! Command-line tools for the Renoscope local store.
//!
//! # Commands
//!
//! - `inspect` - Display per-table sync state and journal size
//! - `sync` - Run a sync against a server
//! - `compact` - Rewrite the journal as one record per row
//! - `dump-journal` - Dump journal records for debugging

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Renoscope command-line store tools.
#[derive(Parser)]
#[command(name = "renoscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display per-table sync state and journal size
    Inspect {
        /// List rows that still have to be pushed
        #[arg(long)]
        pending: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Sync the store with a server
    Sync {
        /// Server base URL
        #[arg(short, long, env = "RENOSCOPE_SERVER")]
        server: String,

        /// Bearer token
        #[arg(short, long, env = "RENOSCOPE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Models to sync, in order (default: all)
        #[arg(short, long)]
        model: Vec<String>,

        /// Only pull remote changes
        #[arg(long, conflicts_with = "push_only")]
        pull_only: bool,

        /// Only push local changes
        #[arg(long)]
        push_only: bool,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite the journal as one record per row
    Compact {
        /// Keep rows whose deletion has already synced
        #[arg(short, long)]
        keep_deletions: bool,

        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Dump journal records for debugging
    DumpJournal {
        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { pending, format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, pending, &format)?;
        }
        Commands::Sync {
            server,
            token,
            model,
            pull_only,
            push_only,
            timeout,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for sync")?;
            let args = commands::sync::SyncArgs {
                server,
                token,
                models: model,
                pull_only,
                push_only,
                timeout_secs: timeout,
            };
            commands::sync::run(&path, &args, &format)?;
        }
        Commands::Compact {
            keep_deletions,
            dry_run,
        } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, !keep_deletions, dry_run)?;
        }
        Commands::DumpJournal { limit, format } => {
            let path = cli.path.ok_or("Store path required for dump-journal")?;
            commands::dump_journal::run(&path, limit, &format)?;
        }
        Commands::Version => {
            println!("Renoscope CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
