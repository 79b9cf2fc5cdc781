//! spanlog CLI
//!
//! Command-line tools for replaying recorded log feeds through a store.
//!
//! # Commands
//!
//! - `replay` - Replay a feed and print the rendered view
//! - `spans` - Replay a feed and list the retained spans
//! - `stats` - Replay a feed and print store statistics

mod commands;

use clap::{Parser, Subcommand};
use commands::StoreOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// spanlog command-line tools.
#[derive(Parser)]
#[command(name = "spanlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines feed and print the rendered log
    Replay {
        /// Feed file, one batch per line
        file: PathBuf,

        /// Only show these manifests (repeatable; all if omitted)
        #[arg(short, long = "manifest", value_name = "NAME")]
        manifests: Vec<String>,

        /// Prefix each line with its manifest name
        #[arg(short, long)]
        prefix: bool,

        #[command(flatten)]
        store: StoreOptions,
    },

    /// Replay a feed and list the spans that survive it
    Spans {
        /// Feed file, one batch per line
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        #[command(flatten)]
        store: StoreOptions,
    },

    /// Replay a feed and print store statistics
    Stats {
        /// Feed file, one batch per line
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        #[command(flatten)]
        store: StoreOptions,
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
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            file,
            manifests,
            prefix,
            store,
        } => {
            commands::replay::run(&file, &manifests, prefix, &store)?;
        }
        Commands::Spans {
            file,
            format,
            store,
        } => {
            commands::spans::run(&file, &format, &store)?;
        }
        Commands::Stats {
            file,
            format,
            store,
        } => {
            commands::stats::run(&file, &format, &store)?;
        }
        Commands::Version => {
            println!("spanlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("spanlog Core v{}", spanlog_core::VERSION);
        }
    }

    Ok(())
}
