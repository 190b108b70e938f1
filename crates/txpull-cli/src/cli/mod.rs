//! CLI for the txpull incremental bucket puller.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use txpull_core::config;

use commands::{run_checksum, run_status, run_sync, run_validate};

/// Top-level CLI for txpull.
#[derive(Debug, Parser)]
#[command(name = "txpull")]
#[command(about = "txpull: incremental transaction CSV puller", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Pull new matching objects from the configured bucket.
    Sync {
        /// Download into this directory instead of the configured one.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Show the checkpoint: which objects have already been pulled.
    Status,

    /// Run the download validator against a local file.
    Validate {
        /// Path to the file.
        path: PathBuf,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Sync { download_dir } => {
                if let Some(dir) = download_dir {
                    cfg.download_dir = dir;
                }
                run_sync(&cfg)?;
            }
            CliCommand::Status => run_status(&cfg)?,
            CliCommand::Validate { path } => run_validate(&cfg, &path)?,
            CliCommand::Checksum { path } => run_checksum(&path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
