//! CLI argument parser for rms
//!
//! Provides type-safe argument parsing using clap derive.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for rms
#[derive(Parser, Debug)]
#[command(
    name = "rms",
    version,
    about = "A safe deletion command: move files to a trash can and undelete them later",
    long_about = "Instead of removing files, rms moves them into a holding directory and\n\
                  records where they came from. The most recent deletion can be undone,\n\
                  the trash can listed, and everything cleared for good."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Move files or directories into the trash can
    #[command(visible_alias = "rm")]
    Delete {
        /// Files or directories to delete
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Restore the most recently deleted item, or the newest one matching NAME
    #[command(visible_alias = "restore")]
    Undelete {
        /// Base name or original path of the item to restore
        #[arg(value_name = "NAME")]
        name: Option<String>,

        /// Restore to the original location instead of the current directory
        #[arg(short, long)]
        original: bool,

        /// Overwrite an existing destination without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// List the trash can
    #[command(visible_alias = "ls")]
    List,

    /// Permanently clear the trash can
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Initialize configuration file (~/.config/rms/config.toml)
    Init,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
