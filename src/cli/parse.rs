//! CLI parse: clap types for appframe. No behavior; definitions only.

use crate::dirty::DirtyState;
use crate::types::ApplicationType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Appframe CLI - inspect embedding plans and the shared dirty-state store
#[derive(Parser)]
#[command(name = "appframe")]
#[command(about = "Embedding plans and dirty-state tooling for frame-hosted applications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where config/ is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Dirty-state store directory (overrides storage.store_path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how an application would be embedded into a container
    Plan {
        /// Application type (URL, TR, WDA, NWBC, WCF)
        app_type: ApplicationType,
        /// Target address
        url: String,
        /// Container id the plan is made for
        #[arg(long, default_value = "preview")]
        container: String,
        /// Pretend the host cannot post forms into frames
        #[arg(long)]
        no_form_post: bool,
        /// Theme passed to the application
        #[arg(long)]
        theme: Option<String>,
        /// System alias forwarded in the form context
        #[arg(long)]
        system_alias: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect and modify dirty-state entries
    Dirty {
        #[command(subcommand)]
        command: DirtyCommands,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum DirtyCommands {
    /// List every dirty-state entry
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one entry (full key or container token)
    Get { key: String },
    /// Write a token
    Set { key: String, state: DirtyState },
    /// Remove an entry
    Clear { key: String },
    /// Flip an entry to PENDING and wait for its owner to answer
    Query { key: String },
    /// Print changes as they happen
    Watch {
        /// Stop after this many changes
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
