//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy Pager CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Endpoint definition file (YAML)
    #[arg(short, long, global = true)]
    pub endpoint: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch items and print them
    Fetch(TraverseArgs),

    /// Fetch pages and print one summary per page
    Pages(TraverseArgs),

    /// Validate endpoint definition
    Validate,
}

/// Options shared by every command that walks an endpoint
#[derive(Args, Debug, Clone, Default)]
pub struct TraverseArgs {
    /// Stop after this many items (the page crossing the bound is kept whole)
    #[arg(long)]
    pub max_items: Option<u64>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<u64>,

    /// Page size hint
    #[arg(long)]
    pub limit: Option<u32>,

    /// Extra filter as key=value (repeatable)
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Cursor to start from
    #[arg(long)]
    pub cursor: Option<String>,

    /// Resume from a saved state file
    #[arg(long, value_name = "STATE_JSON")]
    pub resume: Option<PathBuf>,

    /// Save state after every page
    #[arg(long, value_name = "STATE_JSON")]
    pub save_state: Option<PathBuf>,

    /// Deadline for a single page fetch, in seconds
    #[arg(long)]
    pub fetch_timeout: Option<u64>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one value per line)
    Json,
    /// Human-readable output
    Pretty,
}
