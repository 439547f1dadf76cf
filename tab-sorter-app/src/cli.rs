//! CLI definitions for tab-sorter.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tab-sorter")]
#[command(about = "Group, deduplicate and prune browser tabs")]
#[command(version)]
pub struct Cli {
    /// Window snapshot the commands operate on
    #[arg(short, long, default_value = "tabs.json", global = true)]
    pub snapshot: PathBuf,

    /// Settings file (defaults to the user config dir)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List tabs of the current window after filtering
    Tabs,

    /// Show duplicate and stale tabs
    Cleanup {
        /// Close every listed candidate
        #[arg(long)]
        apply: bool,

        /// Idle minutes before a tab counts as stale
        #[arg(long)]
        stale_minutes: Option<u64>,
    },

    /// Show the grouping strategy of the host
    Strategy,

    /// Ask the model for groups
    Classify {
        /// Apply the proposed groups
        #[arg(long)]
        apply: bool,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Leave a tab out of every proposed group (repeatable)
        #[arg(long = "exclude", value_name = "TAB_ID")]
        exclude: Vec<i64>,

        /// Seconds to wait for the model
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Settings management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print current settings (API key masked)
    Show,
    /// Store the API key
    SetKey { key: String },
    /// Store the model id
    SetModel { model: String },
}
