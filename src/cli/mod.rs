//! CLI argument parsing using clap 4.x derive macros

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use mnemo_core::Category;

/// Categorized persistent memory for coding agents
///
/// Stores preferences, learnings, decisions, corrections and patterns as
/// one JSON file per category, and serves them to an agent host over
/// stdio or WebSocket.
#[derive(Parser, Debug)]
#[command(name = "mnemo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Memory directory (overrides config and MNEMO_MEMORY_DIR)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Print raw JSON results instead of rendered text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve requests to an agent host
    ///
    /// Reads one JSON message per line on stdin and answers on stdout,
    /// unless --ws is given.
    Serve {
        /// Listen for WebSocket connections instead of stdio
        #[arg(long)]
        ws: bool,

        /// Port to listen on with --ws
        #[arg(short, long, default_value_t = 41902)]
        port: u16,
    },

    /// Read memories
    Read {
        /// Category to read (all when omitted)
        #[arg(short, long)]
        category: Option<Category>,

        /// Only the entry with this key
        #[arg(short, long)]
        key: Option<String>,

        /// Maximum entries per category
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create or update a memory
    Write(WriteArgs),

    /// Search memories
    Search {
        /// Search query
        query: String,

        /// Restrict to these categories
        #[arg(short, long, value_delimiter = ',')]
        categories: Vec<Category>,

        /// Case-insensitive substring matching only
        #[arg(long)]
        exact: bool,

        /// Minimum similarity (0-1)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Number of results to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List keys with value previews
    List {
        #[arg(short, long)]
        category: Option<Category>,

        /// Show entry timestamps
        #[arg(short = 't', long)]
        timestamps: bool,
    },

    /// Delete a memory (shows the entry unless --confirm)
    Delete {
        category: Category,
        key: String,

        #[arg(long)]
        confirm: bool,
    },

    /// Remove stale and overflowing memories (dry run unless --apply --confirm)
    Prune {
        #[arg(short, long)]
        category: Option<Category>,

        #[arg(long)]
        max_age_days: Option<u32>,

        #[arg(long)]
        max_entries: Option<usize>,

        /// Turn off dry-run
        #[arg(long)]
        apply: bool,

        #[arg(long, requires = "apply")]
        confirm: bool,
    },

    /// List the operations the server accepts
    Operations,

    /// Show where memories are stored
    Paths,

    /// Write a default mnemo.toml
    Init {
        /// Write to the user config directory instead of ./mnemo.toml
        #[arg(long)]
        global: bool,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    pub category: Category,
    pub key: String,
    pub value: String,

    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub context: Option<String>,

    /// What was wrong (corrections)
    #[arg(long)]
    pub wrong: Option<String>,

    /// What is correct (corrections)
    #[arg(long)]
    pub correct: Option<String>,

    /// How often the pattern was seen (patterns)
    #[arg(long)]
    pub frequency: Option<u64>,

    /// Files the pattern appears in (patterns)
    #[arg(long, value_delimiter = ',')]
    pub files: Vec<String>,

    /// Alternatives weighed (decisions)
    #[arg(long, value_delimiter = ',')]
    pub alternatives: Vec<String>,
}
