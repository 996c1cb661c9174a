//! CLI command definitions for the `rcl` binary.
//!
//! Uses clap derive macros for argument parsing. Every memory command takes
//! the owner id as its first positional argument.

pub mod config;
pub mod memory;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Per-owner semantic memory store.
#[derive(Parser)]
#[command(name = "rcl", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store one or more memories for an owner.
    Remember {
        /// Owner the memories belong to.
        owner: String,

        /// Memory texts; each argument becomes one record.
        #[arg(required = true, num_args = 1..)]
        texts: Vec<String>,

        /// Type tag stored with every record (default: thought).
        #[arg(long = "type", value_name = "TYPE")]
        memory_type: Option<String>,
    },

    /// Find an owner's memories closest to a query.
    Recall {
        owner: String,

        query: String,

        /// Number of results (default from [store] default_top_k).
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<usize>,
    },

    /// Count the memories stored for an owner.
    Count { owner: String },

    /// Show the resolved configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
