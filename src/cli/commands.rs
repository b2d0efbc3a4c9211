//! CLI command definitions using clap.
//!
//! - chat: interactive conversation with the agent (default)
//! - prompts: list prompt files in the prompts directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill - quality-controlled writing assistant
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Chat with the conversation agent
    Chat {
        /// Skip response evaluation
        #[arg(long)]
        no_eval: bool,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List available prompt files
    Prompts,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Chat {
            no_eval: false,
            model: None,
        }
    }
}
