//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;

/// Materialized-path trees: assemble, render and reparent node records
#[derive(Parser, Debug)]
#[command(name = "pathtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding a local .pathtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble the tree below a root record and render it
    Show {
        /// TOML file of [[node]] records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Id of the root record (default: shallowest path)
        #[arg(short, long)]
        root: Option<String>,
        /// Output format (default: from settings)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Feed records in file order instead of sorting by depth
        #[arg(long)]
        keep_order: bool,
    },

    /// Move a node under a new parent and repair the paths of its subtree
    Move {
        /// TOML file of [[node]] records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Id of the node to move
        node: String,
        /// Id of the new parent
        parent: String,
        /// Id of the root record (default: shallowest path)
        #[arg(short, long)]
        root: Option<String>,
        /// Write the updated records back to the file
        #[arg(short, long)]
        write: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a commented config template
    Template,
    /// Show config file locations
    Path,
}
