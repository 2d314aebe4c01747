//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Loam static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file name (default: loam.toml)
    #[arg(short = 'C', long, default_value = "loam.toml")]
    pub config: PathBuf,

    /// Content directory path
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// Output directory path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Static-asset source directory (built-in styles are used when unset)
    #[arg(long = "static-dir")]
    pub static_dir: Option<PathBuf>,

    /// Custom layout template path (built-in layout is used when unset)
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Site display name
    #[arg(long)]
    pub name: Option<String>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Set up the project: metadata database and content directory
    Init,

    /// Compile the content tree into the output tree
    Build,

    /// Serve the compiled output tree
    Serve {
        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a new content file pre-filled with the front-matter template
    New {
        /// File name, relative to the content directory
        name: PathBuf,
    },
}
