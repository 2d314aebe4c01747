//! Loam - a static site generator for markdown blogs, backed by a SQLite
//! metadata store.

mod cli;
mod compile;
mod config;
mod convert;
mod init;
mod layout;
mod listing;
mod logger;
mod meta;
mod serve;
mod store;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use compile::Compiler;
use config::Config;
use convert::Pandoc;
use layout::Layout;
use store::SqliteStore;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    config.update_with_cli(&cli);

    match &cli.command {
        Commands::Init => init::init_site(&config),
        Commands::Build => build(&config),
        Commands::Serve { .. } => serve(&config),
        Commands::New { name } => init::new_content(&config, name),
    }
}

/// Load the configured layout, falling back to the built-in default.
fn load_layout(config: &Config) -> Result<Layout> {
    match &config.build.layout {
        Some(path) => Ok(Layout::from_path(path)?),
        None => Ok(Layout::default()),
    }
}

fn build(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.build.database)?;
    let pandoc = Pandoc::locate()?;
    let layout = load_layout(config)?;

    Compiler::new(&store, &pandoc, &layout, &config.base.name).compile(
        &config.build.content,
        &config.build.output,
        config.build.static_dir.as_deref(),
    )
}

fn serve(config: &Config) -> Result<()> {
    let store = SqliteStore::open(&config.build.database)?;
    let layout = load_layout(config)?;
    serve::serve_site(&store, &layout, config)
}
