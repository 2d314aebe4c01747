//! Project bootstrap and authoring helpers.

use crate::{config::Config, log, meta, store::SqliteStore};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Set up a project: content directory, metadata database, and a default
/// config file when none exists yet.
pub fn init_site(config: &Config) -> Result<()> {
    if config.build.database.exists() {
        bail!(
            "database already exists at `{}`. remove it manually to start over",
            config.build.database.display()
        );
    }

    fs::create_dir_all(&config.build.content).with_context(|| {
        format!(
            "failed to create content directory `{}`",
            config.build.content.display()
        )
    })?;

    SqliteStore::create(&config.build.database)?;
    log!("init"; "created database {}", config.build.database.display());

    if !config.path.as_os_str().is_empty() && !config.path.exists() {
        let content =
            toml::to_string_pretty(config).context("failed to serialize default config")?;
        fs::write(&config.path, content)?;
        log!("init"; "wrote {}", config.path.display());
    }

    log!("init"; "done");
    Ok(())
}

/// Create a new content file pre-filled with the front-matter template.
pub fn new_content(config: &Config, name: &Path) -> Result<()> {
    let path = config.build.content.join(name);
    if path.exists() {
        bail!("`{}` already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&path, format!("{}\n", meta::metadata_template()))?;
    log!("new"; "created {}", path.display());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
