//! Site configuration management for `loam.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                        |
//! |-----------|------------------------------------------------|
//! | `[base]`  | Site display name                              |
//! | `[build]` | Content/output/static/layout paths, database   |
//! | `[serve]` | Development server (interface, port)           |
//!
//! # Example
//!
//! ```toml
//! [base]
//! name = "foo bar"
//!
//! [build]
//! content = "content"
//! output = "served_content"
//! static = "assets"
//! layout = "layout.html"
//!
//! [serve]
//! port = 5377
//! ```
//!
//! Every field is optional; CLI flags override file values which override
//! the defaults.

use crate::cli::{Cli, Commands};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),
}

/// Root configuration structure representing loam.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Path the config was loaded from (set after loading)
    #[serde(skip)]
    pub path: PathBuf,

    pub base: BaseConfig,
    pub build: BuildConfig,
    pub serve: ServeConfig,
}

/// Basic site information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BaseConfig {
    /// Site display name injected into the layout
    pub name: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            name: "foo bar".to_string(),
        }
    }
}

/// Compilation paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BuildConfig {
    /// Content root (authored markdown files)
    pub content: PathBuf,

    /// Output root (generated, servable documents)
    pub output: PathBuf,

    /// Metadata database file
    pub database: PathBuf,

    /// Static-asset source directory; the built-in stylesheet is used when
    /// absent
    #[serde(rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    /// Custom layout template; the built-in layout is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            output: PathBuf::from("served_content"),
            database: PathBuf::from("loam.db"),
            static_dir: None,
            layout: None,
        }
    }
}

/// Development server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServeConfig {
    pub interface: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 5377,
        }
    }
}

impl Config {
    /// Load configuration from a toml file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw =
                fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
            toml::from_str(&raw)?
        } else {
            Self::default()
        };
        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Layer CLI flags over file values.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        if let Some(content) = &cli.content {
            self.build.content = content.clone();
        }
        if let Some(output) = &cli.output {
            self.build.output = output.clone();
        }
        if let Some(static_dir) = &cli.static_dir {
            self.build.static_dir = Some(static_dir.clone());
        }
        if let Some(layout) = &cli.layout {
            self.build.layout = Some(layout.clone());
        }
        if let Some(name) = &cli.name {
            self.base.name = name.clone();
        }
        if let Commands::Serve { port: Some(port) } = &cli.command {
            self.serve.port = *port;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
