//! Layout rendering.
//!
//! A layout is a wrapper template with two placeholders: `{content}` for the
//! rendered fragment and `{site_name}` for the configured display name. The
//! built-in default is embedded at compile time; a custom template file can
//! be supplied through configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Default layout (embedded at compile time)
const DEFAULT_LAYOUT: &str = include_str!("embed/layout.html");

/// Placeholder replaced by the rendered HTML fragment.
const CONTENT_SLOT: &str = "{content}";
/// Placeholder replaced by the site display name.
const NAME_SLOT: &str = "{site_name}";

/// Layout template failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unable to read layout template `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("layout template `{path}` has no {{content}} placeholder")]
    MissingContentSlot { path: PathBuf },
}

/// A document wrapper template.
#[derive(Debug, Clone)]
pub struct Layout {
    template: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            template: DEFAULT_LAYOUT.to_string(),
        }
    }
}

impl Layout {
    /// Load a custom layout template from disk.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let template = fs::read_to_string(path).map_err(|e| RenderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !template.contains(CONTENT_SLOT) {
            return Err(RenderError::MissingContentSlot {
                path: path.to_path_buf(),
            });
        }
        Ok(Self { template })
    }

    /// Wrap a fragment into a complete document.
    ///
    /// The name is substituted first so a fragment containing a literal
    /// `{site_name}` is never rewritten.
    pub fn render(&self, fragment: &str, site_name: &str) -> String {
        self.template
            .replace(NAME_SLOT, site_name)
            .replace(CONTENT_SLOT, fragment)
    }
}

// ============================================================================
// Tests
// ============================================================================
