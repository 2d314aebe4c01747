//! Markdown to HTML conversion.
//!
//! The conversion engine is an external collaborator: pandoc is invoked as
//! an opaque body-to-fragment transform. The [`Converter`] trait is the seam
//! that lets the compiler run against a fake engine in tests.

use std::{
    path::{Path, PathBuf},
    process::Command,
};
use thiserror::Error;

/// Conversion engine failures.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("pandoc not found in PATH, install it from https://pandoc.org")]
    NotFound(#[source] which::Error),

    #[error("failed to run pandoc on `{path}`")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pandoc rejected `{path}`: {stderr}")]
    Rejected { path: PathBuf, stderr: String },

    #[error("pandoc produced non-utf8 output for `{path}`")]
    Encoding { path: PathBuf },
}

/// Opaque transform from a source file to an HTML fragment.
pub trait Converter {
    fn to_html(&self, source: &Path) -> Result<String, ConvertError>;
}

/// The pandoc binary, resolved once at startup.
pub struct Pandoc {
    bin: PathBuf,
}

impl Pandoc {
    pub fn locate() -> Result<Self, ConvertError> {
        let bin = which::which("pandoc").map_err(ConvertError::NotFound)?;
        Ok(Self { bin })
    }
}

impl Converter for Pandoc {
    fn to_html(&self, source: &Path) -> Result<String, ConvertError> {
        let output = Command::new(&self.bin)
            .arg(source)
            .args(["--to", "html"])
            .output()
            .map_err(|e| ConvertError::Spawn {
                path: source.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Rejected {
                path: source.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ConvertError::Encoding {
            path: source.to_path_buf(),
        })
    }
}
