use minreqs_pypi::PypiError;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for the min-reqs tool.
///
/// # Examples
///
/// ```
/// use minreqs::error::{Error, Result};
/// use std::path::Path;
///
/// fn parse_project(path: &Path, text: &str) -> Result<toml_edit::DocumentMut> {
///     text.parse().map_err(|e| Error::Toml {
///         path: path.to_path_buf(),
///         source: e,
///     })
/// }
///
/// assert!(parse_project(Path::new("pyproject.toml"), "[project").is_err());
/// ```
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("invalid project file {}: {message}", path.display())]
    InvalidStructure { path: PathBuf, message: String },

    #[error(transparent)]
    Pypi(#[from] PypiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_structure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
