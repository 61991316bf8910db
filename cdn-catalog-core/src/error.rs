//! Error type shared by every stage of the catalog pipeline.

use std::path::{Path, PathBuf};

/// Failure of a pipeline stage. Every variant is fatal for the current run.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream {url} answered with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed upstream document: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to encode catalog: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("build version file {path:?} holds {content:?}, expected a non-negative integer")]
    InvalidBuildVersion { path: PathBuf, content: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CatalogError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
