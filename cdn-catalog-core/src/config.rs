use std::path::PathBuf;
use tracing::{debug, info};

use crate::catalog::CatalogEncoding;
use crate::error::CatalogError;

/// Name of the local copy of the upstream document inside `downloads_dir`.
pub const RAW_DOCUMENT_NAME: &str = "raw_libraries.json";

/// Everything one catalog build needs to know.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub source_url: String,
    pub downloads_dir: PathBuf,
    pub builds_dir: PathBuf,
    pub version_file: PathBuf,
    pub validator_file: PathBuf,
    pub url_template: String,
    pub max_versions_per_lib: usize,
    pub encoding: CatalogEncoding,
    /// Skip the build entirely when the upstream document did not change.
    pub skip_unchanged: bool,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.source_url.trim().is_empty() {
            return Err(CatalogError::InvalidConfig("source url is empty".into()));
        }
        if self.url_template.trim().is_empty() {
            return Err(CatalogError::InvalidConfig("url_template is empty".into()));
        }
        if self.max_versions_per_lib == 0 {
            return Err(CatalogError::InvalidConfig(
                "max_versions_per_lib must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn raw_document_path(&self) -> PathBuf {
        self.downloads_dir.join(RAW_DOCUMENT_NAME)
    }

    pub fn catalog_path(&self, build: u64) -> PathBuf {
        self.builds_dir.join(format!("libraries_{build}.json"))
    }

    pub fn trace_loaded(&self) {
        info!(
            source_url = %self.source_url,
            builds_dir = %self.builds_dir.display(),
            max_versions_per_lib = self.max_versions_per_lib,
            encoding = ?self.encoding,
            "Loaded CatalogConfig"
        );
        debug!(?self, "CatalogConfig loaded (full debug)");
    }
}
