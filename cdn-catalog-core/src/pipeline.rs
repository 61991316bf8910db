//! High-level pipeline: orchestrates fetch → transform → write → commit for one catalog build.
//!
//! # Responsibilities
//! - Prepares the working directories and reads the state left by the previous run
//! - Fetches the upstream document through a [`Fetcher`] (conditional on its ETag)
//! - Streams the local copy into a catalog and writes it as `libraries_<build>.json`
//! - Commits the build number only after the catalog file is completely on disk
//!
//! # Error Handling
//! Every step is fail-fast: the first error is returned as-is and nothing after
//! it runs. A failed run never advances the build number, so a retry reuses
//! the same number and overwrites the same file.
//!
//! # Navigation
//! - Main entrypoint: [`build_catalog`]
//! - Supporting types: [`BuildOutcome`], [`BuildReport`]

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::catalog::write_catalog;
use crate::config::CatalogConfig;
use crate::contract::{FetchOutcome, Fetcher};
use crate::error::{CatalogError, Result};
use crate::state::{BuildVersioner, ValidatorStore};
use crate::transform::{transform_file, TransformOptions};

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built(BuildReport),
    /// Upstream was unchanged and `skip_unchanged` is set.
    Skipped { current_build: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub build: u64,
    pub catalog_path: PathBuf,
    pub records: usize,
    pub bytes: u64,
    pub upstream: FetchOutcome,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))
}

fn init_paths(config: &CatalogConfig) -> Result<()> {
    ensure_dir(&config.downloads_dir)?;
    ensure_dir(&config.builds_dir)?;
    for state_file in [&config.version_file, &config.validator_file] {
        if let Some(parent) = state_file.parent() {
            ensure_dir(parent)?;
        }
    }
    Ok(())
}

/// Runs one complete catalog build.
pub async fn build_catalog<F>(config: &CatalogConfig, fetcher: &F) -> Result<BuildOutcome>
where
    F: Fetcher + ?Sized,
{
    config.validate()?;
    init_paths(config)?;
    info!("[BUILD] Starting catalog build");

    let validators = ValidatorStore::new(&config.validator_file);
    let versioner = BuildVersioner::new(&config.version_file);

    // Step 1: fetch
    let download_path = config.raw_document_path();
    let last_validator = validators.load()?.unwrap_or_default();
    info!(
        url = %config.source_url,
        destination = %download_path.display(),
        "[BUILD] Fetching upstream document"
    );
    let upstream = fetcher
        .fetch(&config.source_url, &download_path, &last_validator)
        .await
        .inspect_err(|e| error!(error = %e, "[BUILD][ERROR] Fetch failed"))?;
    match &upstream {
        FetchOutcome::Downloaded { validator, .. } => validators.store(validator.as_deref())?,
        FetchOutcome::Unchanged => {
            info!("[BUILD] File already in cache");
            if config.skip_unchanged {
                let current_build = versioner.current()?;
                info!(current_build, "[BUILD] Upstream unchanged, skipping build");
                return Ok(BuildOutcome::Skipped { current_build });
            }
        }
    }

    // Step 2: transform
    let catalog = transform_file(&download_path, &TransformOptions::from(config))
        .inspect_err(|e| error!(error = %e, "[BUILD][ERROR] Transform failed"))?;

    // Step 3: write, then commit
    let build = versioner.next()?;
    let catalog_path = config.catalog_path(build);
    let bytes = write_catalog(&catalog_path, &catalog)
        .inspect_err(|e| error!(error = %e, "[BUILD][ERROR] Writing catalog failed"))?;
    versioner.commit(build)?;

    info!(
        path = %catalog_path.display(),
        size = %format!("{:.2} KB", bytes as f64 / 1024.0),
        "[BUILD] New build created"
    );
    Ok(BuildOutcome::Built(BuildReport {
        build,
        catalog_path,
        records: catalog.items.records(),
        bytes,
        upstream,
    }))
}
