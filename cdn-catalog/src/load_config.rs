/// `load_config` module: Loads a static YAML config file and adapts it into the core [`CatalogConfig`].
///
/// This module is the only place where user-supplied YAML is parsed and mapped to
/// strongly-typed internal structs.
///
/// # Responsibilities
/// - Parse the YAML sections (`source`, `paths`, `catalog`) into intermediate structs
/// - Resolve relative paths against the directory holding the config file
/// - Apply the `CATALOG_SOURCE_URL` environment override
/// - Validate the merged result before handing it to the pipeline
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics, surfaced at the CLI boundary.
use anyhow::{Context, Result};
use cdn_catalog_core::catalog::CatalogEncoding;
use cdn_catalog_core::config::CatalogConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable overriding `source.url`.
pub const SOURCE_URL_ENV: &str = "CATALOG_SOURCE_URL";

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub source: SourceSection,
    pub paths: PathsSection,
    pub catalog: CatalogSection,
}

#[derive(Debug, Deserialize)]
pub struct SourceSection {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PathsSection {
    pub downloads_dir: PathBuf,
    pub builds_dir: PathBuf,
    pub version_file: PathBuf,
    pub validator_file: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct CatalogSection {
    pub url_template: String,
    pub max_versions_per_lib: usize,
    #[serde(default)]
    pub encoding: CatalogEncoding,
    #[serde(default)]
    pub skip_unchanged: bool,
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Loads the YAML config at `path` and returns a validated [`CatalogConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let base = path_ref
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let source_url = match std::env::var(SOURCE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            info!(source_url = %url, env = SOURCE_URL_ENV, "Source URL overridden from environment");
            url
        }
        _ => raw.source.url,
    };

    let config = CatalogConfig {
        source_url,
        downloads_dir: resolve(&base, raw.paths.downloads_dir),
        builds_dir: resolve(&base, raw.paths.builds_dir),
        version_file: resolve(&base, raw.paths.version_file),
        validator_file: resolve(&base, raw.paths.validator_file),
        url_template: raw.catalog.url_template,
        max_versions_per_lib: raw.catalog.max_versions_per_lib,
        encoding: raw.catalog.encoding,
        skip_unchanged: raw.catalog.skip_unchanged,
    };
    config
        .validate()
        .with_context(|| format!("Invalid config file {:?}", path_ref))?;
    config.trace_loaded();

    Ok(config)
}
