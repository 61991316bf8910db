use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::contract::{FetchOutcome, Fetcher};
use crate::error::CatalogError;

/// Download progress is logged every time this many bytes have arrived.
const PROGRESS_STEP: u64 = 8 * 1024 * 1024;

/// Conditional HTTP downloader keyed on the response `ETag`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        last_validator: &str,
    ) -> Result<FetchOutcome, CatalogError> {
        let cached = tokio::fs::try_exists(destination)
            .await
            .map_err(|e| CatalogError::io(destination, e))?;

        let mut request = self.client.get(url);
        if cached && !last_validator.is_empty() {
            request = request.header(IF_NONE_MATCH, last_validator);
        }
        info!(url, cached, "[FETCH] Requesting upstream document");
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED && cached {
            info!(url, "[FETCH] Upstream answered 304, keeping cached copy");
            return Ok(FetchOutcome::Unchanged);
        }
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let validator = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if cached && !last_validator.is_empty() && validator.as_deref() == Some(last_validator) {
            info!(url, validator = last_validator, "[FETCH] Validator unchanged, skipping body");
            return Ok(FetchOutcome::Unchanged);
        }
        if validator.is_none() {
            debug!(url, "[FETCH] Response carries no ETag, downloading unconditionally");
        }

        // The body goes to a sibling file so an interrupted transfer never
        // replaces the cached copy.
        let staging_dir = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let staged = NamedTempFile::new_in(staging_dir)
            .map_err(|e| CatalogError::io(staging_dir, e))?;
        let staged_path = staged.path().to_path_buf();
        let mut file = staged
            .reopen()
            .map(tokio::fs::File::from_std)
            .map_err(|e| CatalogError::io(&staged_path, e))?;
        let mut body = response.bytes_stream();
        let mut bytes: u64 = 0;
        let mut next_report = PROGRESS_STEP;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.inspect_err(|e| {
                warn!(url, error = %e, bytes, "[FETCH] Transfer interrupted, discarding partial body")
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CatalogError::io(&staged_path, e))?;
            bytes += chunk.len() as u64;
            if bytes >= next_report {
                debug!(
                    downloaded_mb = %format!("{:.2}", bytes as f64 / 1024.0 / 1024.0),
                    "[FETCH] Download progress"
                );
                next_report += PROGRESS_STEP;
            }
        }
        file.flush()
            .await
            .map_err(|e| CatalogError::io(&staged_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| CatalogError::io(&staged_path, e))?;
        drop(file);
        staged
            .persist(destination)
            .map_err(|e| CatalogError::io(destination, e.error))?;

        info!(
            url,
            path = %destination.display(),
            bytes,
            validator = validator.as_deref().unwrap_or(""),
            "[FETCH] Upstream document downloaded"
        );
        Ok(FetchOutcome::Downloaded { validator, bytes })
    }
}
