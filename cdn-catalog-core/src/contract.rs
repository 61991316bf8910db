//! # contract: interface between the pipeline and the upstream source
//!
//! The pipeline never talks HTTP directly. It asks a [`Fetcher`] to bring the
//! raw document onto local disk and learns from the returned
//! [`FetchOutcome`] whether anything changed since the last run.
//!
//! ## Implementations
//! - [`crate::download::HttpFetcher`]: conditional GET with ETag validation.
//! - `MockFetcher`: generated by `mockall` for tests (exported under the
//!   `test-export-mocks` feature so integration tests can use it).

use std::path::Path;

use async_trait::async_trait;
use mockall::automock;

use crate::error::CatalogError;

/// What a fetch did to the local copy of the upstream document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The remote validator matched and the local copy was kept untouched.
    Unchanged,
    /// The body was written to the destination.
    Downloaded {
        /// Validator sent with the response; `None` when the header was absent.
        validator: Option<String>,
        bytes: u64,
    },
}

/// Brings the upstream document to a local path.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` into `destination` unless the remote validator equals
    /// `last_validator` (empty when unknown) and `destination` already exists.
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        last_validator: &str,
    ) -> Result<FetchOutcome, CatalogError>;
}
