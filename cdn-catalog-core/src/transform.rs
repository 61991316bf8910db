//! Streaming reduction of the raw upstream document into a [`Catalog`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::info;

use crate::catalog::{assembler_for, Catalog, CatalogEncoding, CREATED_AT_FORMAT};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::record::StreamRecordBuilder;
use crate::walker::walk_document;

/// Progress is logged every this many packages.
const PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub url_template: String,
    pub max_versions_per_lib: usize,
    pub encoding: CatalogEncoding,
}

impl From<&CatalogConfig> for TransformOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            url_template: config.url_template.clone(),
            max_versions_per_lib: config.max_versions_per_lib,
            encoding: config.encoding,
        }
    }
}

/// Reduces the upstream document read from `reader` into a catalog.
pub fn transform_document<R: Read>(reader: R, options: &TransformOptions) -> Result<Catalog> {
    let created_at = chrono::Local::now().format(CREATED_AT_FORMAT).to_string();
    let mut builder = StreamRecordBuilder::new(options.max_versions_per_lib);
    let mut assembler = assembler_for(options.encoding);

    walk_document(reader, |event| {
        if let Some(entry) = builder.accept(event) {
            assembler.push(entry);
            if assembler.records() % PROGRESS_EVERY == 0 {
                info!(processed = assembler.records(), "[BUILD] Processing libraries");
            }
        }
    })?;
    if let Some(last) = builder.finish() {
        assembler.push(last);
    }

    info!(
        records = assembler.records(),
        encoding = ?options.encoding,
        "[BUILD] Transform done"
    );
    Ok(assembler.finish(created_at, options.url_template.clone()))
}

/// Like [`transform_document`], reading from a file on disk.
pub fn transform_file(path: &Path, options: &TransformOptions) -> Result<Catalog> {
    let file = File::open(path).map_err(|e| CatalogError::io(path, e))?;
    info!(path = %path.display(), "[BUILD] Transforming raw document");
    transform_document(BufReader::new(file), options)
}
