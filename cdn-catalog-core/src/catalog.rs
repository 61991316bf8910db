//! Catalog document and its two item encodings.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::record::CatalogEntry;

/// Field order of one record in the stride encoding.
pub const STRIDE_FORMAT: [&str; 5] = ["name", "filename", "description", "keywords", "versions"];

/// Timestamp layout for `created_at`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// How catalog items are laid out in the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogEncoding {
    /// One JSON object per package.
    Object,
    /// One flat string array, [`STRIDE_FORMAT`]-sized groups per package.
    #[default]
    Stride,
}

/// The published catalog document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub created_at: String,
    pub url_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stride_format: Option<[&'static str; 5]>,
    pub items: CatalogItems,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogItems {
    Objects(Vec<CatalogEntry>),
    Stride(Vec<String>),
}

impl CatalogItems {
    /// Number of packages, independent of the encoding.
    pub fn records(&self) -> usize {
        match self {
            CatalogItems::Objects(entries) => entries.len(),
            CatalogItems::Stride(flat) => flat.len() / STRIDE_FORMAT.len(),
        }
    }
}

/// Collects entries in emission order and wraps them into a [`Catalog`].
pub trait CatalogAssembler {
    fn push(&mut self, entry: CatalogEntry);

    fn records(&self) -> usize;

    fn finish(self: Box<Self>, created_at: String, url_template: String) -> Catalog;
}

/// Returns the assembler for `encoding`.
pub fn assembler_for(encoding: CatalogEncoding) -> Box<dyn CatalogAssembler> {
    match encoding {
        CatalogEncoding::Object => Box::new(ObjectAssembler::default()),
        CatalogEncoding::Stride => Box::new(StrideAssembler::default()),
    }
}

#[derive(Debug, Default)]
pub struct ObjectAssembler {
    entries: Vec<CatalogEntry>,
}

impl CatalogAssembler for ObjectAssembler {
    fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    fn records(&self) -> usize {
        self.entries.len()
    }

    fn finish(self: Box<Self>, created_at: String, url_template: String) -> Catalog {
        Catalog {
            created_at,
            url_template,
            stride_format: None,
            items: CatalogItems::Objects(self.entries),
        }
    }
}

#[derive(Debug, Default)]
pub struct StrideAssembler {
    flat: Vec<String>,
}

impl CatalogAssembler for StrideAssembler {
    fn push(&mut self, entry: CatalogEntry) {
        let CatalogEntry {
            name,
            description,
            filename,
            versions,
            keywords,
        } = entry;
        self.flat.extend([
            name,
            filename,
            description,
            keywords.join(","),
            versions.join(","),
        ]);
    }

    fn records(&self) -> usize {
        self.flat.len() / STRIDE_FORMAT.len()
    }

    fn finish(self: Box<Self>, created_at: String, url_template: String) -> Catalog {
        Catalog {
            created_at,
            url_template,
            stride_format: Some(STRIDE_FORMAT),
            items: CatalogItems::Stride(self.flat),
        }
    }
}

/// Serializes `catalog` to `path`, returning the file size in bytes.
///
/// The file is flushed before returning; any failure is reported and the
/// partial file removed.
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<u64> {
    write_whole_file(path, |writer| {
        serde_json::to_writer(writer, catalog).map_err(|e| {
            if e.is_io() {
                CatalogError::io(path, std::io::Error::from(e))
            } else {
                CatalogError::Encode(e)
            }
        })
    })
}

fn write_whole_file<F>(path: &Path, write: F) -> Result<u64>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(path).map_err(|e| CatalogError::io(path, e))?;
    let written: Result<u64> = (|| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| CatalogError::io(path, e.into_error()))?;
        file.sync_all().map_err(|e| CatalogError::io(path, e))?;
        Ok(file.metadata().map_err(|e| CatalogError::io(path, e))?.len())
    })();
    if written.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Could not remove partial catalog");
        }
    }
    written
}

/// Writes `catalog` to any writer (used for stdout output).
pub fn write_catalog_to<W: Write>(mut out: W, catalog: &Catalog) -> Result<()> {
    serde_json::to_writer(&mut out, catalog).map_err(CatalogError::Encode)?;
    out.flush().map_err(|e| CatalogError::io("<output>", e))
}
