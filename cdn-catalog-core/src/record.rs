//! Package record accumulation.
//!
//! [`StreamRecordBuilder`] turns the flat token stream produced by
//! [`crate::walker`] into finished [`CatalogEntry`] values, one package at a
//! time. Tokens are classified through [`FIELD_SLOTS`]; the reappearance of a
//! `name` token marks the boundary between two packages.

use serde::Serialize;
use tracing::{debug, warn};

use crate::version::reduce_versions;
use crate::walker::RawPackageEvent;

/// Longest description kept in a catalog entry, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;
/// Keywords kept per catalog entry.
pub const MAX_KEYWORDS: usize = 10;

/// Package fields the builder cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    LatestVersion,
    Filename,
    Description,
    AssetVersion,
    Keyword,
}

/// Field path → token kind, for the upstream `{"results": [...]}` layout.
pub const FIELD_SLOTS: &[(&str, TokenKind)] = &[
    ("results.item.name", TokenKind::Name),
    ("results.item.version", TokenKind::LatestVersion),
    ("results.item.filename", TokenKind::Filename),
    ("results.item.description", TokenKind::Description),
    ("results.item.assets.item.version", TokenKind::AssetVersion),
    ("results.item.keywords.item", TokenKind::Keyword),
];

impl TokenKind {
    pub fn classify(path: &str) -> Option<TokenKind> {
        FIELD_SLOTS
            .iter()
            .find(|(slot, _)| *slot == path)
            .map(|(_, kind)| *kind)
    }
}

/// The package currently being parsed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingRecord {
    pub name: String,
    pub description: String,
    pub filename: String,
    pub declared_latest_version: String,
    pub asset_versions: Vec<String>,
    pub keywords: Vec<String>,
}

impl PendingRecord {
    fn apply(&mut self, kind: TokenKind, value: &str) {
        match kind {
            TokenKind::Name => self.name = value.to_string(),
            TokenKind::LatestVersion => self.declared_latest_version = value.to_string(),
            TokenKind::Filename => self.filename = value.to_string(),
            TokenKind::Description => self.description = value.to_string(),
            TokenKind::AssetVersion => self.asset_versions.push(value.to_string()),
            TokenKind::Keyword => self.keywords.push(value.to_string()),
        }
    }

    /// Converts the accumulated fields into a catalog entry.
    pub fn finalize(self, max_versions: usize) -> CatalogEntry {
        let versions = reduce_versions(
            &self.asset_versions,
            &self.declared_latest_version,
            max_versions,
        );
        let mut keywords = self.keywords;
        keywords.truncate(MAX_KEYWORDS);
        CatalogEntry {
            name: self.name,
            description: truncate_chars(&self.description, MAX_DESCRIPTION_CHARS),
            filename: self.filename,
            versions,
            keywords,
        }
    }
}

/// Cuts `s` after `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// A finished package record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub filename: String,
    pub versions: Vec<String>,
    pub keywords: Vec<String>,
}

/// Token-driven state machine emitting one [`CatalogEntry`] per package.
#[derive(Debug)]
pub struct StreamRecordBuilder {
    max_versions: usize,
    pending: Option<PendingRecord>,
    emitted: usize,
}

impl StreamRecordBuilder {
    pub fn new(max_versions: usize) -> Self {
        Self {
            max_versions,
            pending: None,
            emitted: 0,
        }
    }

    /// Number of entries emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Feeds one token. Returns the previous package when `event` starts a new one.
    pub fn accept(&mut self, event: RawPackageEvent<'_>) -> Option<CatalogEntry> {
        let kind = TokenKind::classify(event.path)?;
        let Some(value) = event.value.as_str() else {
            debug!(path = event.path, value = ?event.value, "Ignoring non-string value");
            return None;
        };

        let (finished, mut pending) = match (kind, self.pending.take()) {
            // A second name closes the package that owns the first one.
            (TokenKind::Name, Some(current)) if !current.name.is_empty() => {
                (self.seal(current), PendingRecord::default())
            }
            (_, current) => (None, current.unwrap_or_default()),
        };
        pending.apply(kind, value);
        self.pending = Some(pending);
        finished
    }

    /// Ends the stream, emitting the last package if it has a name.
    pub fn finish(mut self) -> Option<CatalogEntry> {
        let last = self.pending.take()?;
        self.seal(last)
    }

    fn seal(&mut self, record: PendingRecord) -> Option<CatalogEntry> {
        if record.name.is_empty() {
            warn!(
                filename = %record.filename,
                versions = record.asset_versions.len(),
                "Dropping package record without a name"
            );
            return None;
        }
        self.emitted += 1;
        Some(record.finalize(self.max_versions))
    }
}
