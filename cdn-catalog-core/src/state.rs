//! Plain-text state carried between runs: the build number and the last
//! cache validator of the upstream document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CatalogError, Result};

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CatalogError::io(path, e)),
    }
}

fn write_plain(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| CatalogError::io(path, e))
}

/// Monotonic build counter persisted as a single integer.
#[derive(Debug, Clone)]
pub struct BuildVersioner {
    path: PathBuf,
}

impl BuildVersioner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Last committed build number, `0` when nothing was committed yet.
    pub fn current(&self) -> Result<u64> {
        let Some(content) = read_optional(&self.path)? else {
            debug!(path = %self.path.display(), "No build version file, starting at 0");
            return Ok(0);
        };
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed
            .parse::<u64>()
            .map_err(|_| CatalogError::InvalidBuildVersion {
                path: self.path.clone(),
                content: trimmed.to_string(),
            })
    }

    /// The number the next build gets. Nothing is persisted.
    pub fn next(&self) -> Result<u64> {
        let current = self.current()?;
        current
            .checked_add(1)
            .ok_or_else(|| CatalogError::InvalidBuildVersion {
                path: self.path.clone(),
                content: current.to_string(),
            })
    }

    /// Records `version` as the last completed build.
    ///
    /// Call only once the catalog file for `version` is fully written.
    pub fn commit(&self, version: u64) -> Result<()> {
        write_plain(&self.path, &version.to_string())?;
        info!(path = %self.path.display(), version, "Committed build version");
        Ok(())
    }
}

/// Last seen cache validator (ETag) of the upstream document.
#[derive(Debug, Clone)]
pub struct ValidatorStore {
    path: PathBuf,
}

impl ValidatorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored validator, or `None` if there is none or it is empty.
    pub fn load(&self) -> Result<Option<String>> {
        Ok(read_optional(&self.path)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// Stores `validator`; `None` clears the file so the next run re-downloads.
    pub fn store(&self, validator: Option<&str>) -> Result<()> {
        write_plain(&self.path, validator.unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioner_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let versioner = BuildVersioner::new(dir.path().join("builds_version"));
        assert_eq!(versioner.current().unwrap(), 0);
        assert_eq!(versioner.next().unwrap(), 1);
    }

    #[test]
    fn next_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let versioner = BuildVersioner::new(dir.path().join("builds_version"));
        assert_eq!(versioner.next().unwrap(), versioner.next().unwrap());
        assert!(!dir.path().join("builds_version").exists());
    }

    #[test]
    fn commit_then_current() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds_version");
        let versioner = BuildVersioner::new(&path);
        versioner.commit(7).unwrap();
        assert_eq!(versioner.current().unwrap(), 7);
        assert_eq!(versioner.next().unwrap(), 8);
        assert_eq!(fs::read_to_string(&path).unwrap(), "7");
    }

    #[test]
    fn whitespace_and_empty_files_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds_version");
        fs::write(&path, "12\n").unwrap();
        assert_eq!(BuildVersioner::new(&path).current().unwrap(), 12);
        fs::write(&path, "").unwrap();
        assert_eq!(BuildVersioner::new(&path).current().unwrap(), 0);
    }

    #[test]
    fn garbage_build_version_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds_version");
        fs::write(&path, "twelve").unwrap();
        let err = BuildVersioner::new(&path).current().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBuildVersion { .. }));
    }

    #[test]
    fn exhausted_build_counter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds_version");
        fs::write(&path, u64::MAX.to_string()).unwrap();
        let versioner = BuildVersioner::new(&path);
        assert_eq!(versioner.current().unwrap(), u64::MAX);
        let err = versioner.next().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBuildVersion { .. }));
    }

    #[test]
    fn validator_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = ValidatorStore::new(dir.path().join("etag"));
        assert_eq!(store.load().unwrap(), None);
        store.store(Some("W/\"abc\"")).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("W/\"abc\""));
        store.store(None).unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
