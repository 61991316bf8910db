//! Numeric-aware version ordering and per-package version set reduction.
//!
//! Version strings published upstream are free-form (`1.2.0`, `v2.0.0-rc.1`,
//! `2023.01.05`, `latest`). They are ordered by the digit runs they contain:
//! `1.10.0` sorts above `1.2.0`, tags and letters only matter for output.

use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

/// Ordering key extracted from a version string.
///
/// Built from every maximal ASCII digit run in the input. Segments compare as
/// unbounded integers and missing trailing segments count as zero, so
/// `1.0 == 1` and `1.2 < 1.10`.
#[derive(Debug, Clone)]
pub struct VersionKey {
    segments: Vec<String>,
}

impl VersionKey {
    pub fn parse(version: &str) -> Self {
        let segments: Vec<String> = DIGIT_RUNS
            .find_iter(version)
            .map(|m| m.as_str().to_string())
            .collect();
        if segments.is_empty() {
            return VersionKey {
                segments: vec!["0".to_string(), "0".to_string()],
            };
        }
        VersionKey { segments }
    }

    /// The dotted numeric form the key compares on, e.g. `"1.2.0"` for `v1.2.0-beta`.
    pub fn normalized(&self) -> String {
        self.segments.join(".")
    }

    fn segment(&self, index: usize) -> &str {
        self.segments
            .get(index)
            .map(|s| s.trim_start_matches('0'))
            .unwrap_or("")
    }
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    // Leading zeros already stripped: the longer run is the larger number.
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| compare_digits(self.segment(i), other.segment(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionKey {}

/// Orders, deduplicates and bounds the versions published for one package.
///
/// `raw` is sorted newest-first by [`VersionKey`] (stable, so equal keys keep
/// their encounter order). A non-empty `latest` is placed first even when it
/// does not occur in `raw`; later duplicates of it are dropped. The result
/// holds at most `max_versions` entries.
pub fn reduce_versions<S: AsRef<str>>(raw: &[S], latest: &str, max_versions: usize) -> Vec<String> {
    let mut sorted: Vec<&str> = raw.iter().map(|v| v.as_ref()).collect();
    sorted.sort_by_cached_key(|v| Reverse(VersionKey::parse(v)));

    let head = (!latest.is_empty()).then_some(latest);
    let mut seen = HashSet::new();
    head.into_iter()
        .chain(sorted)
        .filter(|v| seen.insert(*v))
        .take(max_versions)
        .map(str::to_string)
        .collect()
}
