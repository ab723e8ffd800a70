// src/recipe/livecheck.rs

//! Upstream release discovery
//!
//! A formula's `[livecheck]` section names a release listing and a regex
//! whose first capture group is a version. Every match is collected and the
//! newest is compared against the formula's version.

use crate::error::{Error, Result};
use crate::recipe::format::Formula;
use regex::RegexBuilder;
use semver::Version;
use std::cmp::Ordering;

/// Result of a livecheck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivecheckReport {
    /// Version in the formula
    pub current: String,
    /// Newest version found upstream
    pub latest: Option<String>,
    /// Every distinct version found, oldest first
    pub versions: Vec<String>,
}

impl LivecheckReport {
    /// Whether upstream has something newer than the formula
    pub fn is_outdated(&self) -> bool {
        self.latest
            .as_deref()
            .is_some_and(|latest| compare_versions(latest, &self.current) == Ordering::Greater)
    }
}

/// Normalize a dotted version for ordering
///
/// Release versions are not always semver-compliant (`0.36`, `1.2.3.4`), so
/// the first three numeric components become major.minor.patch.
fn to_semver(version: &str) -> Version {
    if let Ok(v) = Version::parse(version) {
        return v;
    }

    let parts: Vec<&str> = version.split('.').collect();
    let major = parts.first().and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
    let minor = parts.get(1).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
    let patch = parts.get(2).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);

    Version::new(major, minor, patch)
}

/// Order two dotted versions
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match to_semver(a).cmp(&to_semver(b)) {
        Ordering::Equal => {}
        ord => return ord,
    }

    // Components past the third
    let tail = |v: &str| -> Vec<u64> {
        v.split('.')
            .skip(3)
            .map(|p| p.parse::<u64>().unwrap_or(0))
            .collect()
    };
    tail(a).cmp(&tail(b))
}

/// Extract every version captured by `pattern` in `body`, oldest first
pub fn extract_versions(body: &str, pattern: &str) -> Result<Vec<String>> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::ValidationError(format!("livecheck regex does not compile: {}", e)))?;

    let mut versions: Vec<String> = re
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();

    versions.sort_by(|a, b| compare_versions(a, b));
    versions.dedup();
    Ok(versions)
}

/// Check `formula` against the listing returned by `fetch`
pub fn check<F>(formula: &Formula, fetch: F) -> Result<LivecheckReport>
where
    F: FnOnce(&str) -> Result<String>,
{
    let livecheck = formula.livecheck.as_ref().ok_or_else(|| {
        Error::NotFound(format!(
            "{} has no [livecheck] section",
            formula.package.name
        ))
    })?;

    let body = fetch(&livecheck.url)?;
    let versions = extract_versions(&body, &livecheck.regex)?;

    Ok(LivecheckReport {
        current: formula.package.version.clone(),
        latest: versions.last().cloned(),
        versions,
    })
}
