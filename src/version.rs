//! Cache epoch versioning
//!
//! Decides whether the whole cache epoch must roll over, either from a
//! pinned manual version string or by hashing a set of tracked files.
//! Version strings are change-detection keys only; tamper resistance is
//! the integrity module's job.

use crate::error::{CachetError, CachetResult};
use crate::hasher::{digest_file, short_digest, HashAlgorithm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A stored cache epoch: aggregate version plus per-file hashes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheVersion {
    /// Short aggregate hash (12 hex chars) over all tracked files
    pub version: String,

    /// When this epoch was computed
    pub timestamp: DateTime<Utc>,

    /// Per-file content hashes, keyed by path relative to the project root
    pub file_hashes: BTreeMap<String, String>,
}

/// Versioning options
#[derive(Debug, Clone, Default)]
pub struct VersionConfig {
    /// Pinned version string; when set, auto-hashing is skipped entirely
    pub manual_version: Option<String>,

    /// Hash tracked files to derive the version automatically
    pub auto_version: bool,

    /// Patterns excluded from tracked-file hashing
    pub ignore_patterns: Vec<String>,
}

/// Why (or why not) the cache epoch rolls over
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDecision {
    pub should_invalidate: bool,
    pub reason: String,
    /// Paths whose hash changed, when auto-versioning found any
    pub changed_paths: Vec<String>,
    /// The epoch to store going forward, when one was computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_version: Option<CacheVersion>,
}

impl VersionDecision {
    fn keep(reason: impl Into<String>) -> Self {
        Self {
            should_invalidate: false,
            reason: reason.into(),
            changed_paths: Vec::new(),
            new_version: None,
        }
    }

    fn invalidate(reason: impl Into<String>, new_version: Option<CacheVersion>) -> Self {
        Self {
            should_invalidate: true,
            reason: reason.into(),
            changed_paths: Vec::new(),
            new_version,
        }
    }
}

/// Decides cache epoch rollover
pub struct VersionPolicy;

impl VersionPolicy {
    /// Decide whether the cache epoch must roll over.
    ///
    /// Priority: a manual version wins outright; otherwise auto-versioning
    /// hashes the tracked files; otherwise nothing invalidates.
    pub fn decide(
        tracked_files: &[&Path],
        root: &Path,
        previous: Option<&CacheVersion>,
        config: &VersionConfig,
    ) -> CachetResult<VersionDecision> {
        if let Some(manual) = &config.manual_version {
            return Ok(Self::decide_manual(manual, previous));
        }

        if config.auto_version {
            return Self::decide_auto(tracked_files, root, previous, config);
        }

        Ok(VersionDecision::keep("versioning disabled"))
    }

    fn decide_manual(manual: &str, previous: Option<&CacheVersion>) -> VersionDecision {
        let epoch = CacheVersion {
            version: manual.to_string(),
            timestamp: Utc::now(),
            file_hashes: BTreeMap::new(),
        };
        match previous {
            Some(prev) if prev.version == manual => {
                VersionDecision::keep(format!("manual version {manual} unchanged"))
            }
            Some(prev) => VersionDecision::invalidate(
                format!("manual version changed: {} -> {}", prev.version, manual),
                Some(epoch),
            ),
            None => VersionDecision::invalidate(
                format!("manual version {manual} set with no stored epoch"),
                Some(epoch),
            ),
        }
    }

    fn decide_auto(
        tracked_files: &[&Path],
        root: &Path,
        previous: Option<&CacheVersion>,
        config: &VersionConfig,
    ) -> CachetResult<VersionDecision> {
        let file_hashes = Self::hash_tracked(tracked_files, root, &config.ignore_patterns)?;
        let version = Self::aggregate_version(&file_hashes);
        let epoch = CacheVersion {
            version: version.clone(),
            timestamp: Utc::now(),
            file_hashes: file_hashes.clone(),
        };

        let Some(prev) = previous else {
            return Ok(VersionDecision::invalidate("no stored version (cold start)", Some(epoch)));
        };

        let changed_paths: Vec<String> = file_hashes
            .iter()
            .filter(|(path, hash)| prev.file_hashes.get(*path) != Some(*hash))
            .map(|(path, _)| path.clone())
            .collect();

        if !changed_paths.is_empty() {
            debug!("Tracked files changed: {:?}", changed_paths);
            let mut decision = VersionDecision::invalidate(
                format!("{} tracked file(s) changed", changed_paths.len()),
                Some(epoch),
            );
            decision.changed_paths = changed_paths;
            return Ok(decision);
        }

        // Cross-check against hash-combination collisions. Unreachable when
        // the aggregate function is correct, except for deletions, which
        // drop a pair from the sorted join.
        if prev.version != version {
            return Ok(VersionDecision::invalidate(
                format!("aggregate version changed: {} -> {}", prev.version, version),
                Some(epoch),
            ));
        }

        Ok(VersionDecision::keep(format!("version {version} unchanged")))
    }

    fn hash_tracked(
        tracked_files: &[&Path],
        root: &Path,
        ignore_patterns: &[String],
    ) -> CachetResult<BTreeMap<String, String>> {
        let mut hashes = BTreeMap::new();
        for path in tracked_files {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            if ignore_patterns.iter().any(|p| pattern_matches(&relative, p)) {
                continue;
            }

            if let Some(hash) = digest_file(path, HashAlgorithm::Sha256) {
                hashes.insert(relative, hash);
            }
        }
        if hashes.is_empty() && !tracked_files.is_empty() {
            return Err(CachetError::Internal(
                "auto-versioning enabled but no tracked file could be hashed".to_string(),
            ));
        }
        Ok(hashes)
    }

    /// Aggregate version: sorted `path:hash` pairs joined with `|`, hashed,
    /// truncated to 12 hex chars. The sort makes the result independent of
    /// file-system enumeration order.
    pub fn aggregate_version(file_hashes: &BTreeMap<String, String>) -> String {
        let joined = file_hashes
            .iter()
            .map(|(path, hash)| format!("{path}:{hash}"))
            .collect::<Vec<_>>()
            .join("|");
        short_digest(&joined)
    }
}

/// Minimal `*`-wildcard match: exact, prefix (`foo*`), suffix (`*foo`),
/// or contains (`*foo*`). Full glob expansion is the scanner's concern.
fn pattern_matches(path: &str, pattern: &str) -> bool {
    match (pattern.starts_with('*'), pattern.ends_with('*')) {
        (true, true) => {
            let inner = pattern.trim_matches('*');
            !inner.is_empty() && path.contains(inner)
        }
        (true, false) => path.ends_with(pattern.trim_start_matches('*')),
        (false, true) => path.starts_with(pattern.trim_end_matches('*')),
        (false, false) => path == pattern,
    }
}
