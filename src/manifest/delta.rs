//! Manifest diffing
//!
//! Classifies every url in either manifest as added, modified, deleted,
//! or unchanged. The classification partitions the key union exactly:
//! each url lands in one category and one only. Comparison is key-based,
//! so the result is independent of file enumeration order.

use crate::manifest::PrecacheEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// How an entry changed between two manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Per-url classification with the revisions on each side
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDelta {
    pub url: String,
    pub change: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_revision: Option<String>,
}

impl FileDelta {
    /// True for added, modified, and deleted entries
    pub fn has_changed(&self) -> bool {
        self.change != ChangeKind::Unchanged
    }
}

/// Counters describing one diff
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMetadata {
    pub timestamp: DateTime<Utc>,
    /// Size of the url union across both manifests
    pub total_files: usize,
    /// added + modified + deleted
    pub changed_files: usize,
    pub unchanged_files: usize,
}

/// Full result of diffing a current manifest against a previous one
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecacheDeltaResult {
    /// Entries that must be (re)fetched: added + modified
    pub files_to_cache: Vec<PrecacheEntry>,
    /// Urls that must be evicted: deleted
    pub files_to_remove: Vec<String>,
    pub deltas: Vec<FileDelta>,
    /// Bytes not re-transferred: unchanged current size + modified
    /// previous size + deleted previous size
    pub size_savings: u64,
    pub metadata: DeltaMetadata,
}

/// Computes manifest deltas in O(n)
pub struct DeltaComputer;

impl DeltaComputer {
    /// Classify every entry between two manifests.
    ///
    /// Both inputs are indexed by url first, so a 1,000-entry manifest
    /// diffs in linear time regardless of input order.
    pub fn compute(current: &[PrecacheEntry], previous: &[PrecacheEntry]) -> PrecacheDeltaResult {
        let previous_by_url: HashMap<&str, &PrecacheEntry> =
            previous.iter().map(|e| (e.url.as_str(), e)).collect();
        let current_by_url: HashMap<&str, &PrecacheEntry> =
            current.iter().map(|e| (e.url.as_str(), e)).collect();

        let mut files_to_cache = Vec::new();
        let mut files_to_remove = Vec::new();
        let mut deltas = Vec::with_capacity(current.len());
        let mut size_savings: u64 = 0;
        let mut unchanged_files = 0usize;

        // Deterministic output: walk current sorted by url, then deletions
        let mut current_sorted: Vec<&PrecacheEntry> = current.iter().collect();
        current_sorted.sort_by(|a, b| a.url.cmp(&b.url));

        for entry in current_sorted {
            match previous_by_url.get(entry.url.as_str()) {
                None => {
                    files_to_cache.push(entry.clone());
                    deltas.push(FileDelta {
                        url: entry.url.clone(),
                        change: ChangeKind::Added,
                        previous_revision: None,
                        current_revision: Some(entry.revision.clone()),
                    });
                }
                Some(prev) if prev.revision != entry.revision => {
                    files_to_cache.push(entry.clone());
                    // Stale bytes discarded, not re-fetched
                    size_savings += prev.size;
                    deltas.push(FileDelta {
                        url: entry.url.clone(),
                        change: ChangeKind::Modified,
                        previous_revision: Some(prev.revision.clone()),
                        current_revision: Some(entry.revision.clone()),
                    });
                }
                Some(_) => {
                    size_savings += entry.size;
                    unchanged_files += 1;
                    deltas.push(FileDelta {
                        url: entry.url.clone(),
                        change: ChangeKind::Unchanged,
                        previous_revision: Some(entry.revision.clone()),
                        current_revision: Some(entry.revision.clone()),
                    });
                }
            }
        }

        let mut deleted: Vec<&PrecacheEntry> = previous
            .iter()
            .filter(|e| !current_by_url.contains_key(e.url.as_str()))
            .collect();
        deleted.sort_by(|a, b| a.url.cmp(&b.url));

        for entry in deleted {
            files_to_remove.push(entry.url.clone());
            size_savings += entry.size;
            deltas.push(FileDelta {
                url: entry.url.clone(),
                change: ChangeKind::Deleted,
                previous_revision: Some(entry.revision.clone()),
                current_revision: None,
            });
        }

        let unchanged = unchanged_files;
        let changed = deltas.len() - unchanged;

        PrecacheDeltaResult {
            files_to_cache,
            files_to_remove,
            size_savings,
            metadata: DeltaMetadata {
                timestamp: Utc::now(),
                total_files: changed + unchanged,
                changed_files: changed,
                unchanged_files: unchanged,
            },
            deltas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entry(url: &str, revision: &str, size: u64) -> PrecacheEntry {
        PrecacheEntry {
            url: url.to_string(),
            revision: revision.to_string(),
            size,
            mtime: 0,
        }
    }

    #[test]
    fn all_added_against_empty_previous() {
        let current = vec![entry("/a.js", "1", 10), entry("/b.js", "2", 20)];
        let result = DeltaComputer::compute(&current, &[]);

        assert_eq!(result.files_to_cache, current);
        assert!(result.files_to_remove.is_empty());
        assert!(result.deltas.iter().all(|d| d.change == ChangeKind::Added));
        assert_eq!(result.size_savings, 0);
        assert_eq!(result.metadata.changed_files, 2);
        assert_eq!(result.metadata.unchanged_files, 0);
    }

    #[test]
    fn all_deleted_against_empty_current() {
        let previous = vec![entry("/a.js", "1", 10), entry("/b.js", "2", 20)];
        let result = DeltaComputer::compute(&[], &previous);

        assert!(result.files_to_cache.is_empty());
        assert_eq!(result.files_to_remove, vec!["/a.js", "/b.js"]);
        assert!(result.deltas.iter().all(|d| d.change == ChangeKind::Deleted));
        assert_eq!(result.size_savings, 30);
    }

    #[test]
    fn self_diff_is_all_unchanged() {
        let manifest = vec![entry("/a.js", "1", 10), entry("/b.js", "2", 20)];
        let result = DeltaComputer::compute(&manifest, &manifest);

        assert!(result.files_to_cache.is_empty());
        assert!(result.files_to_remove.is_empty());
        assert!(result
            .deltas
            .iter()
            .all(|d| d.change == ChangeKind::Unchanged));
        assert_eq!(result.size_savings, crate::manifest::total_size(&manifest));
        assert_eq!(result.metadata.total_files, 2);
    }

    #[test]
    fn modified_accumulates_previous_size() {
        let previous = vec![entry("/a.js", "old", 100)];
        let current = vec![entry("/a.js", "new", 150)];
        let result = DeltaComputer::compute(&current, &previous);

        assert_eq!(result.deltas[0].change, ChangeKind::Modified);
        assert_eq!(result.deltas[0].previous_revision.as_deref(), Some("old"));
        assert_eq!(result.deltas[0].current_revision.as_deref(), Some("new"));
        // Savings are the stale bytes being discarded, not the new ones
        assert_eq!(result.size_savings, 100);
        assert_eq!(result.files_to_cache, current);
    }

    #[test]
    fn partition_covers_key_union_exactly_once() {
        let previous = vec![
            entry("/keep.js", "same", 10),
            entry("/mod.js", "old", 20),
            entry("/gone.js", "x", 30),
        ];
        let current = vec![
            entry("/keep.js", "same", 10),
            entry("/mod.js", "new", 25),
            entry("/new.js", "y", 40),
        ];
        let result = DeltaComputer::compute(&current, &previous);

        let urls: Vec<&str> = result.deltas.iter().map(|d| d.url.as_str()).collect();
        let unique: HashSet<&str> = urls.iter().copied().collect();
        assert_eq!(urls.len(), unique.len(), "no url in two categories");

        let union: HashSet<&str> = previous
            .iter()
            .chain(current.iter())
            .map(|e| e.url.as_str())
            .collect();
        assert_eq!(unique, union, "every url classified");

        assert_eq!(result.metadata.changed_files, 3); // mod + gone + new
        assert_eq!(result.metadata.unchanged_files, 1);
        assert_eq!(result.metadata.total_files, 4);
        // unchanged current (10) + modified previous (20) + deleted previous (30)
        assert_eq!(result.size_savings, 60);
    }

    #[test]
    fn order_independent_of_input_order() {
        let previous = vec![entry("/b.js", "1", 10), entry("/a.js", "2", 20)];
        let mut shuffled = previous.clone();
        shuffled.reverse();

        let r1 = DeltaComputer::compute(&previous, &shuffled);
        assert!(r1.deltas.iter().all(|d| d.change == ChangeKind::Unchanged));

        let urls: Vec<&str> = r1.deltas.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["/a.js", "/b.js"]);
    }

    #[test]
    fn large_manifest_diffs_quickly() {
        let current: Vec<PrecacheEntry> = (0..1000)
            .map(|i| entry(&format!("/asset-{i}.js"), &format!("rev{i}"), 100))
            .collect();
        let previous: Vec<PrecacheEntry> = (0..1000)
            .map(|i| {
                let rev = if i % 2 == 0 { format!("rev{i}") } else { "stale".to_string() };
                entry(&format!("/asset-{i}.js"), &rev, 100)
            })
            .collect();

        let start = std::time::Instant::now();
        let result = DeltaComputer::compute(&current, &previous);
        assert!(start.elapsed().as_millis() < 100);
        assert_eq!(result.metadata.total_files, 1000);
    }
}
