//! Manifest construction from candidate file lists
//!
//! The build scanner (upstream) supplies url/path candidate pairs; the
//! builder filters by existence and size, hashes the survivors, and emits
//! a manifest sorted by url for reproducible diffs.

use crate::hasher::{digest_file, HashAlgorithm};
use crate::manifest::PrecacheEntry;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing::debug;

/// A candidate asset discovered by the build scanner
#[derive(Debug, Clone)]
pub struct Candidate {
    /// URL the asset will be served under
    pub url: String,
    /// Path to the file on disk
    pub file_path: PathBuf,
}

/// Filtering and hashing options for a manifest build
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Files smaller than this are skipped (bytes)
    pub min_file_size: u64,
    /// Files larger than this are skipped (bytes)
    pub max_file_size: u64,
    /// Revision digest algorithm
    pub hash_algorithm: HashAlgorithm,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            min_file_size: 0,
            max_file_size: 10 * 1024 * 1024,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

/// Builds precache manifests from candidate lists
pub struct ManifestBuilder;

impl ManifestBuilder {
    /// Build a manifest from candidates.
    ///
    /// Missing files, files outside the configured size window, and files
    /// that cannot be hashed are skipped silently; absence is a soft
    /// failure, never an error. Output is sorted by url.
    pub fn build(candidates: &[Candidate], config: &BuildConfig) -> Vec<PrecacheEntry> {
        let mut entries = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let metadata = match std::fs::metadata(&candidate.file_path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(_) => {
                    debug!("Skipping missing candidate {}", candidate.file_path.display());
                    continue;
                }
            };

            let size = metadata.len();
            if size < config.min_file_size || size > config.max_file_size {
                debug!(
                    "Skipping {} ({} bytes, window {}..{})",
                    candidate.url, size, config.min_file_size, config.max_file_size
                );
                continue;
            }

            let Some(revision) = digest_file(&candidate.file_path, config.hash_algorithm) else {
                continue;
            };

            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);

            entries.push(PrecacheEntry {
                url: candidate.url.clone(),
                revision,
                size,
                mtime,
            });
        }

        entries.sort_by(|a, b| a.url.cmp(&b.url));
        debug!("Built manifest with {} entries", entries.len());
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(url: &str, path: PathBuf) -> Candidate {
        Candidate {
            url: url.to_string(),
            file_path: path,
        }
    }

    #[test]
    fn builds_entries_with_revisions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "console.log('hi')").unwrap();

        let entries = ManifestBuilder::build(
            &[candidate("/app.js", path)],
            &BuildConfig::default(),
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "/app.js");
        assert_eq!(entries[0].size, 17);
        assert_eq!(entries[0].revision.len(), 64);
        assert!(entries[0].mtime > 0);
    }

    #[test]
    fn skips_missing_files() {
        let dir = TempDir::new().unwrap();
        let entries = ManifestBuilder::build(
            &[candidate("/gone.js", dir.path().join("gone.js"))],
            &BuildConfig::default(),
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn skips_files_outside_size_window() {
        let dir = TempDir::new().unwrap();
        let small = dir.path().join("small.js");
        let big = dir.path().join("big.js");
        let ok = dir.path().join("ok.js");
        std::fs::write(&small, "x").unwrap();
        std::fs::write(&big, "x".repeat(1000)).unwrap();
        std::fs::write(&ok, "x".repeat(50)).unwrap();

        let config = BuildConfig {
            min_file_size: 10,
            max_file_size: 100,
            ..Default::default()
        };
        let entries = ManifestBuilder::build(
            &[
                candidate("/small.js", small),
                candidate("/big.js", big),
                candidate("/ok.js", ok),
            ],
            &config,
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "/ok.js");
    }

    #[test]
    fn output_sorted_by_url() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();

        let entries = ManifestBuilder::build(
            &[candidate("/z.js", b), candidate("/a.js", a)],
            &BuildConfig::default(),
        );

        assert_eq!(entries[0].url, "/a.js");
        assert_eq!(entries[1].url, "/z.js");
    }
}
