//! Precache manifest data model
//!
//! A manifest is a list of asset references with content revisions, meant
//! to be fetched by a service worker ahead of need. Entries are unique by
//! `url` within one manifest. JSON uses camelCase so the output plugs
//! straight into web build tooling.

pub mod builder;
pub mod delta;
pub mod store;

pub use builder::{BuildConfig, Candidate, ManifestBuilder};
pub use delta::{ChangeKind, DeltaComputer, FileDelta, PrecacheDeltaResult};
pub use store::ManifestStore;

use serde::{Deserialize, Serialize};

/// One asset in a precache manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecacheEntry {
    /// URL the asset is served under
    pub url: String,

    /// Content hash of the file bytes (hex)
    pub revision: String,

    /// File size in bytes
    pub size: u64,

    /// Last modification time, epoch milliseconds
    pub mtime: u64,
}

/// Sum of entry sizes in bytes
pub fn total_size(entries: &[PrecacheEntry]) -> u64 {
    entries.iter().map(|e| e.size).sum()
}
