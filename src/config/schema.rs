//! Configuration schema for Cachet
//!
//! Global configuration lives at `~/.config/cachet/config.toml`; projects
//! may override it with a local `.cachet.toml`.

use crate::hasher::HashAlgorithm;
use crate::integrity::SignatureAlgorithm;
use crate::graph::RouteSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest build settings
    pub build: BuildSection,

    /// Cache epoch versioning
    pub versioning: VersioningSection,

    /// Update strategy thresholds
    pub sync: SyncSection,

    /// Manifest signing
    pub integrity: IntegritySection,

    /// Overrides for the detected limits profile
    pub limits: LimitsSection,

    /// Route dependency declarations for cascade invalidation
    #[serde(rename = "routes")]
    pub routes: Vec<RouteSpec>,
}

/// Manifest build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Glob patterns selecting candidate files, relative to the project root
    pub patterns: Vec<String>,

    /// Skip files smaller than this (bytes)
    pub min_file_size: u64,

    /// Skip files larger than this (bytes)
    pub max_file_size: u64,

    /// Revision digest algorithm
    pub hash_algorithm: HashAlgorithm,

    /// Where the manifest snapshot is written, relative to the project root
    pub manifest_path: PathBuf,

    /// Keep one backup generation of the previous manifest
    pub preserve_backup: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            patterns: vec!["dist/**".to_string()],
            min_file_size: 0,
            max_file_size: 10 * 1024 * 1024,
            hash_algorithm: HashAlgorithm::Sha256,
            manifest_path: PathBuf::from(".cachet/manifest.json"),
            preserve_backup: true,
        }
    }
}

/// Cache epoch versioning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningSection {
    /// Pinned version string; disables auto-hashing when set
    pub manual_version: Option<String>,

    /// Derive the version from tracked file hashes
    pub auto_version: bool,

    /// Files whose content defines the cache epoch
    pub tracked_files: Vec<String>,

    /// Patterns excluded from tracking
    pub ignore_patterns: Vec<String>,
}

impl Default for VersioningSection {
    fn default() -> Self {
        Self {
            manual_version: None,
            auto_version: true,
            tracked_files: vec!["index.html".to_string()],
            ignore_patterns: vec!["*.map".to_string()],
        }
    }
}

/// Update strategy thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Above this many download bytes, use a full update
    pub full_update_threshold: u64,

    /// Below this savings percentage, prefer critical-first staging
    pub min_delta_benefit: f64,

    /// Assumed link speed for time estimates
    pub network_speed_mbps: f64,

    /// Positive values move critical assets to the front of the download set
    pub critical_weight: f64,

    /// Assets matching these patterns are marked critical
    pub critical_patterns: Vec<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            full_update_threshold: 5 * 1024 * 1024,
            min_delta_benefit: 20.0,
            network_speed_mbps: 10.0,
            critical_weight: 1.0,
            critical_patterns: vec!["index.html".to_string(), "*.css".to_string()],
        }
    }
}

/// Manifest signing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegritySection {
    /// Sign the manifest on save and require verification on use
    pub enabled: bool,

    /// Keyed digest algorithm
    pub algorithm: SignatureAlgorithm,

    /// Environment variable holding the signing secret
    pub secret_env: String,
}

impl Default for IntegritySection {
    fn default() -> Self {
        Self {
            enabled: false,
            algorithm: SignatureAlgorithm::Sha256,
            secret_env: "CACHET_SECRET".to_string(),
        }
    }
}

/// Optional overrides for the detected limits profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub max_files: Option<usize>,
    pub max_total_size: Option<u64>,
    pub max_depth: Option<usize>,
}

impl LimitsSection {
    /// Apply overrides on top of a profile
    pub fn apply(&self, mut profile: crate::bounds::LimitsProfile) -> crate::bounds::LimitsProfile {
        if let Some(max_files) = self.max_files {
            profile.max_files = max_files;
        }
        if let Some(max_total_size) = self.max_total_size {
            profile.max_total_size = max_total_size;
        }
        if let Some(max_depth) = self.max_depth {
            profile.max_depth = max_depth;
        }
        profile
    }
}
