//! Service-worker asset manifests and update strategy selection
//!
//! Given two asset manifests, computes the byte-level delta and picks how
//! the update should be rolled out: re-fetch everything, fetch only the
//! delta, or stage critical assets first. The selector is a pure function
//! of its two inputs; diffing a manifest against itself always yields an
//! empty delta.

use crate::error::{CachetError, CachetResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-asset runtime caching mode hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// One asset in a service-worker manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwAsset {
    /// Path the asset is served under
    pub path: String,

    /// Content hash (hex)
    pub hash: String,

    /// Size in bytes
    pub size: u64,

    /// Critical assets are staged first under the critical-first strategy
    #[serde(default)]
    pub critical: bool,

    /// Optional runtime caching mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<CacheMode>,
}

/// A versioned asset manifest with derived size totals
///
/// `total_size` and `critical_size` are recomputed on every construction
/// and after every load; stored values are never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwManifest {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub assets: Vec<SwAsset>,
    pub total_size: u64,
    pub critical_size: u64,
}

impl SwManifest {
    /// Construct a manifest, deriving the size totals from the assets.
    pub fn new(version: impl Into<String>, timestamp: DateTime<Utc>, assets: Vec<SwAsset>) -> Self {
        let total_size = assets.iter().map(|a| a.size).sum();
        let critical_size = assets.iter().filter(|a| a.critical).map(|a| a.size).sum();
        Self {
            version: version.into(),
            timestamp,
            assets,
            total_size,
            critical_size,
        }
    }

    /// Parse and validate a manifest from JSON.
    ///
    /// A malformed payload is a hard error naming the operation and the
    /// invalid field; proceeding on a bad delta input would corrupt the
    /// generated worker. Size totals are recomputed after parsing.
    pub fn from_json(operation: &str, json: &str) -> CachetResult<Self> {
        let parsed: Self = serde_json::from_str(json)
            .map_err(|e| CachetError::schema(operation, e.to_string()))?;
        parsed.validate(operation)?;
        Ok(Self::new(parsed.version, parsed.timestamp, parsed.assets))
    }

    fn validate(&self, operation: &str) -> CachetResult<()> {
        if self.version.trim().is_empty() {
            return Err(CachetError::schema(operation, "field `version` is empty"));
        }
        let mut seen = HashMap::new();
        for (i, asset) in self.assets.iter().enumerate() {
            if asset.path.trim().is_empty() {
                return Err(CachetError::schema(
                    operation,
                    format!("field `assets[{i}].path` is empty"),
                ));
            }
            if asset.hash.trim().is_empty() {
                return Err(CachetError::schema(
                    operation,
                    format!("field `assets[{i}].hash` is empty"),
                ));
            }
            if let Some(first) = seen.insert(asset.path.as_str(), i) {
                return Err(CachetError::schema(
                    operation,
                    format!("field `assets[{i}].path` duplicates `assets[{first}].path` ({})", asset.path),
                ));
            }
        }
        Ok(())
    }
}

/// Update rollout strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStrategy {
    /// Re-fetch the whole manifest
    Full,
    /// Fetch only changed assets
    Delta,
    /// Fetch critical assets first, remainder in the background
    CriticalFirst,
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Delta => write!(f, "delta"),
            Self::CriticalFirst => write!(f, "critical-first"),
        }
    }
}

/// Thresholds and link characteristics for strategy selection
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Above this many download bytes, fall back to a full update
    pub full_update_threshold: u64,

    /// Below this savings percentage, prefer staging critical assets first
    pub min_delta_benefit: f64,

    /// Assumed link speed for the time estimate
    pub network_speed_mbps: f64,

    /// When positive, critical assets are moved to the front of `to_add`
    pub critical_weight: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            full_update_threshold: 5 * 1024 * 1024,
            min_delta_benefit: 20.0,
            network_speed_mbps: 10.0,
            critical_weight: 1.0,
        }
    }
}

/// Result of comparing two asset manifests
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaSyncResult {
    /// New or changed assets, in download order
    pub to_add: Vec<SwAsset>,
    /// Assets no longer in the manifest
    pub to_remove: Vec<SwAsset>,
    /// Assets present and identical on both sides
    pub to_keep: Vec<SwAsset>,
    /// Bytes that must be downloaded
    pub download_size: u64,
    /// Percentage of the previous cache that survives the update
    pub savings_percentage: f64,
    /// Estimated transfer time in milliseconds
    pub estimated_time_ms: u64,
    pub strategy: SyncStrategy,
}

/// Chooses how an update should be staged
pub struct SyncStrategySelector;

impl SyncStrategySelector {
    /// Compute the asset delta and pick a rollout strategy.
    ///
    /// The strategy rules are checked strictly in order; the ordering is
    /// the policy, not an implementation detail:
    /// 1. download size above the full-update threshold => full
    /// 2. savings below the minimum delta benefit and a critical asset in
    ///    the download set => critical-first
    /// 3. otherwise => delta
    pub fn compute(
        current: &SwManifest,
        previous: &SwManifest,
        config: &SyncConfig,
    ) -> DeltaSyncResult {
        let previous_by_path: HashMap<&str, &SwAsset> =
            previous.assets.iter().map(|a| (a.path.as_str(), a)).collect();
        let current_by_path: HashMap<&str, &SwAsset> =
            current.assets.iter().map(|a| (a.path.as_str(), a)).collect();

        let mut to_add = Vec::new();
        let mut to_keep = Vec::new();
        for asset in &current.assets {
            match previous_by_path.get(asset.path.as_str()) {
                Some(prev) if prev.hash == asset.hash => to_keep.push(asset.clone()),
                _ => to_add.push(asset.clone()),
            }
        }

        let to_remove: Vec<SwAsset> = previous
            .assets
            .iter()
            .filter(|a| !current_by_path.contains_key(a.path.as_str()))
            .cloned()
            .collect();

        if config.critical_weight > 0.0 {
            // Stable: critical assets first, original order within groups
            to_add.sort_by_key(|a| !a.critical);
        }

        let download_size: u64 = to_add.iter().map(|a| a.size).sum();
        let removed_size: u64 = to_remove.iter().map(|a| a.size).sum();
        let net_change = download_size as i64 - removed_size as i64;

        let savings_percentage = if previous.total_size == 0 {
            100.0
        } else {
            let retained = previous.total_size as f64 - net_change as f64;
            (retained / previous.total_size as f64 * 100.0).max(0.0)
        };

        let strategy = if download_size > config.full_update_threshold {
            SyncStrategy::Full
        } else if savings_percentage < config.min_delta_benefit
            && to_add.iter().any(|a| a.critical)
        {
            SyncStrategy::CriticalFirst
        } else {
            SyncStrategy::Delta
        };

        let estimated_time_ms = estimate_transfer_ms(download_size, config.network_speed_mbps);

        DeltaSyncResult {
            to_add,
            to_remove,
            to_keep,
            download_size,
            savings_percentage,
            estimated_time_ms,
            strategy,
        }
    }
}

/// `ceil(bytes * 8 / (mbps * 1_000_000) * 1000)` milliseconds
fn estimate_transfer_ms(bytes: u64, mbps: f64) -> u64 {
    if mbps <= 0.0 {
        return 0;
    }
    let seconds = bytes as f64 * 8.0 / (mbps * 1_000_000.0);
    (seconds * 1000.0).ceil() as u64
}
