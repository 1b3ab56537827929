//! End-to-end build pipeline
//!
//! Wires the engine together: scan -> build -> bounds gate -> diff ->
//! cascade -> version decision -> sync plan -> sign -> save. Metrics are
//! carried in a caller-owned collector threaded through the run; nothing
//! here touches process-wide state, so repeated builds in one process
//! cannot leak into each other.

use crate::bounds::{BoundsValidator, LimitsProfile};
use crate::config::Config;
use crate::detect::{detect_project, Framework};
use crate::error::{CachetError, CachetResult};
use crate::graph::DependencyGraph;
use crate::integrity::IntegrityGuard;
use crate::manifest::{
    BuildConfig, DeltaComputer, ManifestBuilder, ManifestStore, PrecacheDeltaResult, PrecacheEntry,
};
use crate::scan::{glob_match, scan_candidates};
use crate::sync::{DeltaSyncResult, SwAsset, SwManifest, SyncConfig, SyncStrategySelector};
use crate::version::{CacheVersion, VersionConfig, VersionDecision, VersionPolicy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stored cache epoch file, kept next to the manifest
const VERSION_FILE: &str = "version.json";

/// Caller-owned counters for one build invocation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetrics {
    pub candidates_scanned: usize,
    pub entries_built: usize,
    pub bytes_total: u64,
    pub warnings: usize,
    pub duration_ms: u64,
}

/// Everything one build run produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub framework: Framework,
    pub manifest_path: PathBuf,
    pub warnings: Vec<String>,
    pub delta: PrecacheDeltaResult,
    /// Changed urls expanded through the route dependency graph
    pub invalidated_keys: Vec<String>,
    pub version: VersionDecision,
    pub plan: DeltaSyncResult,
    pub signed: bool,
}

/// Run the full pipeline against a project root.
///
/// `secret` is required when `[integrity]` is enabled; the bounds gate
/// runs before anything is persisted, so an oversized manifest leaves the
/// previous snapshot untouched.
pub fn run_build(
    config: &Config,
    root: &Path,
    secret: Option<&str>,
    metrics: &mut BuildMetrics,
) -> CachetResult<BuildReport> {
    let started = std::time::Instant::now();

    let detection = detect_project(root);
    let profile = config
        .limits
        .apply(LimitsProfile::for_framework(detection.framework));
    info!("Detected framework: {}", detection.framework);

    let review = BoundsValidator::review_patterns(&config.build.patterns, &profile);
    for warning in &review.warnings {
        warn!("{}", warning);
    }

    let candidates = scan_candidates(root, &review.patterns)?;
    metrics.candidates_scanned = candidates.len();

    let build_config = BuildConfig {
        min_file_size: config.build.min_file_size,
        max_file_size: config.build.max_file_size,
        hash_algorithm: config.build.hash_algorithm,
    };
    let entries = ManifestBuilder::build(&candidates, &build_config);
    metrics.entries_built = entries.len();
    metrics.bytes_total = crate::manifest::total_size(&entries);

    // Hard gate: an out-of-bounds manifest is never persisted
    BoundsValidator::gate_manifest(&entries, &profile)?;

    let manifest_path = root.join(&config.build.manifest_path);
    let previous = ManifestStore::load(&manifest_path);

    let delta = DeltaComputer::compute(&entries, &previous);
    info!(
        "Delta: {} changed, {} unchanged, {} bytes saved",
        delta.metadata.changed_files, delta.metadata.unchanged_files, delta.size_savings
    );

    let invalidated_keys = expand_invalidations(&delta, &config.routes);

    let version = decide_version(config, root, &manifest_path)?;

    let plan = compute_plan(config, &entries, &previous);

    let payload = serde_json::to_string_pretty(&entries)?;
    let (payload, signed) = if config.integrity.enabled {
        let secret = secret.ok_or(CachetError::SecretMissing)?;
        let signature =
            IntegrityGuard::sign(payload.as_bytes(), secret, config.integrity.algorithm)?;
        (IntegrityGuard::attach(&payload, &signature), true)
    } else {
        (payload, false)
    };

    ManifestStore::save_payload(&manifest_path, &payload, config.build.preserve_backup)?;

    if let Some(epoch) = &version.new_version {
        save_epoch(&manifest_path, epoch)?;
    }

    metrics.warnings = review.warnings.len();
    metrics.duration_ms = started.elapsed().as_millis() as u64;

    Ok(BuildReport {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        framework: detection.framework,
        manifest_path,
        warnings: review.warnings,
        delta,
        invalidated_keys,
        version,
        plan,
        signed,
    })
}

/// Union of cascades from every changed url, each key once
fn expand_invalidations(
    delta: &PrecacheDeltaResult,
    routes: &[crate::graph::RouteSpec],
) -> Vec<String> {
    if routes.is_empty() {
        return Vec::new();
    }
    let graph = DependencyGraph::from_routes(routes);

    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::new();
    for d in delta.deltas.iter().filter(|d| d.has_changed()) {
        for key in graph.cascade(&d.url) {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    keys
}

fn decide_version(
    config: &Config,
    root: &Path,
    manifest_path: &Path,
) -> CachetResult<VersionDecision> {
    let tracked: Vec<PathBuf> = config
        .versioning
        .tracked_files
        .iter()
        .map(|f| root.join(f))
        .collect();
    let tracked_refs: Vec<&Path> = tracked.iter().map(PathBuf::as_path).collect();

    let previous = load_epoch(manifest_path);
    let version_config = VersionConfig {
        manual_version: config.versioning.manual_version.clone(),
        auto_version: config.versioning.auto_version,
        ignore_patterns: config.versioning.ignore_patterns.clone(),
    };

    VersionPolicy::decide(&tracked_refs, root, previous.as_ref(), &version_config)
}

fn compute_plan(
    config: &Config,
    current: &[PrecacheEntry],
    previous: &[PrecacheEntry],
) -> DeltaSyncResult {
    let sync_config = SyncConfig {
        full_update_threshold: config.sync.full_update_threshold,
        min_delta_benefit: config.sync.min_delta_benefit,
        network_speed_mbps: config.sync.network_speed_mbps,
        critical_weight: config.sync.critical_weight,
    };

    let current_manifest = to_sw_manifest("current", current, &config.sync.critical_patterns);
    let previous_manifest = to_sw_manifest("previous", previous, &config.sync.critical_patterns);

    SyncStrategySelector::compute(&current_manifest, &previous_manifest, &sync_config)
}

/// Project a precache manifest into the asset-manifest shape the strategy
/// selector works on; criticality comes from the configured patterns.
fn to_sw_manifest(
    version: &str,
    entries: &[PrecacheEntry],
    critical_patterns: &[String],
) -> SwManifest {
    let assets = entries
        .iter()
        .map(|e| {
            let relative = e.url.trim_start_matches('/');
            SwAsset {
                path: e.url.clone(),
                hash: e.revision.clone(),
                size: e.size,
                critical: critical_patterns
                    .iter()
                    .any(|p| glob_match(relative, p) || glob_match(&file_name(relative), p)),
                strategy: None,
            }
        })
        .collect();
    SwManifest::new(version, Utc::now(), assets)
}

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn epoch_path(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(VERSION_FILE)
}

/// Fail-safe epoch load; a corrupt file means a cold start
pub fn load_epoch(manifest_path: &Path) -> Option<CacheVersion> {
    let content = std::fs::read_to_string(epoch_path(manifest_path)).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_epoch(manifest_path: &Path, epoch: &CacheVersion) -> CachetResult<()> {
    let path = epoch_path(manifest_path);
    let json = serde_json::to_string_pretty(epoch)?;
    std::fs::write(&path, json)
        .map_err(|e| CachetError::io(format!("writing version file {}", path.display()), e))?;
    debug!("Stored cache epoch {} at {}", epoch.version, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ChangeKind;
    use tempfile::TempDir;

    fn project() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("app.js"), "console.log(1)").unwrap();
        std::fs::write(dist.join("style.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let mut config = Config::default();
        config.build.patterns = vec!["dist/**".to_string()];
        (dir, config)
    }

    #[test]
    fn first_build_is_all_added() {
        let (dir, config) = project();
        let mut metrics = BuildMetrics::default();

        let report = run_build(&config, dir.path(), None, &mut metrics).unwrap();

        assert_eq!(report.delta.metadata.changed_files, 2);
        assert!(report
            .delta
            .deltas
            .iter()
            .all(|d| d.change == ChangeKind::Added));
        assert!(report.version.should_invalidate); // cold start
        assert!(!report.signed);
        assert_eq!(metrics.entries_built, 2);
        assert!(dir.path().join(".cachet/manifest.json").exists());
        assert!(dir.path().join(".cachet/version.json").exists());
    }

    #[test]
    fn second_build_unchanged_is_noop_delta() {
        let (dir, config) = project();
        let mut metrics = BuildMetrics::default();

        run_build(&config, dir.path(), None, &mut metrics).unwrap();
        let report = run_build(&config, dir.path(), None, &mut metrics).unwrap();

        assert_eq!(report.delta.metadata.changed_files, 0);
        assert_eq!(report.delta.metadata.unchanged_files, 2);
        assert!(!report.version.should_invalidate);
        assert_eq!(report.plan.strategy, crate::sync::SyncStrategy::Delta);
        assert_eq!(report.plan.savings_percentage, 100.0);
    }

    #[test]
    fn modified_file_flows_through_delta_and_version() {
        let (dir, mut config) = project();
        config.versioning.tracked_files = vec!["dist/app.js".to_string()];
        let mut metrics = BuildMetrics::default();

        run_build(&config, dir.path(), None, &mut metrics).unwrap();
        std::fs::write(dir.path().join("dist/app.js"), "console.log(2)").unwrap();
        let report = run_build(&config, dir.path(), None, &mut metrics).unwrap();

        assert_eq!(report.delta.metadata.changed_files, 1);
        assert!(report.version.should_invalidate);
        assert_eq!(report.version.changed_paths, vec!["dist/app.js"]);
        assert_eq!(report.plan.to_add.len(), 1);
    }

    #[test]
    fn routes_cascade_on_change() {
        let (dir, mut config) = project();
        config.routes = vec![
            crate::graph::RouteSpec {
                key: "/checkout".to_string(),
                dependencies: vec!["/dist/app.js".to_string()],
            },
        ];
        let mut metrics = BuildMetrics::default();

        run_build(&config, dir.path(), None, &mut metrics).unwrap();
        std::fs::write(dir.path().join("dist/app.js"), "v2").unwrap();
        let report = run_build(&config, dir.path(), None, &mut metrics).unwrap();

        assert!(report.invalidated_keys.contains(&"/dist/app.js".to_string()));
        assert!(report.invalidated_keys.contains(&"/checkout".to_string()));
    }

    #[test]
    fn bounds_violation_blocks_persistence() {
        let (dir, mut config) = project();
        config.limits.max_files = Some(1);
        let mut metrics = BuildMetrics::default();

        let err = run_build(&config, dir.path(), None, &mut metrics).unwrap_err();
        assert!(matches!(err, CachetError::TooManyFiles { .. }));
        assert!(!dir.path().join(".cachet/manifest.json").exists());
    }

    #[test]
    fn integrity_requires_secret_and_signs() {
        let (dir, mut config) = project();
        config.integrity.enabled = true;
        let mut metrics = BuildMetrics::default();

        let err = run_build(&config, dir.path(), None, &mut metrics).unwrap_err();
        assert!(matches!(err, CachetError::SecretMissing));

        let report = run_build(
            &config,
            dir.path(),
            Some("a-sixteen-char-secret"),
            &mut metrics,
        )
        .unwrap();
        assert!(report.signed);

        let content =
            std::fs::read_to_string(dir.path().join(".cachet/manifest.json")).unwrap();
        assert!(content.starts_with("// HMAC: "));

        // Signed manifest still loads for the next diff
        let loaded = ManifestStore::load(&dir.path().join(".cachet/manifest.json"));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn critical_patterns_mark_assets() {
        let (dir, config) = project();
        let mut metrics = BuildMetrics::default();
        run_build(&config, dir.path(), None, &mut metrics).unwrap();

        let entries = ManifestStore::load(&dir.path().join(".cachet/manifest.json"));
        let manifest = to_sw_manifest("v", &entries, &["*.css".to_string()]);
        let css = manifest.assets.iter().find(|a| a.path.ends_with(".css")).unwrap();
        let js = manifest.assets.iter().find(|a| a.path.ends_with(".js")).unwrap();
        assert!(css.critical);
        assert!(!js.critical);
        assert_eq!(manifest.critical_size, css.size);
    }
}
