//! Per-profile manifest bounds
//!
//! Each integration profile carries ceilings on file count, total size,
//! and glob depth. Pattern-shape issues (depth, pattern count) are
//! warnings; a manifest that exceeds the file or size ceiling is a hard
//! error and must not be persisted.

use crate::detect::Framework;
use crate::error::{CachetError, CachetResult};
use crate::manifest::{total_size, PrecacheEntry};
use serde::Serialize;
use tracing::debug;

/// Warn when a pattern list grows beyond this many entries
const PATTERN_COUNT_WARNING: usize = 50;

/// Warn when a single pattern carries more than this many `**` segments
const MAX_RECURSIVE_SEGMENTS: usize = 2;

/// Ceilings for one integration profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsProfile {
    pub max_files: usize,
    pub max_total_size: u64,
    /// Maximum path-separator count allowed in a single pattern
    pub max_depth: usize,
    /// Patterns always excluded, appended negated to every pattern list
    pub ignore_patterns: Vec<String>,
}

impl LimitsProfile {
    /// Profile for a detected framework; `Other` is the conservative default.
    pub fn for_framework(framework: Framework) -> Self {
        let base_ignores = vec![
            "node_modules/**".to_string(),
            "**/*.map".to_string(),
            ".git/**".to_string(),
        ];
        match framework {
            Framework::React | Framework::Vue => Self {
                max_files: 2000,
                max_total_size: 50 * 1024 * 1024,
                max_depth: 8,
                ignore_patterns: base_ignores,
            },
            Framework::Angular => Self {
                max_files: 3000,
                max_total_size: 75 * 1024 * 1024,
                max_depth: 10,
                ignore_patterns: base_ignores,
            },
            Framework::StaticSite => Self {
                max_files: 500,
                max_total_size: 20 * 1024 * 1024,
                max_depth: 6,
                ignore_patterns: base_ignores,
            },
            Framework::Other => Self {
                max_files: 1000,
                max_total_size: 25 * 1024 * 1024,
                max_depth: 6,
                ignore_patterns: base_ignores,
            },
        }
    }
}

/// Reviewed pattern list with accumulated diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct PatternReview {
    /// Input patterns plus the profile's negated ignore patterns
    pub patterns: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Enforces profile ceilings before a manifest is accepted
pub struct BoundsValidator;

impl BoundsValidator {
    /// Review glob patterns against a profile.
    ///
    /// Produces the effective pattern list (ignores appended negated) and
    /// non-fatal shape warnings. Nothing here expands globs.
    pub fn review_patterns(patterns: &[String], limits: &LimitsProfile) -> PatternReview {
        let mut warnings = Vec::new();

        if patterns.len() > PATTERN_COUNT_WARNING {
            warnings.push(format!(
                "{} patterns configured; more than {} slows scanning",
                patterns.len(),
                PATTERN_COUNT_WARNING
            ));
        }

        for pattern in patterns {
            let depth = pattern.matches('/').count();
            if depth > limits.max_depth {
                warnings.push(format!(
                    "pattern `{pattern}` nests {depth} levels deep, profile allows {}",
                    limits.max_depth
                ));
            }

            let recursive = pattern.matches("**").count();
            if recursive > MAX_RECURSIVE_SEGMENTS {
                warnings.push(format!(
                    "pattern `{pattern}` has {recursive} recursive segments; at most {MAX_RECURSIVE_SEGMENTS} is sensible"
                ));
            }
        }

        let mut effective: Vec<String> = patterns.to_vec();
        effective.extend(limits.ignore_patterns.iter().map(|p| format!("!{p}")));

        PatternReview {
            patterns: effective,
            warnings,
            errors: Vec::new(),
        }
    }

    /// Gate a built manifest against the profile ceilings.
    ///
    /// Exceeding the file count or total size is a hard error; the
    /// manifest must not be persisted.
    pub fn gate_manifest(entries: &[PrecacheEntry], limits: &LimitsProfile) -> CachetResult<()> {
        if entries.len() > limits.max_files {
            return Err(CachetError::TooManyFiles {
                files: entries.len(),
                max: limits.max_files,
            });
        }

        let bytes = total_size(entries);
        if bytes > limits.max_total_size {
            return Err(CachetError::TotalSizeExceeded {
                bytes,
                max: limits.max_total_size,
            });
        }

        debug!(
            "Manifest within bounds: {} files, {} bytes",
            entries.len(),
            bytes
        );
        Ok(())
    }
}
