//! Manifest persistence with single-generation backup
//!
//! Loading is fail-safe: an absent or corrupt manifest becomes an empty
//! one, which forces a full resync on the next diff instead of blocking
//! the build. Saving keeps at most one prior generation at `<path>.backup`.

use crate::error::{CachetError, CachetResult};
use crate::manifest::PrecacheEntry;
use std::path::Path;
use tracing::{debug, warn};

/// Suffix appended to the manifest path for the backup generation
pub const BACKUP_SUFFIX: &str = ".backup";

/// Loads and saves precache manifest snapshots
pub struct ManifestStore;

impl ManifestStore {
    /// Load a manifest, returning an empty one if the file is absent or
    /// does not parse. Corruption never blocks a build.
    pub fn load(path: &Path) -> Vec<PrecacheEntry> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => {
                debug!("No previous manifest at {}", path.display());
                return Vec::new();
            }
        };

        // Signed manifests carry a leading HMAC header; parsing ignores
        // it, verification is the integrity module's concern
        let (_, body) = crate::integrity::extract_signature(&content);
        match serde_json::from_str(body) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Previous manifest at {} is corrupt ({}), forcing full resync",
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Save a manifest, creating parent directories as needed.
    ///
    /// When `preserve_backup` is set and a manifest already exists at
    /// `path`, the existing file is copied to `<path>.backup` before being
    /// overwritten. The copy is best-effort; a failed backup is logged and
    /// the save proceeds.
    pub fn save(
        path: &Path,
        manifest: &[PrecacheEntry],
        preserve_backup: bool,
    ) -> CachetResult<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        Self::save_payload(path, &json, preserve_backup)?;
        debug!(
            "Saved manifest with {} entries to {}",
            manifest.len(),
            path.display()
        );
        Ok(())
    }

    /// Save an already-serialized (possibly signature-prefixed) payload
    /// with the same directory-creation and backup behavior as [`save`].
    ///
    /// [`save`]: ManifestStore::save
    pub fn save_payload(path: &Path, payload: &str, preserve_backup: bool) -> CachetResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CachetError::io(format!("creating manifest directory {}", parent.display()), e)
                })?;
            }
        }

        if preserve_backup && path.exists() {
            let backup = Self::backup_path(path);
            match std::fs::copy(path, &backup) {
                Ok(_) => debug!("Backed up previous manifest to {}", backup.display()),
                Err(e) => warn!("Backup of {} failed: {}", path.display(), e),
            }
        }

        std::fs::write(path, payload)
            .map_err(|e| CachetError::io(format!("writing manifest {}", path.display()), e))?;
        Ok(())
    }

    /// Backup file location for a manifest path
    pub fn backup_path(path: &Path) -> std::path::PathBuf {
        let mut os = path.as_os_str().to_os_string();
        os.push(BACKUP_SUFFIX);
        os.into()
    }
}
