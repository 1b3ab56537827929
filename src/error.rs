//! Error types for Cachet
//!
//! All modules use `CachetResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Cachet operations
pub type CachetResult<T> = Result<T, CachetError>;

/// All errors that can occur in Cachet
#[derive(Error, Debug)]
pub enum CachetError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Integrity secret too short: {length} characters, minimum is {min}")]
    SecretTooShort { length: usize, min: usize },

    #[error("Integrity secret not set. Export it via the configured env var (default CACHET_SECRET)")]
    SecretMissing,

    // Manifest errors
    #[error("Invalid manifest in {operation}: {reason}")]
    ManifestSchema { operation: String, reason: String },

    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    // Bounds errors
    #[error("Manifest exceeds file limit: {files} files, profile allows {max}")]
    TooManyFiles { files: usize, max: usize },

    #[error("Manifest exceeds size limit: {bytes} bytes, profile allows {max}")]
    TotalSizeExceeded { bytes: u64, max: u64 },

    // Integrity errors
    #[error("Manifest integrity check failed: {reason}")]
    IntegrityFailed { reason: String },

    #[error("Manifest is not signed (no HMAC header)")]
    SignatureMissing,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl CachetError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a manifest schema error naming the failing operation
    pub fn schema(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ManifestSchema {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error is fatal configuration misuse (never retried)
    pub fn is_config_fatal(&self) -> bool {
        matches!(
            self,
            Self::SecretTooShort { .. } | Self::SecretMissing | Self::ConfigInvalid { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SecretMissing => Some("Run: export CACHET_SECRET=<at least 16 characters>"),
            Self::SecretTooShort { .. } => Some("Use a secret of at least 16 characters"),
            Self::SignatureMissing => Some("Sign the manifest first: cachet build"),
            Self::TooManyFiles { .. } | Self::TotalSizeExceeded { .. } => {
                Some("Tighten [build] patterns or raise the [limits] profile")
            }
            _ => None,
        }
    }
}
