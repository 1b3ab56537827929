//! Content hashing for change detection
//!
//! Revisions are a pure function of file bytes: identical bytes always
//! produce the same hex digest under a fixed algorithm. Unreadable files
//! yield `None` so callers exclude them instead of failing the build.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Number of hex characters kept by [`short_digest`]
pub const SHORT_DIGEST_LEN: usize = 12;

/// Digest algorithm used for manifest revisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (default)
    #[default]
    Sha256,
    /// MD5 - faster, weaker; fine for change detection, never for integrity
    Md5,
}

impl HashAlgorithm {
    /// Hash a byte slice to a lowercase hex digest
    pub fn digest_bytes(&self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
            Self::Md5 => hex::encode(Md5::digest(bytes)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Md5 => write!(f, "md5"),
        }
    }
}

/// Hash a file's contents, returning `None` if it cannot be read.
///
/// A missing or unreadable file is not an error: the caller drops the
/// file from the manifest and the build continues.
pub fn digest_file(path: &Path, algorithm: HashAlgorithm) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(algorithm.digest_bytes(&bytes)),
        Err(e) => {
            debug!("Skipping unreadable file {}: {}", path.display(), e);
            None
        }
    }
}

/// Hash a string to a truncated 12-hex-char identifier.
///
/// Used for cache epoch version strings; these are change-detection keys,
/// not tamper-resistant signatures.
pub fn short_digest(input: &str) -> String {
    let full = hex::encode(Sha256::digest(input.as_bytes()));
    full[..SHORT_DIGEST_LEN].to_string()
}
