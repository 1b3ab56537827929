//! Manifest payload signing and verification
//!
//! A keyed digest over the manifest bytes detects tampering between the
//! build machine and the deploy target. Comparison is constant-time:
//! unequal lengths fail immediately, equal lengths are XOR-accumulated
//! over every byte so the running time never depends on where the inputs
//! first diverge.

use crate::error::{CachetError, CachetResult};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Minimum accepted secret length in characters
pub const MIN_SECRET_LEN: usize = 16;

/// Leading-line convention for signed payloads
const SIGNATURE_PREFIX: &str = "// HMAC: ";

/// Keyed digest algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Outcome of verifying a signed payload
///
/// On success neither signature is echoed back. On failure both are kept
/// for local debugging only; this struct must never cross a network
/// boundary.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub expected: Option<String>,
    pub provided: Option<String>,
}

impl VerifyOutcome {
    fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            expected: None,
            provided: None,
        }
    }

    fn invalid(error: impl Into<String>, expected: String, provided: String) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
            expected: Some(expected),
            provided: Some(provided),
        }
    }
}

/// Signs and verifies manifest payloads
pub struct IntegrityGuard;

impl IntegrityGuard {
    /// Sign content with a keyed digest, returning a hex signature.
    ///
    /// Secrets shorter than [`MIN_SECRET_LEN`] characters are rejected
    /// outright; this is fatal configuration misuse, never padded or
    /// retried.
    pub fn sign(
        content: &[u8],
        secret: &str,
        algorithm: SignatureAlgorithm,
    ) -> CachetResult<String> {
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(CachetError::SecretTooShort {
                length: secret.chars().count(),
                min: MIN_SECRET_LEN,
            });
        }

        let signature = match algorithm {
            SignatureAlgorithm::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                    .map_err(|e| CachetError::Internal(format!("hmac key setup: {e}")))?;
                mac.update(content);
                hex::encode(mac.finalize().into_bytes())
            }
            SignatureAlgorithm::Sha512 => {
                let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
                    .map_err(|e| CachetError::Internal(format!("hmac key setup: {e}")))?;
                mac.update(content);
                hex::encode(mac.finalize().into_bytes())
            }
        };

        Ok(signature)
    }

    /// Verify content against a supplied signature.
    ///
    /// Recomputes the expected signature and compares with a length-checked
    /// constant-time equality. A caller with integrity checking enabled
    /// must not use the manifest when `is_valid` is false.
    pub fn verify(
        content: &[u8],
        signature: &str,
        secret: &str,
        algorithm: SignatureAlgorithm,
    ) -> CachetResult<VerifyOutcome> {
        let expected = Self::sign(content, secret, algorithm)?;

        if constant_time_eq(&expected, signature) {
            Ok(VerifyOutcome::valid())
        } else {
            Ok(VerifyOutcome::invalid(
                format!("{algorithm} signature mismatch"),
                expected,
                signature.to_string(),
            ))
        }
    }

    /// Prefix a payload with its signature header line.
    pub fn attach(content: &str, signature: &str) -> String {
        format!("{SIGNATURE_PREFIX}{signature}\n{content}")
    }
}

/// Split an optional `// HMAC: <signature>` leading line from a payload.
///
/// Returns the signature (if present) and the body without the header.
pub fn extract_signature(content: &str) -> (Option<String>, &str) {
    let Some(rest) = content.strip_prefix(SIGNATURE_PREFIX) else {
        return (None, content);
    };
    match rest.split_once('\n') {
        Some((signature, body)) => (Some(signature.trim().to_string()), body),
        None => (Some(rest.trim().to_string()), ""),
    }
}

/// Length-checked constant-time comparison.
///
/// Unequal lengths fail immediately; equal lengths go through a full
/// XOR-accumulating pass regardless of content.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-long-enough-test-secret";

    #[test]
    fn sign_rejects_short_secret() {
        let err = IntegrityGuard::sign(b"payload", "short", SignatureAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, CachetError::SecretTooShort { length: 5, min: 16 }));

        // 15 characters still fails, 16 passes
        assert!(IntegrityGuard::sign(b"p", &"x".repeat(15), SignatureAlgorithm::Sha256).is_err());
        assert!(IntegrityGuard::sign(b"p", &"x".repeat(16), SignatureAlgorithm::Sha256).is_ok());
    }

    #[test]
    fn verify_accepts_resigned_payload() {
        let payload = br#"[{"url":"/app.js","revision":"abc"}]"#;
        let sig = IntegrityGuard::sign(payload, SECRET, SignatureAlgorithm::Sha256).unwrap();

        let outcome =
            IntegrityGuard::verify(payload, &sig, SECRET, SignatureAlgorithm::Sha256).unwrap();
        assert!(outcome.is_valid);
        // Success exposes no secret-derived material
        assert!(outcome.expected.is_none());
        assert!(outcome.provided.is_none());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn verify_rejects_single_byte_change() {
        let payload = b"manifest body v1";
        let sig = IntegrityGuard::sign(payload, SECRET, SignatureAlgorithm::Sha256).unwrap();

        let tampered = b"manifest body v2";
        let outcome =
            IntegrityGuard::verify(tampered, &sig, SECRET, SignatureAlgorithm::Sha256).unwrap();
        assert!(!outcome.is_valid);
        assert!(!outcome.errors.is_empty());
        assert!(outcome.expected.is_some());
        assert_eq!(outcome.provided.as_deref(), Some(sig.as_str()));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let payload = b"manifest body";
        let sig = IntegrityGuard::sign(payload, SECRET, SignatureAlgorithm::Sha256).unwrap();

        let outcome = IntegrityGuard::verify(
            payload,
            &sig,
            "different-secret-of-length",
            SignatureAlgorithm::Sha256,
        )
        .unwrap();
        assert!(!outcome.is_valid);
    }

    #[test]
    fn sha512_signatures_differ_from_sha256() {
        let payload = b"manifest body";
        let s256 = IntegrityGuard::sign(payload, SECRET, SignatureAlgorithm::Sha256).unwrap();
        let s512 = IntegrityGuard::sign(payload, SECRET, SignatureAlgorithm::Sha512).unwrap();
        assert_eq!(s256.len(), 64);
        assert_eq!(s512.len(), 128);
        assert_ne!(s256, s512);
    }

    #[test]
    fn attach_and_extract_roundtrip() {
        let body = "{\"assets\":[]}";
        let sig = IntegrityGuard::sign(body.as_bytes(), SECRET, SignatureAlgorithm::Sha256).unwrap();

        let signed = IntegrityGuard::attach(body, &sig);
        assert!(signed.starts_with("// HMAC: "));

        let (extracted, stripped) = extract_signature(&signed);
        assert_eq!(extracted.as_deref(), Some(sig.as_str()));
        assert_eq!(stripped, body);

        let outcome =
            IntegrityGuard::verify(stripped.as_bytes(), &sig, SECRET, SignatureAlgorithm::Sha256)
                .unwrap();
        assert!(outcome.is_valid);
    }

    #[test]
    fn extract_without_header_returns_body() {
        let (sig, body) = extract_signature("{\"assets\":[]}");
        assert!(sig.is_none());
        assert_eq!(body, "{\"assets\":[]}");
    }

    #[test]
    fn constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("abcd", "abcd"));
        assert!(!constant_time_eq("abcd", "abce"));
    }
}
