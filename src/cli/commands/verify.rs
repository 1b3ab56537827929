//! Verify command - check a signed manifest

use crate::cli::args::VerifyArgs;
use crate::config::Config;
use crate::error::{CachetError, CachetResult};
use crate::integrity::{extract_signature, IntegrityGuard};
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute the verify command
pub async fn execute(args: VerifyArgs, config: &Config) -> CachetResult<()> {
    let ctx = UiContext::detect();

    if !args.manifest.is_file() {
        return Err(CachetError::ManifestNotFound(args.manifest));
    }
    let content = std::fs::read_to_string(&args.manifest)
        .map_err(|e| CachetError::io(format!("reading manifest {}", args.manifest.display()), e))?;

    let (signature, body) = extract_signature(&content);
    let signature = signature.ok_or(CachetError::SignatureMissing)?;

    let secret =
        std::env::var(&config.integrity.secret_env).map_err(|_| CachetError::SecretMissing)?;

    let outcome = IntegrityGuard::verify(
        body.as_bytes(),
        &signature,
        &secret,
        config.integrity.algorithm,
    )?;

    if outcome.is_valid {
        ui::outro_success(&ctx, &format!("{} verified", args.manifest.display()));
        Ok(())
    } else {
        // Signature details stay in debug logs, never in the error itself
        debug!(
            "expected {:?}, provided {:?}",
            outcome.expected, outcome.provided
        );
        Err(CachetError::IntegrityFailed {
            reason: outcome.errors.join("; "),
        })
    }
}
