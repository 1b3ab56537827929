//! Diff command - compare two precache manifest files

use crate::cli::args::{DiffArgs, OutputFormat};
use crate::error::{CachetError, CachetResult};
use crate::integrity::extract_signature;
use crate::manifest::{DeltaComputer, PrecacheEntry};
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the diff command
pub async fn execute(args: DiffArgs) -> CachetResult<()> {
    let ctx = UiContext::detect();

    let current = read_manifest(&args.current)?;
    let previous = read_manifest(&args.previous)?;

    let result = DeltaComputer::compute(&current, &previous);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            for delta in result.deltas.iter().filter(|d| d.has_changed()) {
                println!("{}\t{}", delta.change, delta.url);
            }
        }
        OutputFormat::Table => {
            ui::intro(&ctx, "Manifest Diff");
            ui::info_line(&ctx, "Total files", &result.metadata.total_files.to_string());
            ui::info_line(&ctx, "Changed", &result.metadata.changed_files.to_string());
            ui::info_line(&ctx, "Unchanged", &result.metadata.unchanged_files.to_string());
            ui::info_line(&ctx, "Bytes saved", &result.size_savings.to_string());

            if result.metadata.changed_files > 0 {
                ui::section(&ctx, "Changes");
                for delta in result.deltas.iter().filter(|d| d.has_changed()) {
                    ui::info_line(&ctx, &delta.change.to_string(), &delta.url);
                }
                ui::outro_warn(&ctx, "Manifests differ");
            } else {
                ui::outro_success(&ctx, "Manifests are identical");
            }
        }
    }

    Ok(())
}

/// Explicitly named inputs must exist; unlike the build pipeline there is
/// no empty-manifest fallback here.
fn read_manifest(path: &Path) -> CachetResult<Vec<PrecacheEntry>> {
    if !path.is_file() {
        return Err(CachetError::ManifestNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| CachetError::io(format!("reading manifest {}", path.display()), e))?;
    let (_, body) = extract_signature(&content);
    Ok(serde_json::from_str(body)?)
}
