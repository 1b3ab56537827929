//! Status command - project detection and manifest state

use crate::cli::args::StatusArgs;
use crate::config::Config;
use crate::detect::detect_project;
use crate::error::{CachetError, CachetResult};
use crate::integrity::extract_signature;
use crate::manifest::ManifestStore;
use crate::pipeline::load_epoch;
use crate::ui::{self, UiContext};

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> CachetResult<()> {
    let ctx = UiContext::detect();

    let root = match args.project {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| CachetError::io("resolving current directory", e))?,
    };

    ui::intro(&ctx, "Cachet Status");

    let detection = detect_project(&root);
    ui::info_line(&ctx, "Framework", &detection.framework.to_string());
    for marker in &detection.markers {
        ui::step_ok(&ctx, marker);
    }

    ui::section(&ctx, "Manifest");
    let manifest_path = root.join(&config.build.manifest_path);
    if manifest_path.is_file() {
        let entries = ManifestStore::load(&manifest_path);
        ui::step_ok_detail(
            &ctx,
            &manifest_path.display().to_string(),
            &format!("{} entries", entries.len()),
        );

        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| CachetError::io(format!("reading {}", manifest_path.display()), e))?;
        match extract_signature(&content).0 {
            Some(_) => ui::step_ok(&ctx, "Signed"),
            None => ui::info_line(&ctx, "Signed", "no"),
        }
    } else {
        ui::step_warn(&ctx, "No manifest yet; run: cachet build");
    }

    ui::section(&ctx, "Cache epoch");
    match load_epoch(&manifest_path) {
        Some(epoch) => {
            ui::info_line(&ctx, "Version", &epoch.version);
            ui::info_line(&ctx, "Tracked files", &epoch.file_hashes.len().to_string());
        }
        None => ui::info_line(&ctx, "Version", "none (cold start)"),
    }

    Ok(())
}
