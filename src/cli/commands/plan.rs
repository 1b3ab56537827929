//! Plan command - pick an update strategy between two asset manifests

use crate::cli::args::{OutputFormat, PlanArgs};
use crate::config::Config;
use crate::error::{CachetError, CachetResult};
use crate::sync::{SwManifest, SyncConfig, SyncStrategySelector};
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the plan command
pub async fn execute(args: PlanArgs, config: &Config) -> CachetResult<()> {
    let ctx = UiContext::detect();

    let current = read_sw_manifest(&args.current)?;
    let previous = read_sw_manifest(&args.previous)?;

    let sync_config = SyncConfig {
        full_update_threshold: config.sync.full_update_threshold,
        min_delta_benefit: config.sync.min_delta_benefit,
        network_speed_mbps: config.sync.network_speed_mbps,
        critical_weight: config.sync.critical_weight,
    };

    let result = SyncStrategySelector::compute(&current, &previous, &sync_config);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            for asset in &result.to_add {
                println!("add\t{}", asset.path);
            }
            for asset in &result.to_remove {
                println!("remove\t{}", asset.path);
            }
        }
        OutputFormat::Table => {
            ui::intro(&ctx, "Update Plan");
            ui::info_line(&ctx, "Strategy", &result.strategy.to_string());
            ui::info_line(&ctx, "To add", &result.to_add.len().to_string());
            ui::info_line(&ctx, "To remove", &result.to_remove.len().to_string());
            ui::info_line(&ctx, "To keep", &result.to_keep.len().to_string());
            ui::info_line(
                &ctx,
                "Download",
                &format!("{} bytes (~{} ms)", result.download_size, result.estimated_time_ms),
            );
            ui::info_line(&ctx, "Savings", &format!("{:.1}%", result.savings_percentage));

            ui::outro_success(
                &ctx,
                &format!("{} update planned", result.strategy),
            );
        }
    }

    Ok(())
}

fn read_sw_manifest(path: &Path) -> CachetResult<SwManifest> {
    if !path.is_file() {
        return Err(CachetError::ManifestNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| CachetError::io(format!("reading manifest {}", path.display()), e))?;
    SwManifest::from_json("plan", &content)
}
