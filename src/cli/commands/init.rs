//! Init command - create project-local .cachet.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{CachetError, CachetResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# Cachet project configuration
# Settings here override your global config (~/.config/cachet/config.toml)

[build]
# patterns = ["dist/**"]
# manifest_path = ".cachet/manifest.json"
# preserve_backup = true

[versioning]
# tracked_files = ["index.html"]
# manual_version = "v2"
# auto_version = true

[sync]
# network_speed_mbps = 10.0
# critical_patterns = ["index.html", "*.css"]

# [integrity]
# enabled = true
# secret_env = "CACHET_SECRET"

# [[routes]]
# key = "/checkout"
# dependencies = ["/api/cart", "/api/user"]
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> CachetResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| CachetError::io("resolving current directory", e))?,
    };

    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(CachetError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| CachetError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> CachetResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| CachetError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
