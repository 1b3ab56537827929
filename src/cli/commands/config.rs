//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_NAME};
use crate::error::{CachetError, CachetResult};
use crate::ui::{self, UiContext};
use tokio::fs;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config) -> CachetResult<()> {
    let manager = ConfigManager::new();

    match args.action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => show_path(&manager),
        Some(ConfigAction::Init { force }) => init_config(&manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            if local {
                set_local_value(&key, &value).await?
            } else {
                set_value(&manager, config, &key, &value).await?
            }
        }
    }

    Ok(())
}

fn show_config(config: &Config) {
    let toml =
        toml::to_string_pretty(config).unwrap_or_else(|_| "Error serializing config".to_string());
    println!("{}", toml);
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> CachetResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn(
            &ctx,
            &format!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            ),
        );
        return Ok(());
    }

    let config = Config::default();
    manager.save(&config).await?;

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> CachetResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    // Parse dot-separated key path
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["build", "patterns"] => config.build.patterns = parse_list(value),
        ["build", "manifest_path"] => config.build.manifest_path = value.into(),
        ["build", "preserve_backup"] => config.build.preserve_backup = parse_bool(value)?,
        ["build", "min_file_size"] => config.build.min_file_size = parse_u64(value)?,
        ["build", "max_file_size"] => config.build.max_file_size = parse_u64(value)?,

        ["versioning", "manual_version"] => {
            config.versioning.manual_version = Some(value.to_string())
        }
        ["versioning", "auto_version"] => config.versioning.auto_version = parse_bool(value)?,
        ["versioning", "tracked_files"] => config.versioning.tracked_files = parse_list(value),
        ["versioning", "ignore_patterns"] => config.versioning.ignore_patterns = parse_list(value),

        ["sync", "full_update_threshold"] => {
            config.sync.full_update_threshold = parse_u64(value)?
        }
        ["sync", "min_delta_benefit"] => config.sync.min_delta_benefit = parse_f64(value)?,
        ["sync", "network_speed_mbps"] => config.sync.network_speed_mbps = parse_f64(value)?,
        ["sync", "critical_weight"] => config.sync.critical_weight = parse_f64(value)?,
        ["sync", "critical_patterns"] => config.sync.critical_patterns = parse_list(value),

        ["integrity", "enabled"] => config.integrity.enabled = parse_bool(value)?,
        ["integrity", "secret_env"] => config.integrity.secret_env = value.to_string(),

        _ => {
            ui::step_warn(&ctx, &format!("Unknown config key: {}", key));
            return Ok(());
        }
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Edit the project-local file in place, keeping its comments intact.
async fn set_local_value(key: &str, value: &str) -> CachetResult<()> {
    let ctx = UiContext::detect();

    let cwd = std::env::current_dir()
        .map_err(|e| CachetError::io("resolving current directory", e))?;
    let local_path = cwd.join(LOCAL_CONFIG_NAME);

    let mut doc: toml_edit::DocumentMut = if local_path.exists() {
        let content = fs::read_to_string(&local_path)
            .await
            .map_err(|e| CachetError::io(format!("reading {}", local_path.display()), e))?;
        content
            .parse()
            .map_err(|e: toml_edit::TomlError| CachetError::ConfigInvalid {
                path: local_path.clone(),
                reason: e.to_string(),
            })?
    } else {
        toml_edit::DocumentMut::new()
    };

    let Some((section, field)) = key.split_once('.') else {
        ui::step_warn(&ctx, &format!("Key must be section.field, got: {}", key));
        return Ok(());
    };

    let item = parse_toml_value(value);
    doc[section][field] = toml_edit::Item::Value(item);

    // Round-trip through the typed config to reject bad keys or values
    let merged: Result<Config, _> = toml::from_str(&doc.to_string());
    if let Err(e) = merged {
        return Err(CachetError::ConfigInvalid {
            path: local_path,
            reason: e.to_string(),
        });
    }

    fs::write(&local_path, doc.to_string())
        .await
        .map_err(|e| CachetError::io(format!("writing {}", local_path.display()), e))?;

    ui::step_ok(&ctx, &format!("Set {} = {} in {}", key, value, local_path.display()));
    Ok(())
}

fn parse_toml_value(value: &str) -> toml_edit::Value {
    if let Ok(b) = value.parse::<bool>() {
        return b.into();
    }
    if let Ok(i) = value.parse::<i64>() {
        return i.into();
    }
    if let Ok(f) = value.parse::<f64>() {
        return f.into();
    }
    if value.contains(',') {
        return value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<toml_edit::Array>()
            .into();
    }
    value.into()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> CachetResult<bool> {
    value
        .parse()
        .map_err(|_| CachetError::User(format!("Expected true or false, got: {}", value)))
}

fn parse_u64(value: &str) -> CachetResult<u64> {
    value
        .parse()
        .map_err(|_| CachetError::User(format!("Expected an integer, got: {}", value)))
}

fn parse_f64(value: &str) -> CachetResult<f64> {
    value
        .parse()
        .map_err(|_| CachetError::User(format!("Expected a number, got: {}", value)))
}
