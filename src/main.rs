//! Cachet - Incremental precache manifest engine
//!
//! CLI entry point that dispatches to subcommands.

use cachet::cli::{Cli, Commands};
use cachet::config::ConfigManager;
use cachet::error::CachetResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CachetResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("cachet=warn"),
        1 => EnvFilter::new("cachet=info"),
        _ => EnvFilter::new("cachet=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Init command doesn't need config loading
    if let Commands::Init(args) = cli.command {
        return cachet::cli::commands::init(args).await;
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| cachet::error::CachetError::io("resolving current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Dispatch to command
    match cli.command {
        Commands::Init(_) => unreachable!("Init handled above"),
        Commands::Build(args) => cachet::cli::commands::build(args, &config).await,
        Commands::Diff(args) => cachet::cli::commands::diff(args).await,
        Commands::Plan(args) => cachet::cli::commands::plan(args, &config).await,
        Commands::Cascade(args) => cachet::cli::commands::cascade(args, &config).await,
        Commands::Verify(args) => cachet::cli::commands::verify(args, &config).await,
        Commands::Status(args) => cachet::cli::commands::status(args, &config).await,
        Commands::Config(args) => cachet::cli::commands::config(args, &config).await,
    }
}
