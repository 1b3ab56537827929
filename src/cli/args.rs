//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cachet - Incremental precache manifest engine
///
/// Keeps an offline cache manifest synchronized with the latest build
/// output without re-hashing the world or re-downloading unchanged bytes.
#[derive(Parser, Debug)]
#[command(name = "cachet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CACHET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .cachet.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the manifest and compute the update plan
    Build(BuildArgs),

    /// Diff two precache manifest files
    Diff(DiffArgs),

    /// Compute the update strategy between two asset manifests
    Plan(PlanArgs),

    /// Expand a changed key through the route dependency graph
    Cascade(CascadeArgs),

    /// Verify a signed manifest
    Verify(VerifyArgs),

    /// Show project detection and manifest state
    Status(StatusArgs),

    /// Initialize a project-local .cachet.toml config
    Init(InitArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Project root (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Output format for the build report
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the diff command
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Current manifest file
    pub current: PathBuf,

    /// Previous manifest file
    pub previous: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Current asset manifest (SW manifest JSON)
    pub current: PathBuf,

    /// Previous asset manifest (SW manifest JSON)
    pub previous: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the cascade command
#[derive(Parser, Debug)]
pub struct CascadeArgs {
    /// The changed route or file key
    pub key: String,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Path to the signed manifest
    pub manifest: PathBuf,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Project root (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .cachet.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., sync.network_speed_mbps)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .cachet.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Output format for report-producing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
