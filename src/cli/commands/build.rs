//! Build command - run the full manifest pipeline

use crate::cli::args::{BuildArgs, OutputFormat};
use crate::config::Config;
use crate::error::{CachetError, CachetResult};
use crate::pipeline::{run_build, BuildMetrics, BuildReport};
use crate::ui::{self, TaskSpinner, UiContext};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a BuildReport,
    metrics: &'a BuildMetrics,
}

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> CachetResult<()> {
    let ctx = UiContext::detect();

    let root = match args.project {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| CachetError::io("resolving current directory", e))?,
    };

    let secret = if config.integrity.enabled {
        std::env::var(&config.integrity.secret_env).ok()
    } else {
        None
    };

    let mut metrics = BuildMetrics::default();

    // Spinner only for the human-facing format; json and plain stay
    // machine-parseable
    let report = if matches!(args.format, OutputFormat::Table) {
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Building manifest");
        match run_build(config, &root, secret.as_deref(), &mut metrics) {
            Ok(report) => {
                spinner.stop(&format!("Manifest built ({} entries)", metrics.entries_built));
                report
            }
            Err(e) => {
                spinner.stop_error("Build failed");
                return Err(e);
            }
        }
    } else {
        run_build(config, &root, secret.as_deref(), &mut metrics)?
    };

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonReport {
                report: &report,
                metrics: &metrics,
            })?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            for delta in report.delta.deltas.iter().filter(|d| d.has_changed()) {
                println!("{}\t{}", delta.change, delta.url);
            }
        }
        OutputFormat::Table => print_table(&ctx, &report, &metrics),
    }

    Ok(())
}

fn print_table(ctx: &UiContext, report: &BuildReport, metrics: &BuildMetrics) {
    ui::intro(ctx, "Cachet Build");

    ui::info_line(ctx, "Framework", &report.framework.to_string());
    ui::info_line(ctx, "Manifest", &report.manifest_path.display().to_string());
    ui::info_line(
        ctx,
        "Entries",
        &format!("{} ({} bytes)", metrics.entries_built, metrics.bytes_total),
    );

    ui::section(ctx, "Changes");
    ui::info_line(
        ctx,
        "Changed",
        &format!(
            "{} of {} files",
            report.delta.metadata.changed_files, report.delta.metadata.total_files
        ),
    );
    ui::info_line(ctx, "Bytes saved", &report.delta.size_savings.to_string());
    if !report.invalidated_keys.is_empty() {
        ui::info_line(ctx, "Invalidated", &report.invalidated_keys.join(", "));
    }

    ui::section(ctx, "Version");
    if report.version.should_invalidate {
        ui::step_warn(ctx, &format!("Cache invalidated: {}", report.version.reason));
        if let Some(version) = &report.version.new_version {
            ui::info_line(ctx, "New epoch", &version.version);
        }
    } else {
        ui::step_ok(ctx, "Cache epoch unchanged");
    }

    ui::section(ctx, "Update plan");
    ui::info_line(ctx, "Strategy", &report.plan.strategy.to_string());
    ui::info_line(
        ctx,
        "Download",
        &format!(
            "{} assets, {} bytes (~{} ms)",
            report.plan.to_add.len(),
            report.plan.download_size,
            report.plan.estimated_time_ms
        ),
    );
    ui::info_line(
        ctx,
        "Savings",
        &format!("{:.1}%", report.plan.savings_percentage),
    );

    for warning in &report.warnings {
        ui::step_warn(ctx, warning);
    }

    let signed = if report.signed { " (signed)" } else { "" };
    ui::outro_success(
        ctx,
        &format!("Manifest written in {} ms{}", metrics.duration_ms, signed),
    );
}
