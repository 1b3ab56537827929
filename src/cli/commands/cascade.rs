//! Cascade command - expand a changed key through the route graph

use crate::cli::args::CascadeArgs;
use crate::config::Config;
use crate::error::CachetResult;
use crate::graph::DependencyGraph;
use crate::ui::{self, UiContext};

/// Execute the cascade command
pub async fn execute(args: CascadeArgs, config: &Config) -> CachetResult<()> {
    let ctx = UiContext::detect();

    if config.routes.is_empty() {
        ui::step_warn(&ctx, "No [[routes]] configured; nothing to cascade");
        println!("{}", args.key);
        return Ok(());
    }

    let graph = DependencyGraph::from_routes(&config.routes);
    let keys = graph.cascade(&args.key);

    for key in &keys {
        println!("{}", key);
    }

    ui::outro_success(
        &ctx,
        &format!("{} key(s) invalidated by {}", keys.len(), args.key),
    );
    Ok(())
}
