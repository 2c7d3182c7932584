//! The `altomatic stats` command.

use altomatic_core::StatsCollector;

use super::context::Context;

pub async fn execute(ctx: Context) -> anyhow::Result<()> {
    let store = ctx.store().await?;
    let target = ctx.config.generation.target_field.clone();
    let stats = StatsCollector::new(store, target.clone()).collect().await?;

    tracing::info!(
        "{} of {} images have {} ({:.1}%)",
        stats.with_target,
        stats.total,
        target,
        stats.coverage_percent()
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
