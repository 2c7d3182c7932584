//! The `altomatic generate` command: caption one asset synchronously.

use altomatic_core::{CaptionOutcome, SkipReason};
use clap::Args;

use super::context::Context;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Asset id from the catalog
    pub id: u64,

    /// Replace an existing value in the target field
    #[arg(long)]
    pub overwrite: bool,
}

pub async fn execute(args: GenerateArgs, ctx: Context) -> anyhow::Result<()> {
    let ctx = if args.overwrite {
        let mut config = (*ctx.config).clone();
        config.generation.overwrite_existing = true;
        ctx.with_config(config)
    } else {
        ctx
    };

    let store = ctx.store().await?;
    let pipeline = ctx.pipeline(store);

    let outcome = pipeline.generate(args.id).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome {
        CaptionOutcome::Written { .. } => Ok(()),
        CaptionOutcome::Skipped(SkipReason::NotConfigured(errors)) => {
            anyhow::bail!("Not configured: {}", errors.join(" "))
        }
        CaptionOutcome::Skipped(reason) => {
            tracing::info!("Asset {} skipped: {reason}", args.id);
            Ok(())
        }
    }
}
