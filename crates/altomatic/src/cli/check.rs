//! The `altomatic check` command: report provider readiness.

use serde::Serialize;

use super::context::Context;

#[derive(Serialize)]
struct CheckReport<'a> {
    provider: &'a str,
    target_field: String,
    ready: bool,
    errors: Vec<String>,
}

pub async fn execute(ctx: Context) -> anyhow::Result<()> {
    let readiness = ctx.config.is_configured();
    let report = CheckReport {
        provider: ctx.config.generation.provider.as_str(),
        target_field: ctx.config.generation.target_field.to_string(),
        ready: readiness.ready,
        errors: readiness.errors,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.ready {
        anyhow::bail!("Provider '{}' is not configured", report.provider);
    }
    Ok(())
}
