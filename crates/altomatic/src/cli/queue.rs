//! The `altomatic queue` command: submit assets and run the batch jobs.

use std::sync::Arc;
use std::time::Instant;

use altomatic_core::dispatch::{JobReport, LocalQueue};
use altomatic_core::BatchDispatcher;
use clap::Args;

use super::context::{actor, Context};
use super::progress::BarReporter;

/// Arguments for the `queue` command.
#[derive(Args, Debug)]
pub struct QueueArgs {
    /// Asset ids to queue
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub ids: Vec<u64>,

    /// Queue every image asset in the catalog
    #[arg(long)]
    pub all: bool,

    /// Jobs to run at the same time (overrides dispatch.parallel_jobs)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Acting user id recorded in the audit log
    #[arg(long, env = "ALTOMATIC_USER_ID")]
    pub user_id: Option<u64>,

    /// Acting username recorded in the audit log
    #[arg(long, env = "ALTOMATIC_USER")]
    pub user: Option<String>,

    /// Acting user's email recorded in the audit log
    #[arg(long, env = "ALTOMATIC_USER_EMAIL")]
    pub email: Option<String>,
}

pub async fn execute(args: QueueArgs, ctx: Context) -> anyhow::Result<()> {
    let store = ctx.store().await?;
    let audit = ctx.audit()?;
    let pipeline = ctx.pipeline(store.clone());

    let parallel = args.parallel.unwrap_or(ctx.config.dispatch.parallel_jobs);
    let queue = Arc::new(LocalQueue::with_reporter(
        pipeline,
        parallel,
        Arc::new(BarReporter::new()),
    ));
    let dispatcher =
        BatchDispatcher::new(ctx.config.clone(), store, queue.clone()).with_audit(audit);

    let actor = actor(args.user_id, args.user, args.email);
    let start = Instant::now();

    let response = if args.all {
        dispatcher.submit_all(actor.as_ref()).await
    } else if let [id] = args.ids[..] {
        dispatcher.submit_asset(id, actor.as_ref()).await
    } else {
        dispatcher.submit_selection(&args.ids, actor.as_ref()).await
    };
    println!("{}", serde_json::to_string(&response)?);

    if !response.ok {
        anyhow::bail!(
            "{}",
            response.error.as_deref().unwrap_or("Submission refused")
        );
    }

    let reports = queue.drain().await;
    print_summary(&reports, start.elapsed());
    Ok(())
}

/// Totals across all job reports: (written, skipped, failed).
fn totals(reports: &[JobReport]) -> (usize, usize, usize) {
    reports.iter().fold((0, 0, 0), |(ok, skip, fail), r| {
        (ok + r.succeeded(), skip + r.skipped(), fail + r.failed())
    })
}

/// Print a formatted summary table after the jobs finish.
fn print_summary(reports: &[JobReport], elapsed: std::time::Duration) {
    let (written, skipped, failed) = totals(reports);
    let total = written + skipped + failed;
    let rate = if elapsed.as_secs_f64() > 0.0 {
        total as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Jobs:         {:>8}", reports.len());
    eprintln!("    Written:      {:>8}", written);
    if skipped > 0 {
        eprintln!("    Skipped:      {:>8}", skipped);
    }
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");

    for result in reports
        .iter()
        .flat_map(|r| &r.results)
        .filter(|r| !r.succeeded && !r.skipped)
    {
        tracing::debug!(
            asset_id = result.asset_id,
            "Failed: {}",
            result.error_reason.as_deref().unwrap_or("unknown")
        );
    }
}
