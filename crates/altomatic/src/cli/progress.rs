//! Terminal progress bars for queued jobs.

use altomatic_core::dispatch::{BatchJob, JobReport, ProgressReporter, ProgressSink};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// One bar per job, stacked in a shared `MultiProgress`.
pub struct BarReporter {
    multi: MultiProgress,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarReporter {
    fn start(&self, job: &BatchJob) -> Box<dyn ProgressSink> {
        let pb = self.multi.add(create_progress_bar(job.len() as u64));
        pb.set_message(job.description.clone());
        Box::new(BarSink {
            pb,
            total: job.len() as u64,
        })
    }
}

struct BarSink {
    pb: ProgressBar,
    total: u64,
}

impl ProgressSink for BarSink {
    fn set_progress(&self, fraction: f64) {
        self.pb.set_position(position(fraction, self.total));
    }

    fn finish(&self, report: &JobReport) {
        self.pb.finish_with_message(format!(
            "{}: {} written, {} skipped, {} failed",
            report.description,
            report.succeeded(),
            report.skipped(),
            report.failed()
        ));
    }
}

/// Map a completed fraction onto a bar of `total` items.
fn position(fraction: f64, total: u64) -> u64 {
    ((fraction.clamp(0.0, 1.0) * total as f64).round() as u64).min(total)
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb
}
