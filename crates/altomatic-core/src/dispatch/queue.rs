//! Job queue abstraction and an in-process tokio implementation.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::job::{BatchJob, GenerateJob, JobReport, NoProgress, ProgressSink};
use crate::pipeline::CaptionPipeline;

/// External job facility the dispatcher submits to.
pub trait JobQueue: Send + Sync {
    /// Enqueue a job. Must not wait for it to run.
    fn push(&self, job: BatchJob);
}

/// Creates a progress sink for each job as it starts.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, job: &BatchJob) -> Box<dyn ProgressSink>;
}

impl ProgressReporter for NoProgress {
    fn start(&self, _job: &BatchJob) -> Box<dyn ProgressSink> {
        Box::new(NoProgress)
    }
}

/// Runs jobs as tokio tasks, at most `parallel` at a time.
///
/// Items inside one job run sequentially. Must be used from within a tokio
/// runtime. Jobs cannot be cancelled once pushed.
pub struct LocalQueue {
    pipeline: Arc<CaptionPipeline>,
    semaphore: Arc<Semaphore>,
    reporter: Arc<dyn ProgressReporter>,
    handles: Mutex<Vec<JoinHandle<Option<JobReport>>>>,
}

impl LocalQueue {
    pub fn new(pipeline: Arc<CaptionPipeline>, parallel: usize) -> Self {
        Self::with_reporter(pipeline, parallel, Arc::new(NoProgress))
    }

    pub fn with_reporter(
        pipeline: Arc<CaptionPipeline>,
        parallel: usize,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            pipeline,
            semaphore: Arc::new(Semaphore::new(parallel.max(1))),
            reporter,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Jobs pushed but not yet drained.
    pub fn pending(&self) -> usize {
        self.handles.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wait for every pushed job and return their reports in push order.
    pub async fn drain(&self) -> Vec<JobReport> {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(|e| e.into_inner()));
        let mut reports = Vec::with_capacity(handles.len());

        for handle in handles {
            match handle.await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e) => tracing::error!("Job task panicked: {e}"),
            }
        }
        reports
    }
}

impl JobQueue for LocalQueue {
    fn push(&self, job: BatchJob) {
        let pipeline = self.pipeline.clone();
        let semaphore = self.semaphore.clone();
        let reporter = self.reporter.clone();

        tracing::debug!(job = %job.description, assets = job.len(), "Job queued");

        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                tracing::warn!("Job semaphore closed unexpectedly, dropping {}", job.description);
                return None;
            };
            let progress = reporter.start(&job);
            let report = GenerateJob::new(job).execute(&pipeline, progress.as_ref()).await;
            Some(report)
        });

        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ProviderError;
    use crate::providers::CaptionProvider;
    use crate::store::CatalogStore;
    use crate::types::{Asset, ImageLocator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Provider that tracks how many calls are in flight at once.
    struct SlowProvider {
        in_flight: Arc<AtomicU32>,
        max_in_flight: Arc<AtomicU32>,
    }

    #[async_trait]
    impl CaptionProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }

        async fn try_caption(&self, _image: &ImageLocator) -> Result<String, ProviderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("A picture".to_string())
        }
    }

    fn pipeline(max_in_flight: Arc<AtomicU32>) -> Arc<CaptionPipeline> {
        let assets = (1..=6).map(|id| {
            let mut asset = Asset::image(id, format!("{id}.jpg"));
            asset.url = Some(format!("https://cdn.example.com/{id}.jpg"));
            asset
        });
        let mut config = Config::default();
        config.providers.openai.api_key = Some("sk-test".into());
        Arc::new(CaptionPipeline::new(
            Arc::new(config),
            Arc::new(SlowProvider {
                in_flight: Arc::new(AtomicU32::new(0)),
                max_in_flight,
            }),
            Arc::new(CatalogStore::in_memory(assets)),
        ))
    }

    #[tokio::test]
    async fn test_drain_returns_reports_in_push_order() {
        let queue = LocalQueue::new(pipeline(Arc::new(AtomicU32::new(0))), 2);
        queue.push(BatchJob::new(vec![1, 2], "first"));
        queue.push(BatchJob::new(vec![3], "second"));
        assert_eq!(queue.pending(), 2);

        let reports = queue.drain().await;
        assert_eq!(queue.pending(), 0);
        assert_eq!(
            reports.iter().map(|r| r.description.as_str()).collect::<Vec<_>>(),
            vec!["first", "second"]
        );
        assert_eq!(reports[0].succeeded(), 2);
    }

    #[tokio::test]
    async fn test_parallel_jobs_bound() {
        let max_in_flight = Arc::new(AtomicU32::new(0));
        let queue = LocalQueue::new(pipeline(max_in_flight.clone()), 2);
        for id in 1..=6 {
            queue.push(BatchJob::new(vec![id], format!("job {id}")));
        }
        let reports = queue.drain().await;

        assert_eq!(reports.len(), 6);
        assert!(max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_items_within_job_are_sequential() {
        let max_in_flight = Arc::new(AtomicU32::new(0));
        let queue = LocalQueue::new(pipeline(max_in_flight.clone()), 4);
        queue.push(BatchJob::new(vec![1, 2, 3, 4, 5, 6], "one job"));
        let reports = queue.drain().await;

        assert_eq!(reports[0].succeeded(), 6);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }
}
