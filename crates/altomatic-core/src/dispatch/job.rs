//! Batch jobs and their execution.

use serde::Serialize;

use crate::pipeline::CaptionPipeline;
use crate::types::{AssetId, CaptionResult};

/// A bounded slice of assets submitted to a job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchJob {
    pub asset_ids: Vec<AssetId>,
    pub description: String,
}

impl BatchJob {
    pub fn new(asset_ids: Vec<AssetId>, description: impl Into<String>) -> Self {
        Self {
            asset_ids,
            description: description.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.asset_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asset_ids.is_empty()
    }
}

/// Receives fractional progress (0.0..=1.0) while a job runs.
pub trait ProgressSink: Send + Sync {
    fn set_progress(&self, fraction: f64);

    /// Called once after the last item.
    fn finish(&self, _report: &JobReport) {}
}

/// Sink that drops progress updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_progress(&self, _fraction: f64) {}
}

/// Per-item results of one executed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub description: String,
    pub results: Vec<CaptionResult>,
}

impl JobReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    /// Items that needed no caption (already set, or not an image).
    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.skipped).count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.succeeded && !r.skipped)
            .count()
    }
}

/// Runs one batch job item by item.
pub struct GenerateJob {
    job: BatchJob,
}

impl GenerateJob {
    pub fn new(job: BatchJob) -> Self {
        Self { job }
    }

    /// Caption every asset in order, reporting `(i + 1) / total` after each.
    ///
    /// A failing item is logged and recorded; the remaining items still run.
    pub async fn execute(&self, pipeline: &CaptionPipeline, progress: &dyn ProgressSink) -> JobReport {
        let total = self.job.asset_ids.len().max(1) as f64;
        let mut results = Vec::with_capacity(self.job.asset_ids.len());

        tracing::info!(
            job = %self.job.description,
            assets = self.job.asset_ids.len(),
            "Job started"
        );

        for (i, &asset_id) in self.job.asset_ids.iter().enumerate() {
            let result = match pipeline.generate(asset_id).await {
                Ok(outcome) => CaptionResult::from_outcome(asset_id, outcome),
                Err(e) => {
                    tracing::error!(asset_id, job = %self.job.description, "{e}");
                    CaptionResult::failed(asset_id, e)
                }
            };
            results.push(result);
            progress.set_progress((i + 1) as f64 / total);
        }

        let report = JobReport {
            description: self.job.description.clone(),
            results,
        };
        tracing::info!(
            job = %report.description,
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Job finished"
        );
        progress.finish(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{ProviderError, StoreError};
    use crate::providers::CaptionProvider;
    use crate::store::{AssetStore, CatalogStore};
    use crate::types::{Asset, ImageLocator};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct EchoProvider;

    #[async_trait]
    impl CaptionProvider for EchoProvider {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn try_caption(&self, image: &ImageLocator) -> Result<String, ProviderError> {
            Ok(format!("Image at {image}"))
        }
    }

    /// Store that refuses to save one particular asset.
    struct FlakyStore {
        inner: CatalogStore,
        broken: u64,
    }

    #[async_trait]
    impl AssetStore for FlakyStore {
        async fn images(&self) -> Result<Vec<Asset>, StoreError> {
            self.inner.images().await
        }

        async fn get(&self, id: u64) -> Result<Option<Asset>, StoreError> {
            self.inner.get(id).await
        }

        async fn save(&self, asset: &Asset) -> Result<(), StoreError> {
            if asset.id == self.broken {
                return Err(StoreError::Backend("database is locked".into()));
            }
            self.inner.save(asset).await
        }
    }

    #[derive(Default)]
    struct Recorder {
        fractions: Mutex<Vec<f64>>,
    }

    impl ProgressSink for Recorder {
        fn set_progress(&self, fraction: f64) {
            self.fractions.lock().unwrap().push(fraction);
        }
    }

    fn pipeline(broken: u64) -> CaptionPipeline {
        let assets = (1..=4).map(|id| {
            let mut asset = Asset::image(id, format!("{id}.jpg"));
            asset.url = Some(format!("https://cdn.example.com/{id}.jpg"));
            asset
        });
        let mut config = Config::default();
        config.providers.openai.api_key = Some("sk-test".into());
        CaptionPipeline::new(
            Arc::new(config),
            Arc::new(EchoProvider),
            Arc::new(FlakyStore {
                inner: CatalogStore::in_memory(assets),
                broken,
            }),
        )
    }

    #[tokio::test]
    async fn test_progress_fractions() {
        let job = GenerateJob::new(BatchJob::new(vec![1, 2, 3, 4], "test"));
        let recorder = Recorder::default();
        job.execute(&pipeline(0), &recorder).await;
        assert_eq!(*recorder.fractions.lock().unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[tokio::test]
    async fn test_failing_item_does_not_abort_job() {
        let job = GenerateJob::new(BatchJob::new(vec![1, 2, 3, 4], "test"));
        let report = job.execute(&pipeline(2), &NoProgress).await;

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        assert!(!report.results[1].succeeded);
        assert!(report.results[1]
            .error_reason
            .as_deref()
            .unwrap()
            .contains("database is locked"));
        assert_eq!(
            report.results[3].caption.as_deref(),
            Some("Image at https://cdn.example.com/4.jpg")
        );
    }

    #[tokio::test]
    async fn test_skips_are_reported_as_unsucceeded() {
        let job = GenerateJob::new(BatchJob::new(vec![1, 99], "test"));
        let report = job.execute(&pipeline(0), &NoProgress).await;
        assert!(report.results[0].succeeded);
        assert_eq!(report.results[1].error_reason.as_deref(), Some("asset not found"));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_already_captioned_counts_as_skipped() {
        let pipeline = pipeline(0);
        GenerateJob::new(BatchJob::new(vec![1, 2], "first"))
            .execute(&pipeline, &NoProgress)
            .await;

        let report = GenerateJob::new(BatchJob::new(vec![1, 2, 3], "second"))
            .execute(&pipeline, &NoProgress)
            .await;
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn test_empty_job() {
        let job = GenerateJob::new(BatchJob::new(vec![], "empty"));
        let recorder = Recorder::default();
        let report = job.execute(&pipeline(0), &recorder).await;
        assert!(report.results.is_empty());
        assert!(recorder.fractions.lock().unwrap().is_empty());
    }
}
