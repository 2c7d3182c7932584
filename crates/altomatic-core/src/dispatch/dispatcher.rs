//! Splitting work into batch jobs and the submission surface around it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::job::BatchJob;
use super::queue::JobQueue;
use crate::audit::{AuditEvent, AuditLog};
use crate::config::Config;
use crate::error::StoreError;
use crate::store::AssetStore;
use crate::types::{Actor, AssetId};

/// Default number of assets per batch job.
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Audit action names.
pub const ACTION_QUEUE_ASSET: &str = "queue-asset";
pub const ACTION_QUEUE_ALL: &str = "queue-all";
pub const ACTION_QUEUE_SELECTION: &str = "queue-selection";

/// What a dispatch call enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    /// Assets covered by the submitted jobs
    pub queued: usize,
    /// Jobs pushed to the queue
    pub jobs: usize,
}

/// JSON reply of the submission surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitResponse {
    pub fn accepted(queued: Option<usize>) -> Self {
        Self {
            ok: true,
            queued,
            error: None,
        }
    }

    pub fn refused(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            queued: None,
            error: Some(error.into()),
        }
    }
}

/// Split `ids` into jobs of at most `chunk_size`, preserving order.
///
/// `describe(i, n)` names the i-th of n jobs (1-based).
pub fn plan_batches(
    ids: &[AssetId],
    chunk_size: usize,
    describe: impl Fn(usize, usize) -> String,
) -> Vec<BatchJob> {
    let chunk_size = chunk_size.max(1);
    let total = ids.len().div_ceil(chunk_size);
    ids.chunks(chunk_size)
        .enumerate()
        .map(|(i, chunk)| BatchJob::new(chunk.to_vec(), describe(i + 1, total)))
        .collect()
}

/// Audit note for a multi-asset submission.
fn batch_notes(dispatched: Dispatched, duplicates: usize) -> String {
    let mut notes = format!("{} batch job(s)", dispatched.jobs);
    if duplicates > 0 {
        notes.push_str(&format!(", {duplicates} duplicate id(s) ignored"));
    }
    notes
}

/// Builds batch jobs and hands them to a [`JobQueue`].
pub struct BatchDispatcher {
    config: Arc<Config>,
    store: Arc<dyn AssetStore>,
    queue: Arc<dyn JobQueue>,
    audit: Option<Arc<AuditLog>>,
}

impl BatchDispatcher {
    pub fn new(config: Arc<Config>, store: Arc<dyn AssetStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            config,
            store,
            queue,
            audit: None,
        }
    }

    /// Record submissions in `audit`.
    pub fn with_audit(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    fn chunk_size(&self) -> usize {
        self.config.dispatch.chunk_size
    }

    fn push_all(&self, jobs: Vec<BatchJob>) -> Dispatched {
        let dispatched = Dispatched {
            queued: jobs.iter().map(BatchJob::len).sum(),
            jobs: jobs.len(),
        };
        for job in jobs {
            self.queue.push(job);
        }
        dispatched
    }

    /// Queue every image asset in the store.
    pub async fn dispatch_all(&self) -> Result<Dispatched, StoreError> {
        let ids = self.store.image_ids().await?;
        let jobs = plan_batches(&ids, self.chunk_size(), |i, n| {
            format!("Altomatic: Generate ALT (batch {i}/{n})")
        });
        let dispatched = self.push_all(jobs);
        tracing::info!(
            queued = dispatched.queued,
            jobs = dispatched.jobs,
            "Queued all image assets"
        );
        Ok(dispatched)
    }

    /// Queue an explicit selection, in the given order.
    pub fn dispatch_many(&self, ids: &[AssetId]) -> Dispatched {
        let jobs = plan_batches(ids, self.chunk_size(), |i, n| {
            format!("Altomatic: Generate ALT for selection (batch {i}/{n})")
        });
        let dispatched = self.push_all(jobs);
        tracing::info!(
            queued = dispatched.queued,
            jobs = dispatched.jobs,
            "Queued selection"
        );
        dispatched
    }

    /// Queue a single asset.
    pub fn dispatch_one(&self, id: AssetId) -> Dispatched {
        self.push_all(vec![BatchJob::new(
            vec![id],
            format!("Altomatic: Generate ALT for asset {id}"),
        )])
    }

    fn readiness_error(&self) -> Option<String> {
        let readiness = self.config.is_configured();
        (!readiness.ready).then(|| readiness.errors.join(" "))
    }

    fn record(&self, actor: Option<&Actor>, event: AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Some(actor) = actor {
            if let Err(e) = audit.register_user(actor) {
                tracing::warn!("Failed to record user {}: {e}", actor.id);
            }
        }
        if let Err(e) = audit.append(&event.by(actor.map(|a| a.id))) {
            tracing::warn!("Failed to append audit entry: {e}");
        }
    }

    /// Submit one asset on behalf of `actor`.
    pub async fn submit_asset(&self, id: AssetId, actor: Option<&Actor>) -> SubmitResponse {
        match self.store.get(id).await {
            Ok(Some(_)) => {}
            Ok(None) => return SubmitResponse::refused("Asset not found."),
            Err(e) => return SubmitResponse::refused(e.to_string()),
        }

        if let Some(error) = self.readiness_error() {
            return SubmitResponse::refused(error);
        }

        self.dispatch_one(id);
        self.record(
            actor,
            AuditEvent::new(ACTION_QUEUE_ASSET).asset(id).count(1),
        );
        SubmitResponse::accepted(None)
    }

    /// Submit every image asset on behalf of `actor`.
    pub async fn submit_all(&self, actor: Option<&Actor>) -> SubmitResponse {
        if let Some(error) = self.readiness_error() {
            return SubmitResponse::refused(error);
        }

        let dispatched = match self.dispatch_all().await {
            Ok(dispatched) => dispatched,
            Err(e) => return SubmitResponse::refused(e.to_string()),
        };

        self.record(
            actor,
            AuditEvent::new(ACTION_QUEUE_ALL)
                .count(dispatched.queued as u64)
                .notes(batch_notes(dispatched, 0)),
        );
        SubmitResponse::accepted(Some(dispatched.queued))
    }

    /// Submit a selection of assets on behalf of `actor`.
    ///
    /// Duplicate ids are queued once; first occurrence wins the position.
    pub async fn submit_selection(&self, ids: &[AssetId], actor: Option<&Actor>) -> SubmitResponse {
        if let Some(error) = self.readiness_error() {
            return SubmitResponse::refused(error);
        }

        let mut seen = std::collections::HashSet::new();
        let unique: Vec<AssetId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if unique.is_empty() {
            return SubmitResponse::refused("No assets selected.");
        }

        let dispatched = self.dispatch_many(&unique);
        self.record(
            actor,
            AuditEvent::new(ACTION_QUEUE_SELECTION)
                .count(dispatched.queued as u64)
                .notes(batch_notes(dispatched, ids.len() - unique.len())),
        );
        SubmitResponse::accepted(Some(dispatched.queued))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::store::CatalogStore;
    use crate::types::{Asset, AssetKind};
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQueue {
        jobs: Mutex<Vec<BatchJob>>,
    }

    impl JobQueue for RecordingQueue {
        fn push(&self, job: BatchJob) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.providers.openai.api_key = Some("sk-test".into());
        config
    }

    fn store(images: u64) -> Arc<CatalogStore> {
        let mut assets: Vec<Asset> = (1..=images)
            .map(|id| Asset::image(id, format!("{id}.jpg")))
            .collect();
        let mut doc = Asset::image(images + 1, "notes.pdf");
        doc.kind = AssetKind::Other;
        assets.push(doc);
        Arc::new(CatalogStore::in_memory(assets))
    }

    fn dispatcher(
        config: Config,
        images: u64,
    ) -> (BatchDispatcher, Arc<RecordingQueue>, Arc<AuditLog>) {
        let queue = Arc::new(RecordingQueue::default());
        let audit = Arc::new(AuditLog::in_memory().unwrap());
        let dispatcher = BatchDispatcher::new(Arc::new(config), store(images), queue.clone())
            .with_audit(audit.clone());
        (dispatcher, queue, audit)
    }

    fn admin() -> Actor {
        Actor {
            id: 1,
            username: "admin".into(),
            email: None,
        }
    }

    #[test]
    fn test_plan_batches_chunking() {
        for n in [0usize, 1, 199, 200, 201, 400, 401, 1000] {
            let ids: Vec<AssetId> = (1..=n as u64).collect();
            let jobs = plan_batches(&ids, 200, |i, t| format!("{i}/{t}"));

            assert_eq!(jobs.len(), n.div_ceil(200), "n = {n}");
            assert!(jobs.iter().all(|j| !j.is_empty() && j.len() <= 200));

            let flat: Vec<AssetId> = jobs.iter().flat_map(|j| j.asset_ids.clone()).collect();
            assert_eq!(flat, ids);
            let unique: HashSet<_> = flat.iter().collect();
            assert_eq!(unique.len(), n);

            if let Some(last) = jobs.last() {
                assert_eq!(last.description, format!("{0}/{0}", jobs.len()));
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_all_only_images() {
        let (dispatcher, queue, _) = dispatcher(configured(), 450);
        let dispatched = dispatcher.dispatch_all().await.unwrap();

        assert_eq!(dispatched, Dispatched { queued: 450, jobs: 3 });
        let jobs = queue.jobs.lock().unwrap();
        assert_eq!(jobs[0].description, "Altomatic: Generate ALT (batch 1/3)");
        assert_eq!(jobs[2].len(), 50);
        assert!(!jobs.iter().any(|j| j.asset_ids.contains(&451)));
    }

    #[tokio::test]
    async fn test_dispatch_all_empty_store() {
        let (dispatcher, queue, _) = dispatcher(configured(), 0);
        let dispatched = dispatcher.dispatch_all().await.unwrap();
        assert_eq!(dispatched, Dispatched { queued: 0, jobs: 0 });
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_asset_queues_and_audits() {
        let (dispatcher, queue, audit) = dispatcher(configured(), 3);
        let response = dispatcher.submit_asset(2, Some(&admin())).await;

        assert_eq!(response, SubmitResponse::accepted(None));
        let jobs = queue.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].description, "Altomatic: Generate ALT for asset 2");

        let logs = audit.recent_logs(10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, ACTION_QUEUE_ASSET);
        assert_eq!(logs[0].asset_id, Some(2));
        assert_eq!(logs[0].count, Some(1));
        assert_eq!(logs[0].username.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_submit_unknown_asset() {
        let (dispatcher, queue, audit) = dispatcher(configured(), 3);
        let response = dispatcher.submit_asset(99, None).await;

        assert_eq!(response, SubmitResponse::refused("Asset not found."));
        assert!(queue.jobs.lock().unwrap().is_empty());
        assert!(audit.recent_logs(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_asset_reported_before_configuration() {
        let mut config = Config::default();
        config.generation.provider = ProviderKind::Azure;
        let (dispatcher, queue, _) = dispatcher(config, 3);

        let response = dispatcher.submit_asset(99, None).await;
        assert_eq!(response, SubmitResponse::refused("Asset not found."));

        let response = dispatcher.submit_asset(1, None).await;
        assert_eq!(response.error.as_deref(), Some("Azure endpoint/key are missing."));
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_refused_when_not_configured() {
        let mut config = Config::default();
        config.generation.provider = ProviderKind::Azure;
        let (dispatcher, queue, _) = dispatcher(config, 3);

        let response = dispatcher.submit_all(None).await;
        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("Azure endpoint/key are missing."));
        assert!(queue.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_all_reports_count() {
        let (dispatcher, _, audit) = dispatcher(configured(), 5);
        let response = dispatcher.submit_all(Some(&admin())).await;

        assert_eq!(response, SubmitResponse::accepted(Some(5)));
        let logs = audit.recent_logs(10).unwrap();
        assert_eq!(logs[0].action, ACTION_QUEUE_ALL);
        assert_eq!(logs[0].count, Some(5));
        assert_eq!(logs[0].asset_id, None);
        assert_eq!(logs[0].notes.as_deref(), Some("1 batch job(s)"));
    }

    #[tokio::test]
    async fn test_submit_selection_dedups() {
        let (dispatcher, queue, audit) = dispatcher(configured(), 5);
        let response = dispatcher.submit_selection(&[3, 1, 3, 2], None).await;

        assert_eq!(response.queued, Some(3));
        assert_eq!(queue.jobs.lock().unwrap()[0].asset_ids, vec![3, 1, 2]);
        assert_eq!(
            queue.jobs.lock().unwrap()[0].description,
            "Altomatic: Generate ALT for selection (batch 1/1)"
        );
        let entry = &audit.recent_logs(1).unwrap()[0];
        assert_eq!(entry.action, ACTION_QUEUE_SELECTION);
        assert_eq!(
            entry.notes.as_deref(),
            Some("1 batch job(s), 1 duplicate id(s) ignored")
        );

        let empty = dispatcher.submit_selection(&[], None).await;
        assert!(!empty.ok);
    }

    #[test]
    fn test_response_json_shape() {
        let json = serde_json::to_string(&SubmitResponse::accepted(Some(412))).unwrap();
        assert_eq!(json, r#"{"ok":true,"queued":412}"#);
        let json = serde_json::to_string(&SubmitResponse::refused("Asset not found.")).unwrap();
        assert_eq!(json, r#"{"ok":false,"error":"Asset not found."}"#);
    }
}
