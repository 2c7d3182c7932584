//! Single-asset caption generation.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, StoreError};
use crate::providers::{finalize_caption, CaptionProvider, MAX_CAPTION_CHARS};
use crate::store::AssetStore;
use crate::types::{AssetId, CaptionOutcome, SkipReason};

use super::guard::AssetLocks;

/// Generates ALT text for one asset and writes it back through the store.
///
/// Re-running on an asset whose target is already filled is a no-op unless
/// `overwrite_existing` is on.
pub struct CaptionPipeline {
    config: Arc<Config>,
    provider: Arc<dyn CaptionProvider>,
    store: Arc<dyn AssetStore>,
    locks: AssetLocks,
}

impl CaptionPipeline {
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn CaptionProvider>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            locks: AssetLocks::new(),
        }
    }

    /// Caption one asset.
    ///
    /// Skips are reported as `CaptionOutcome::Skipped`. Only store failures
    /// are errors; a store validation refusal is logged and the caption is
    /// still reported as written.
    pub async fn generate(&self, asset_id: AssetId) -> PipelineResult<CaptionOutcome> {
        let _guard = self.locks.acquire(asset_id).await;

        let asset = self
            .store
            .get(asset_id)
            .await
            .map_err(|source| PipelineError::Load { asset_id, source })?;
        let Some(mut asset) = asset else {
            tracing::debug!(asset_id, "Asset not found");
            return Ok(CaptionOutcome::Skipped(SkipReason::NotFound));
        };

        if !asset.is_image() {
            tracing::debug!(asset_id, "Not an image, skipping");
            return Ok(CaptionOutcome::Skipped(SkipReason::NotImage));
        }

        let readiness = self.config.is_configured();
        if !readiness.ready {
            tracing::warn!(
                asset_id,
                provider = %self.config.generation.provider,
                "Not configured: {}",
                readiness.errors.join(" ")
            );
            return Ok(CaptionOutcome::Skipped(SkipReason::NotConfigured(
                readiness.errors,
            )));
        }

        let generation = &self.config.generation;
        if !generation.overwrite_existing && asset.has_target_value(&generation.target_field) {
            tracing::debug!(asset_id, target = %generation.target_field, "Target already set");
            return Ok(CaptionOutcome::Skipped(SkipReason::AlreadyHasValue));
        }

        let Some(locator) = asset.image_locator() else {
            tracing::warn!(asset_id, "No public URL or local path for asset");
            return Ok(CaptionOutcome::Skipped(SkipReason::NoImageLocator));
        };

        let max_length = generation.max_length.min(MAX_CAPTION_CHARS);
        let start = std::time::Instant::now();
        let raw = self.provider.generate_caption(Some(&locator)).await;
        let Some(caption) = raw
            .as_deref()
            .and_then(|text| finalize_caption(text, max_length))
        else {
            return Ok(CaptionOutcome::Skipped(SkipReason::NoCaption));
        };

        tracing::debug!(
            asset_id,
            provider = self.provider.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Caption generated"
        );

        asset.set_target_value(&generation.target_field, caption.clone());
        match self.store.save(&asset).await {
            Ok(()) => {}
            Err(StoreError::Validation(errors)) => {
                tracing::error!(
                    asset_id,
                    "Failed to save ALT text: {}",
                    errors.join("; ")
                );
            }
            Err(source) => return Err(PipelineError::Persistence { asset_id, source }),
        }

        tracing::info!(asset_id, target = %generation.target_field, "ALT text written");
        Ok(CaptionOutcome::Written { caption })
    }
}
