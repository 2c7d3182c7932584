//! Coverage counts for the configured target field.

use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreError;
use crate::store::AssetStore;
use crate::types::TargetField;

/// How many image assets have ALT text in the target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub with_target: usize,
    pub without_target: usize,
}

impl Stats {
    /// Share of images that already have a value, in percent.
    pub fn coverage_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.with_target as f64 * 100.0 / self.total as f64
    }
}

pub struct StatsCollector {
    store: Arc<dyn AssetStore>,
    target: TargetField,
}

impl StatsCollector {
    pub fn new(store: Arc<dyn AssetStore>, target: TargetField) -> Self {
        Self { store, target }
    }

    /// Count image assets. A value counts only when non-empty after trimming.
    pub async fn collect(&self) -> Result<Stats, StoreError> {
        let images = self.store.images().await?;
        let total = images.len();
        let with_target = images
            .iter()
            .filter(|asset| asset.has_target_value(&self.target))
            .count();

        Ok(Stats {
            total,
            with_target,
            without_target: total.saturating_sub(with_target),
        })
    }
}
