//! Asset store abstraction.
//!
//! The pipeline, dispatcher and stats collector never own assets; they go
//! through an [`AssetStore`] supplied by the host. The CLI host uses the
//! JSON-backed [`CatalogStore`].

mod catalog;
mod discovery;

pub use catalog::CatalogStore;
pub use discovery::{is_image_path, CatalogScanner, IMAGE_EXTENSIONS};

use crate::error::StoreError;
use crate::types::{Asset, AssetId};
use async_trait::async_trait;

/// Element store the pipeline reads from and writes back to.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Every image-kind asset, in id order.
    async fn images(&self) -> Result<Vec<Asset>, StoreError>;

    /// Ids of every image-kind asset, in id order.
    async fn image_ids(&self) -> Result<Vec<AssetId>, StoreError> {
        Ok(self.images().await?.into_iter().map(|a| a.id).collect())
    }

    /// Look up one asset of any kind.
    async fn get(&self, id: AssetId) -> Result<Option<Asset>, StoreError>;

    /// Persist an updated asset.
    ///
    /// Returns `StoreError::Validation` when the store refuses the element and
    /// any other variant when the write itself failed.
    async fn save(&self, asset: &Asset) -> Result<(), StoreError>;
}
