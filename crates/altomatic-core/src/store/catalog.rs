//! JSON-file asset catalog used by the CLI host.

use super::AssetStore;
use crate::error::StoreError;
use crate::types::{Asset, AssetId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// In-memory asset map, optionally mirrored to a JSON file.
///
/// The file holds a JSON array of assets and is rewritten on every save.
pub struct CatalogStore {
    assets: RwLock<BTreeMap<AssetId, Asset>>,
    path: Option<PathBuf>,
}

impl CatalogStore {
    /// Catalog with no backing file.
    pub fn in_memory(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: RwLock::new(assets.into_iter().map(|a| (a.id, a)).collect()),
            path: None,
        }
    }

    /// Load the catalog at `path`. A missing file yields an empty catalog.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let assets: Vec<Asset> = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No catalog at {:?}, starting empty", path);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Loaded {} assets from {:?}", assets.len(), path);
        Ok(Self {
            assets: RwLock::new(assets.into_iter().map(|a| (a.id, a)).collect()),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create (or replace) the catalog file at `path` with `assets`.
    pub async fn create(path: &Path, assets: Vec<Asset>) -> Result<Self, StoreError> {
        let store = Self {
            assets: RwLock::new(assets.into_iter().map(|a| (a.id, a)).collect()),
            path: Some(path.to_path_buf()),
        };
        store.flush(&*store.assets.read().await).await?;
        Ok(store)
    }

    /// Every asset of any kind, in id order.
    pub async fn list(&self) -> Vec<Asset> {
        self.assets.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }

    async fn flush(&self, assets: &BTreeMap<AssetId, Asset>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let list: Vec<&Asset> = assets.values().collect();
        let content = serde_json::to_string_pretty(&list)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Fields present on `incoming` that the stored asset does not define.
fn unknown_fields(stored: &Asset, incoming: &Asset) -> Vec<String> {
    incoming
        .fields
        .keys()
        .filter(|handle| !stored.fields.contains_key(*handle))
        .map(|handle| format!("Unknown field \"{handle}\" on asset {}", incoming.id))
        .collect()
}

#[async_trait]
impl AssetStore for CatalogStore {
    async fn images(&self) -> Result<Vec<Asset>, StoreError> {
        Ok(self
            .assets
            .read()
            .await
            .values()
            .filter(|a| a.is_image())
            .cloned()
            .collect())
    }

    async fn get(&self, id: AssetId) -> Result<Option<Asset>, StoreError> {
        Ok(self.assets.read().await.get(&id).cloned())
    }

    async fn save(&self, asset: &Asset) -> Result<(), StoreError> {
        let mut assets = self.assets.write().await;

        let stored = assets
            .get(&asset.id)
            .ok_or_else(|| StoreError::Backend(format!("Asset {} does not exist", asset.id)))?;

        let errors = unknown_fields(stored, asset);
        if !errors.is_empty() {
            return Err(StoreError::Validation(errors));
        }

        let previous = assets.insert(asset.id, asset.clone());
        if let Err(e) = self.flush(&assets).await {
            // Keep memory and file in agreement.
            if let Some(previous) = previous {
                assets.insert(previous.id, previous);
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetKind;
    use tempfile::tempdir;

    fn fixture() -> Vec<Asset> {
        let mut doc = Asset::image(3, "notes.pdf");
        doc.kind = AssetKind::Other;
        let mut captioned = Asset::image(2, "dog.jpg");
        captioned.fields.insert("caption".into(), String::new());
        vec![Asset::image(1, "cat.jpg"), captioned, doc]
    }

    #[tokio::test]
    async fn test_images_filters_kind() {
        let store = CatalogStore::in_memory(fixture());
        assert_eq!(store.image_ids().await.unwrap(), vec![1, 2]);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_save_unknown_asset_is_backend_error() {
        let store = CatalogStore::in_memory(fixture());
        let err = store.save(&Asset::image(99, "x.jpg")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_save_unknown_field_is_validation_error() {
        let store = CatalogStore::in_memory(fixture());
        let mut asset = store.get(1).await.unwrap().unwrap();
        asset.fields.insert("caption".into(), "A cat".into());

        let err = store.save(&asset).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.get(1).await.unwrap().unwrap().fields.is_empty());
    }

    #[tokio::test]
    async fn test_save_known_field_succeeds() {
        let store = CatalogStore::in_memory(fixture());
        let mut asset = store.get(2).await.unwrap().unwrap();
        asset.fields.insert("caption".into(), "A dog".into());
        store.save(&asset).await.unwrap();
        assert_eq!(
            store.get(2).await.unwrap().unwrap().fields["caption"],
            "A dog"
        );
    }

    #[tokio::test]
    async fn test_file_backed_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/catalog.json");

        let store = CatalogStore::create(&path, fixture()).await.unwrap();
        let mut asset = store.get(1).await.unwrap().unwrap();
        asset.alt = Some("A cat".into());
        store.save(&asset).await.unwrap();

        let reopened = CatalogStore::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 3);
        assert_eq!(
            reopened.get(1).await.unwrap().unwrap().alt.as_deref(),
            Some("A cat")
        );
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::open(&dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }
}
