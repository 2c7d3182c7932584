//! Shared service construction for command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use altomatic_core::{
    Actor, AssetStore, AuditLog, CaptionPipeline, CatalogStore, Config, ProviderFactory,
};

/// Resolve the config file: explicit `--config` (with `~` expansion) or the
/// platform default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => Config::default_path(),
    }
}

/// Loaded configuration plus lazily opened services.
pub struct Context {
    pub config: Arc<Config>,
    pub config_path: PathBuf,
}

impl Context {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    /// Replace the configuration, e.g. after a CLI override.
    pub fn with_config(self, config: Config) -> Self {
        Self {
            config: Arc::new(config),
            config_path: self.config_path,
        }
    }

    /// Open the catalog named in `[storage]`.
    pub async fn store(&self) -> anyhow::Result<Arc<CatalogStore>> {
        let path = self.config.catalog_path();
        let store = CatalogStore::open(&path).await?;
        if store.is_empty().await {
            tracing::warn!(
                "Catalog at {} is empty. Build one with `altomatic catalog scan <DIR>`.",
                path.display()
            );
        }
        Ok(Arc::new(store))
    }

    /// Open the audit log named in `[storage]`.
    pub fn audit(&self) -> anyhow::Result<Arc<AuditLog>> {
        Ok(Arc::new(AuditLog::open(&self.config.audit_db_path())?))
    }

    /// Build a caption pipeline over `store` with the configured provider.
    pub fn pipeline(&self, store: Arc<dyn AssetStore>) -> Arc<CaptionPipeline> {
        let provider = Arc::from(ProviderFactory::create(&self.config));
        tracing::debug!("Using provider: {}", self.config.generation.provider);
        Arc::new(CaptionPipeline::new(self.config.clone(), provider, store))
    }
}

/// Acting user from `--user-id` / `--user`. No id means an anonymous entry.
pub fn actor(user_id: Option<u64>, username: Option<String>, email: Option<String>) -> Option<Actor> {
    let id = user_id?;
    Some(Actor {
        id,
        username: username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("user-{id}")),
        email,
    })
}
