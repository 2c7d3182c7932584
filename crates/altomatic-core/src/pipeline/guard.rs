//! Per-asset advisory locks.

use crate::types::AssetId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serialises work on the same asset within one process.
///
/// Entries are created on demand and dropped once nobody holds or waits on
/// them, so the map stays proportional to in-flight assets.
#[derive(Default)]
pub struct AssetLocks {
    locks: Mutex<HashMap<AssetId, Arc<AsyncMutex<()>>>>,
}

/// Held while an asset is being processed. Releases its map entry on drop.
pub struct AssetGuard<'a> {
    owner: &'a AssetLocks,
    id: AssetId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl AssetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other task holds `id`, then hold it.
    pub async fn acquire(&self, id: AssetId) -> AssetGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(id).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        AssetGuard {
            owner: self,
            id,
            guard: Some(guard),
        }
    }
}

impl Drop for AssetGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex before inspecting the reference count.
        self.guard.take();
        let mut locks = self.owner.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = locks.get(&self.id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.id);
            }
        }
    }
}
