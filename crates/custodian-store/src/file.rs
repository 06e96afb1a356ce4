//! File-backed asset store
//!
//! Serves reads from an [`InMemoryAssetStore`] and keeps a JSON
//! [`Snapshot`] of it on disk. A write holds the write lock from validation
//! until its record is installed: the next state is computed first, the
//! snapshot containing it is written to a sibling temp file and renamed
//! over the target, and only then does the record become visible. A failed
//! snapshot write leaves both the memory and the file unchanged.

use crate::document::Snapshot;
use crate::filter::AssetFilter;
use crate::memory::InMemoryAssetStore;
use crate::patch::AssetPatch;
use crate::store::{AssetStore, Revision, StoreError, StoredAsset};
use async_trait::async_trait;
use custodian_model::{AssetDraft, AssetId, TenantId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Store persisted as a snapshot file
#[derive(Debug)]
pub struct FileAssetStore {
    path: PathBuf,
    inner: InMemoryAssetStore,
    write_lock: Mutex<()>,
}

impl FileAssetStore {
    /// Open `path`, loading its snapshot if it exists
    ///
    /// # Errors
    /// [`StoreError::Backend`] if the file cannot be read or fails
    /// document validation.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = InMemoryAssetStore::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    StoreError::Backend(format!("{}: malformed snapshot: {e}", path.display()))
                })?;
                let records = snapshot
                    .into_records()
                    .map_err(|e| StoreError::Backend(format!("{}: {e}", path.display())))?;
                for record in records {
                    inner.restore(record)?;
                }
                tracing::info!("Loaded {} assets from {}", inner.len(), path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", path.display());
            }
            Err(e) => {
                return Err(StoreError::Backend(format!("{}: {e}", path.display())));
            }
        }

        Ok(Self {
            path,
            inner,
            write_lock: Mutex::new(()),
        })
    }

    /// Snapshot file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state, with `pending` in place, to disk
    ///
    /// Callers hold the write lock.
    async fn persist(&self, pending: &StoredAsset) -> Result<(), StoreError> {
        let mut records = self.inner.snapshot();
        match records.iter_mut().find(|r| r.asset.id == pending.asset.id) {
            Some(slot) => slot.clone_from(pending),
            None => records.push(pending.clone()),
        }
        let bytes = serde_json::to_vec_pretty(&Snapshot::of(&records))
            .map_err(|e| StoreError::Backend(format!("encode snapshot: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Backend(format!("{}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!("Cannot remove {}: {cleanup}", tmp.display());
            }
            return Err(StoreError::Backend(format!("{}: {e}", self.path.display())));
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for FileAssetStore {
    async fn get(&self, id: AssetId) -> Result<StoredAsset, StoreError> {
        self.inner.get(id).await
    }

    async fn find_by_tag(&self, tenant: &TenantId, tag: &str) -> Result<StoredAsset, StoreError> {
        self.inner.find_by_tag(tenant, tag).await
    }

    async fn list(
        &self,
        tenant: &TenantId,
        filter: &AssetFilter,
    ) -> Result<Vec<StoredAsset>, StoreError> {
        self.inner.list(tenant, filter).await
    }

    async fn create(&self, tenant: TenantId, draft: AssetDraft) -> Result<StoredAsset, StoreError> {
        let _write = self.write_lock.lock().await;
        let stored = self.inner.prepare_create(tenant, draft)?;
        self.persist(&stored).await?;
        self.inner.insert_new(stored.clone())?;
        Ok(stored)
    }

    async fn apply_update(
        &self,
        id: AssetId,
        expected: Revision,
        patch: AssetPatch,
    ) -> Result<StoredAsset, StoreError> {
        let _write = self.write_lock.lock().await;
        let next = self.inner.prepare_update(id, expected, &patch)?;
        self.persist(&next).await?;
        self.inner.install(expected, next.asset)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
