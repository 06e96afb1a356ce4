//! In-memory asset store
//!
//! Records live in a [`DashMap`]; `apply_update` holds the record's shard
//! lock for the whole compare-and-swap, so commits on one asset are
//! serialized while independent assets proceed in parallel.
//!
//! Lock order is records → tags. Nothing takes a record lock while holding
//! a tag lock, and a new record is inserted under the same shard lock that
//! claims its tag.

use crate::filter::AssetFilter;
use crate::patch::AssetPatch;
use crate::store::{AssetStore, Revision, StoreError, StoredAsset};
use async_trait::async_trait;
use chrono::Utc;
use custodian_model::{Asset, AssetDraft, AssetId, AssetStatus, AssignmentHistory, TenantId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

type TagKey = (TenantId, String);

/// Tags are unique per tenant, ignoring case and surrounding whitespace
fn tag_key(tenant: &TenantId, tag: &str) -> TagKey {
    (tenant.clone(), tag.trim().to_uppercase())
}

/// Concurrent in-process store
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    records: DashMap<AssetId, StoredAsset>,
    tags: DashMap<TagKey, AssetId>,
}

impl InMemoryAssetStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all tenants
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a previously persisted record as-is
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateTag`] or [`StoreError::Invariant`] if
    /// the record clashes with one already loaded.
    pub fn restore(&self, stored: StoredAsset) -> Result<(), StoreError> {
        self.insert_new(stored)
    }

    /// Every record, unordered
    #[must_use]
    pub fn snapshot(&self) -> Vec<StoredAsset> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Record `create` would insert, with its tag checked but not claimed
    pub(crate) fn prepare_create(
        &self,
        tenant: TenantId,
        draft: AssetDraft,
    ) -> Result<StoredAsset, StoreError> {
        let status = draft.initial_status();
        if status == AssetStatus::Assigned {
            return Err(StoreError::Invariant(
                "asset cannot be created assigned without an assignee".into(),
            ));
        }

        let id = AssetId::new();
        let asset_tag = draft.asset_tag.trim().to_string();
        self.ensure_tag_free(&tenant, &asset_tag, id)?;

        Ok(StoredAsset {
            asset: Asset {
                id,
                tenant,
                asset_tag,
                asset_type: draft.asset_type,
                status,
                assignee: None,
                details: draft.details,
                created_at: Utc::now(),
                assignment_history: AssignmentHistory::new(),
            },
            revision: Revision::INITIAL,
        })
    }

    /// Record `apply_update` would commit, leaving the store untouched
    pub(crate) fn prepare_update(
        &self,
        id: AssetId,
        expected: Revision,
        patch: &AssetPatch,
    ) -> Result<StoredAsset, StoreError> {
        let current = self.fetch(id)?;
        if current.revision != expected {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual: current.revision,
            });
        }
        let next = patch.apply_to(&current.asset)?;
        self.ensure_tag_free(&next.tenant, &next.asset_tag, id)?;
        Ok(StoredAsset {
            asset: next,
            revision: current.revision.next(),
        })
    }

    /// Commit a record built by [`Self::prepare_update`]
    pub(crate) fn install(&self, expected: Revision, next: Asset) -> Result<StoredAsset, StoreError> {
        let id = next.id;
        self.swap(id, expected, |_| Ok(next))
    }

    /// Insert a record under an unused id and claim its tag
    ///
    /// The record's shard stays locked while the tag is claimed, so a tag
    /// lookup never resolves to an id whose record is not yet readable.
    pub(crate) fn insert_new(&self, stored: StoredAsset) -> Result<(), StoreError> {
        let id = stored.asset.id;
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(StoreError::Invariant(format!("asset {id} stored twice"))),
            Entry::Vacant(slot) => {
                self.claim_tag(&stored.asset.tenant, &stored.asset.asset_tag, id)?;
                slot.insert(stored);
                Ok(())
            }
        }
    }

    fn ensure_tag_free(&self, tenant: &TenantId, tag: &str, id: AssetId) -> Result<(), StoreError> {
        match self.tags.get(&tag_key(tenant, tag)) {
            Some(owner) if *owner.value() != id => Err(StoreError::DuplicateTag {
                tag: tag.trim().to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn claim_tag(&self, tenant: &TenantId, tag: &str, id: AssetId) -> Result<(), StoreError> {
        match self.tags.entry(tag_key(tenant, tag)) {
            Entry::Occupied(owner) if *owner.get() != id => Err(StoreError::DuplicateTag {
                tag: tag.trim().to_string(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }

    /// Compare-and-swap on one record, moving its tag if it changed
    fn swap(
        &self,
        id: AssetId,
        expected: Revision,
        next: impl FnOnce(&Asset) -> Result<Asset, StoreError>,
    ) -> Result<StoredAsset, StoreError> {
        let mut record = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.revision != expected {
            return Err(StoreError::Conflict {
                id,
                expected,
                actual: record.revision,
            });
        }

        let next = next(&record.asset)?;

        let old_key = tag_key(&record.asset.tenant, &record.asset.asset_tag);
        let new_key = tag_key(&next.tenant, &next.asset_tag);
        if old_key != new_key {
            self.claim_tag(&next.tenant, &next.asset_tag, id)?;
            self.tags.remove(&old_key);
        }

        record.asset = next;
        record.revision = record.revision.next();
        Ok(record.value().clone())
    }

    fn fetch(&self, id: AssetId) -> Result<StoredAsset, StoreError> {
        self.records
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn get(&self, id: AssetId) -> Result<StoredAsset, StoreError> {
        self.fetch(id)
    }

    async fn find_by_tag(&self, tenant: &TenantId, tag: &str) -> Result<StoredAsset, StoreError> {
        let id = self
            .tags
            .get(&tag_key(tenant, tag))
            .map(|r| *r.value())
            .ok_or_else(|| StoreError::TagNotFound(tag.to_string()))?;
        self.fetch(id)
    }

    async fn list(
        &self,
        tenant: &TenantId,
        filter: &AssetFilter,
    ) -> Result<Vec<StoredAsset>, StoreError> {
        let mut out: Vec<StoredAsset> = self
            .records
            .iter()
            .filter(|r| &r.asset.tenant == tenant && filter.matches(&r.asset))
            .map(|r| r.value().clone())
            .collect();
        filter.sort(&mut out);
        Ok(out)
    }

    async fn create(&self, tenant: TenantId, draft: AssetDraft) -> Result<StoredAsset, StoreError> {
        let stored = self.prepare_create(tenant, draft)?;
        self.insert_new(stored.clone())?;
        tracing::debug!("Stored asset {} as {}", stored.asset.id, stored.asset.asset_tag);
        Ok(stored)
    }

    async fn apply_update(
        &self,
        id: AssetId,
        expected: Revision,
        patch: AssetPatch,
    ) -> Result<StoredAsset, StoreError> {
        self.swap(id, expected, |current| patch.apply_to(current))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
