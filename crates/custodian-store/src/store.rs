//! Store capability interface
//!
//! The kernel only talks to [`AssetStore`]; which implementation backs it is
//! decided when the process is wired together.

use crate::filter::AssetFilter;
use crate::patch::AssetPatch;
use async_trait::async_trait;
use custodian_model::{Asset, AssetDraft, AssetId, InventoryError, TenantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record version used for optimistic concurrency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub u64);

impl Revision {
    /// Revision of a freshly created record
    pub const INITIAL: Revision = Revision(1);

    /// Revision after one more committed write
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Asset together with the revision it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub asset: Asset,
    pub revision: Revision,
}

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record with this id
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    /// No record with this tag in the tenant
    #[error("asset tag not found: {0}")]
    TagNotFound(String),

    /// Tag already taken in the tenant
    #[error("duplicate asset tag: {tag}")]
    DuplicateTag { tag: String },

    /// Record moved on since it was read
    #[error("revision conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: AssetId,
        expected: Revision,
        actual: Revision,
    },

    /// Patch would break a record invariant
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Underlying storage failed
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for InventoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => InventoryError::not_found(id),
            StoreError::TagNotFound(tag) => InventoryError::NotFound(tag),
            StoreError::DuplicateTag { tag } => InventoryError::DuplicateTag { tag },
            StoreError::Conflict { id, .. } => InventoryError::Conflict(id),
            StoreError::Invariant(msg) | StoreError::Backend(msg) => InventoryError::Store(msg),
        }
    }
}

/// Capability set every asset store provides
#[async_trait]
pub trait AssetStore: Send + Sync + fmt::Debug {
    /// Record by id
    async fn get(&self, id: AssetId) -> Result<StoredAsset, StoreError>;

    /// Record by tag within a tenant
    async fn find_by_tag(&self, tenant: &TenantId, tag: &str) -> Result<StoredAsset, StoreError>;

    /// Tenant records matching `filter`, in the filter's order
    async fn list(
        &self,
        tenant: &TenantId,
        filter: &AssetFilter,
    ) -> Result<Vec<StoredAsset>, StoreError>;

    /// Insert a new record; assigns id and creation time, starts with an
    /// empty history
    async fn create(&self, tenant: TenantId, draft: AssetDraft) -> Result<StoredAsset, StoreError>;

    /// Atomic read-modify-write guarded by `expected`
    async fn apply_update(
        &self,
        id: AssetId,
        expected: Revision,
        patch: AssetPatch,
    ) -> Result<StoredAsset, StoreError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisions_advance() {
        assert_eq!(Revision::INITIAL.next(), Revision(2));
        assert!(Revision::INITIAL < Revision::INITIAL.next());
    }

    #[test]
    fn store_errors_map_to_taxonomy() {
        let id = AssetId::new();
        let conflict = StoreError::Conflict {
            id,
            expected: Revision(1),
            actual: Revision(2),
        };
        assert_eq!(InventoryError::from(conflict), InventoryError::Conflict(id));
        assert_eq!(
            InventoryError::from(StoreError::DuplicateTag { tag: "A-1".into() }),
            InventoryError::DuplicateTag { tag: "A-1".into() }
        );
        assert!(matches!(
            InventoryError::from(StoreError::Backend("disk".into())),
            InventoryError::Store(_)
        ));
    }
}
