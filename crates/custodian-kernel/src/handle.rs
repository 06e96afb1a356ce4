//! Inventory handle
//!
//! Entry point for every inventory operation. Each operation resolves the
//! requester, loads the record, checks access, plans the change and
//! commits it against the revision it read. A commit that loses a race
//! surfaces as [`InventoryError::Conflict`]; the handle never retries on
//! the caller's behalf.

use crate::clock::{Clock, SystemClock};
use crate::guard::{AccessGuard, Decision};
use crate::ledger::AssignmentLedger;
use crate::lifecycle::LifecycleEngine;
use custodian_model::{
    Asset, AssetDraft, AssetEdit, AssetId, AssetStatus, Assignee, AssignmentEvent, DenialReason,
    InventoryError, QrCodec, QrPayload, RequesterContext, UserId,
};
use custodian_store::{AssetFilter, AssetPatch, AssetStore, Snapshot, StoreError, StoredAsset};
use serde::Serialize;
use std::sync::Arc;

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Per-status asset counts for one tenant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStats {
    pub total: usize,
    pub available: usize,
    pub assigned: usize,
    pub in_repair: usize,
    pub retired: usize,
    pub disposed: usize,
}

impl AssetStats {
    /// Count `assets` by status
    #[must_use]
    pub fn tally<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Self {
        let mut stats = Self::default();
        for asset in assets {
            stats.total += 1;
            match asset.status {
                AssetStatus::Available => stats.available += 1,
                AssetStatus::Assigned => stats.assigned += 1,
                AssetStatus::InRepair => stats.in_repair += 1,
                AssetStatus::Retired => stats.retired += 1,
                AssetStatus::Disposed => stats.disposed += 1,
            }
        }
        stats
    }

    /// Count for one status
    #[must_use]
    pub fn count(&self, status: AssetStatus) -> usize {
        match status {
            AssetStatus::Available => self.available,
            AssetStatus::Assigned => self.assigned,
            AssetStatus::InRepair => self.in_repair,
            AssetStatus::Retired => self.retired,
            AssetStatus::Disposed => self.disposed,
        }
    }
}

/// Main inventory handle
#[derive(Debug, Clone)]
pub struct InventoryHandle {
    store: Arc<dyn AssetStore>,
    engine: LifecycleEngine,
    guard: AccessGuard,
    codec: QrCodec,
}

impl InventoryHandle {
    /// Handle over `store` with the wall clock and the fallback QR codec
    #[must_use]
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            engine: LifecycleEngine::new(AssignmentLedger::new(Arc::new(SystemClock))),
            guard: AccessGuard,
            codec: QrCodec::fallback(),
        }
    }

    /// Use `clock` for ledger timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.engine = LifecycleEngine::new(AssignmentLedger::new(clock));
        self
    }

    /// Use `codec` for QR payloads
    #[must_use]
    pub fn with_codec(mut self, codec: QrCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Name of the backing store, for diagnostics
    #[inline]
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// QR codec in use
    #[inline]
    #[must_use]
    pub fn codec(&self) -> &QrCodec {
        &self.codec
    }

    /// Tenant assets matching `filter`
    ///
    /// # Errors
    /// Access denial for anonymous requesters; store failures.
    pub async fn list_assets(
        &self,
        requester: &RequesterContext,
        filter: &AssetFilter,
    ) -> InventoryResult<Vec<Asset>> {
        let session = self.guard.session(requester)?;
        let records = self
            .store
            .list(&session.tenant, filter)
            .await
            .map_err(|e| store_failure("list", e))?;
        tracing::debug!("Listed {} assets for {}", records.len(), session.tenant);
        Ok(records.into_iter().map(|r| r.asset).collect())
    }

    /// One asset by id
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, store failures.
    pub async fn get_asset(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<Asset> {
        Ok(self.load(requester, id).await?.asset)
    }

    /// One asset by tag within the requester's tenant
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, store failures.
    pub async fn find_by_tag(
        &self,
        requester: &RequesterContext,
        tag: &str,
    ) -> InventoryResult<Asset> {
        let session = self.guard.session(requester)?;
        let stored = self.store.find_by_tag(&session.tenant, tag).await?;
        self.guard.authorize(requester, &stored.asset)?;
        Ok(stored.asset)
    }

    /// Register a new asset in the requester's tenant
    ///
    /// # Errors
    /// `InvalidDraft`, `DuplicateTag`, `AccessDenied`, store failures.
    pub async fn create_asset(
        &self,
        requester: &RequesterContext,
        draft: AssetDraft,
    ) -> InventoryResult<Asset> {
        let session = self.guard.session(requester)?;
        draft.validate()?;
        let stored = self.store.create(session.tenant.clone(), draft).await?;
        tracing::info!(
            "Created asset {} ({}) in {} as {}",
            stored.asset.asset_tag,
            stored.asset.id,
            stored.asset.tenant,
            stored.asset.status
        );
        Ok(stored.asset)
    }

    /// Change descriptive fields and tag
    ///
    /// Status, assignment and history are untouched.
    ///
    /// # Errors
    /// `InvalidDraft`, `DuplicateTag`, `Conflict`, `NotFound`,
    /// `AccessDenied`, store failures.
    pub async fn edit_asset(
        &self,
        requester: &RequesterContext,
        id: AssetId,
        edit: AssetEdit,
    ) -> InventoryResult<Asset> {
        edit.validate()?;
        let current = self.load(requester, id).await?;
        let patch = AssetPatch {
            asset_tag: edit.asset_tag,
            asset_type: edit.asset_type,
            details: edit.details,
            ..AssetPatch::new()
        };
        if patch.is_empty() {
            return Ok(current.asset);
        }
        self.commit(&current, patch, "edit").await
    }

    /// Assign an available asset to a user
    ///
    /// # Errors
    /// `InvalidTransition` unless available, `Conflict`, `NotFound`,
    /// `AccessDenied`, store failures.
    pub async fn assign_asset(
        &self,
        requester: &RequesterContext,
        id: AssetId,
        user_id: UserId,
        user_name: &str,
    ) -> InventoryResult<Asset> {
        let current = self.load(requester, id).await?;
        let patch = self
            .engine
            .plan_assign(&current.asset, Assignee::new(user_id, user_name))?;
        self.commit(&current, patch, "assign").await
    }

    /// Return an assigned asset to the pool
    ///
    /// The ledger entry names the previous holder; `acting_user_name` is
    /// recorded only when no holder name was stored.
    ///
    /// # Errors
    /// `InvalidTransition` unless assigned, `Conflict`, `NotFound`,
    /// `AccessDenied`, store failures.
    pub async fn unassign_asset(
        &self,
        requester: &RequesterContext,
        id: AssetId,
        acting_user_name: &str,
    ) -> InventoryResult<Asset> {
        let current = self.load(requester, id).await?;
        let patch = self.engine.plan_unassign(&current.asset, acting_user_name)?;
        self.commit(&current, patch, "unassign").await
    }

    /// Move to `available`, `in_repair` or `retired`
    ///
    /// # Errors
    /// `InvalidTransition`, `Conflict`, `NotFound`, `AccessDenied`, store
    /// failures.
    pub async fn set_status(
        &self,
        requester: &RequesterContext,
        id: AssetId,
        target: AssetStatus,
    ) -> InventoryResult<Asset> {
        let current = self.load(requester, id).await?;
        let acting = acting_user(requester);
        let patch = self.engine.plan_status(&current.asset, target, &acting)?;
        self.commit(&current, patch, "set_status").await
    }

    /// [`Self::set_status`] to `in_repair`
    ///
    /// # Errors
    /// As [`Self::set_status`].
    pub async fn mark_in_repair(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<Asset> {
        self.set_status(requester, id, AssetStatus::InRepair).await
    }

    /// [`Self::set_status`] to `retired`
    ///
    /// # Errors
    /// As [`Self::set_status`].
    pub async fn mark_retired(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<Asset> {
        self.set_status(requester, id, AssetStatus::Retired).await
    }

    /// [`Self::set_status`] to `available`
    ///
    /// # Errors
    /// As [`Self::set_status`].
    pub async fn mark_available(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<Asset> {
        self.set_status(requester, id, AssetStatus::Available).await
    }

    /// Move to the absorbing `disposed` status
    ///
    /// # Errors
    /// `InvalidTransition` from `assigned` or `disposed`, `Conflict`,
    /// `NotFound`, `AccessDenied`, store failures.
    pub async fn dispose_asset(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<Asset> {
        let current = self.load(requester, id).await?;
        let patch = self.engine.plan_disposal(&current.asset)?;
        self.commit(&current, patch, "dispose").await
    }

    /// Assignment history, oldest first
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, store failures.
    pub async fn assignment_history(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<Vec<AssignmentEvent>> {
        let current = self.load(requester, id).await?;
        Ok(AssignmentLedger::read(&current.asset).to_vec())
    }

    /// Per-status counts for the requester's tenant
    ///
    /// # Errors
    /// Access denial for anonymous requesters; store failures.
    pub async fn asset_stats(&self, requester: &RequesterContext) -> InventoryResult<AssetStats> {
        let assets = self.list_assets(requester, &AssetFilter::all()).await?;
        Ok(AssetStats::tally(&assets))
    }

    /// Every asset of the requester's tenant as a document snapshot
    ///
    /// # Errors
    /// Access denial for anonymous requesters; store failures.
    pub async fn export_snapshot(&self, requester: &RequesterContext) -> InventoryResult<Snapshot> {
        let session = self.guard.session(requester)?;
        let records = self
            .store
            .list(&session.tenant, &AssetFilter::all())
            .await
            .map_err(|e| store_failure("export", e))?;
        tracing::info!("Exported {} assets for {}", records.len(), session.tenant);
        Ok(Snapshot::of(&records))
    }

    /// QR payload for an asset
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, store failures.
    pub async fn qr_payload(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<QrPayload> {
        let current = self.load(requester, id).await?;
        Ok(self.codec.encode(&current.asset))
    }

    /// Resolve a scanned payload to the asset it names
    ///
    /// Decode failures are reported as such. Past decoding, an unknown id,
    /// a foreign tenant and a missing session all produce the same
    /// [`DenialReason::Withheld`], so a scanner learns nothing about ids it
    /// may not see.
    ///
    /// # Errors
    /// `Decode`, `AccessDenied(Withheld)`, store failures.
    pub async fn resolve_by_qr_payload(
        &self,
        requester: &RequesterContext,
        payload: &str,
    ) -> InventoryResult<Asset> {
        let id = QrCodec::decode(payload)?;
        let withheld = InventoryError::AccessDenied(DenialReason::Withheld);

        let stored = match self.store.get(id).await {
            Ok(stored) => stored,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!("QR payload names unknown asset {id}");
                return Err(withheld);
            }
            Err(e) => return Err(store_failure("resolve", e)),
        };
        match self.guard.decide(requester, &stored.asset) {
            Decision::Permit => Ok(stored.asset),
            Decision::Deny(reason) => {
                tracing::warn!("Withheld asset {id} from QR resolution ({reason})");
                Err(withheld)
            }
        }
    }

    async fn load(
        &self,
        requester: &RequesterContext,
        id: AssetId,
    ) -> InventoryResult<StoredAsset> {
        self.guard.session(requester)?;
        let stored = self
            .store
            .get(id)
            .await
            .map_err(|e| store_failure("load", e))?;
        self.guard.authorize(requester, &stored.asset)?;
        tracing::debug!("Loaded asset {id} at {}", stored.revision);
        Ok(stored)
    }

    async fn commit(
        &self,
        current: &StoredAsset,
        patch: AssetPatch,
        op: &str,
    ) -> InventoryResult<Asset> {
        let id = current.asset.id;
        match self.store.apply_update(id, current.revision, patch).await {
            Ok(updated) => {
                tracing::info!(
                    "{op} on {} ({id}): {} -> {} at {}",
                    updated.asset.asset_tag,
                    current.asset.status,
                    updated.asset.status,
                    updated.revision
                );
                Ok(updated.asset)
            }
            Err(e @ StoreError::Conflict { .. }) => {
                tracing::warn!("{op} on {id} lost a race: {e}");
                Err(e.into())
            }
            Err(e) => Err(store_failure(op, e)),
        }
    }
}

/// Map a store error, logging backend failures
fn store_failure(op: &str, err: StoreError) -> InventoryError {
    if matches!(err, StoreError::Backend(_) | StoreError::Invariant(_)) {
        tracing::error!("{op} failed in store: {err}");
    }
    err.into()
}

fn acting_user(requester: &RequesterContext) -> String {
    requester
        .session()
        .map(|s| s.user_name.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodian_model::{AssetType, TenantId};
    use custodian_store::InMemoryAssetStore;

    fn handle() -> InventoryHandle {
        InventoryHandle::new(Arc::new(InMemoryAssetStore::new()))
    }

    fn admin() -> RequesterContext {
        RequesterContext::user(TenantId::new("acme"), UserId::new("u-admin"), "Admin")
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let handle = handle();
        let a = handle
            .create_asset(&admin(), AssetDraft::new("A-1", "One", AssetType::Hardware))
            .await
            .unwrap();
        handle
            .create_asset(&admin(), AssetDraft::new("A-2", "Two", AssetType::Software))
            .await
            .unwrap();
        handle.set_status(&admin(), a.id, AssetStatus::Retired).await.unwrap();

        let stats = handle.asset_stats(&admin()).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count(AssetStatus::Available), 1);
        assert_eq!(stats.count(AssetStatus::Retired), 1);
    }

    #[tokio::test]
    async fn empty_edit_is_a_no_op() {
        let handle = handle();
        let a = handle
            .create_asset(&admin(), AssetDraft::new("A-1", "One", AssetType::Hardware))
            .await
            .unwrap();
        let same = handle
            .edit_asset(&admin(), a.id, AssetEdit::default())
            .await
            .unwrap();
        assert_eq!(same, a);
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let err = handle()
            .create_asset(
                &RequesterContext::Anonymous,
                AssetDraft::new("A-1", "One", AssetType::Hardware),
            )
            .await
            .unwrap_err();
        assert_eq!(err, InventoryError::AccessDenied(DenialReason::Unauthenticated));
    }
}
