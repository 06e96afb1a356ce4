//! Testing utilities for the Custodian workspace
//!
//! Shared tenants, requesters, drafts, seeded stores and proptest
//! strategies.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use custodian_model::{
    AssetDraft, AssetStatus, AssetType, RequesterContext, TenantId, UserId,
};
use custodian_store::{AssetStore, InMemoryAssetStore, StoredAsset};
use proptest::prelude::*;
use std::sync::Arc;

pub const ACME: &str = "acme";
pub const GLOBEX: &str = "globex";

pub fn acme() -> TenantId {
    TenantId::new(ACME)
}

pub fn globex() -> TenantId {
    TenantId::new(GLOBEX)
}

/// Signed-in admin of `tenant`
pub fn admin_of(tenant: &TenantId) -> RequesterContext {
    RequesterContext::user(
        tenant.clone(),
        UserId::new(format!("{tenant}-admin")),
        "Admin",
    )
}

pub fn acme_admin() -> RequesterContext {
    admin_of(&acme())
}

pub fn globex_admin() -> RequesterContext {
    admin_of(&globex())
}

pub fn anonymous() -> RequesterContext {
    RequesterContext::Anonymous
}

pub fn laptop_draft() -> AssetDraft {
    AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware)
        .with_serial("DXP15-2024-001")
        .with_category("Laptops")
}

pub fn desk_draft() -> AssetDraft {
    AssetDraft::new("DESK-042", "Standing Desk Pro", AssetType::Hardware)
        .with_category("Furniture")
}

/// Hardware draft with the given tag
pub fn draft(tag: &str) -> AssetDraft {
    AssetDraft::new(tag, format!("Asset {tag}"), AssetType::Hardware)
}

/// Fixed instant for deterministic clocks
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn memory_store() -> Arc<InMemoryAssetStore> {
    Arc::new(InMemoryAssetStore::new())
}

/// Store holding `drafts` for `tenant`
pub async fn store_with(tenant: &TenantId, drafts: Vec<AssetDraft>) -> (Arc<InMemoryAssetStore>, Vec<StoredAsset>) {
    let store = memory_store();
    let mut created = Vec::with_capacity(drafts.len());
    for draft in drafts {
        created.push(
            store
                .create(tenant.clone(), draft)
                .await
                .unwrap_or_else(|e| panic!("seeding store: {e}")),
        );
    }
    (store, created)
}

pub fn any_status() -> impl Strategy<Value = AssetStatus> {
    prop::sample::select(AssetStatus::ALL.to_vec())
}

pub fn any_asset_type() -> impl Strategy<Value = AssetType> {
    prop_oneof![
        Just(AssetType::Hardware),
        Just(AssetType::Software),
        Just(AssetType::Other),
    ]
}

/// Plausible asset tags: letters, a dash, digits
pub fn any_tag() -> impl Strategy<Value = String> {
    "[A-Z]{2,8}-[0-9]{1,4}"
}
