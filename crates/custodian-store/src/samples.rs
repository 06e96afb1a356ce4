//! Sample inventory used by the mock backend and demos

use crate::memory::InMemoryAssetStore;
use crate::store::{AssetStore, StoreError};
use chrono::NaiveDate;
use custodian_model::{AssetDetails, AssetDraft, AssetType, TenantId};

/// Drafts for the sample inventory
#[must_use]
pub fn sample_drafts() -> Vec<AssetDraft> {
    vec![
        AssetDraft {
            asset_tag: "LAPTOP-001".into(),
            asset_type: AssetType::Hardware,
            details: AssetDetails {
                serial_number: Some("DXP15-2024-001".into()),
                category_name: Some("Laptops".into()),
                department_name: Some("Engineering".into()),
                location_name: Some("Building A - Floor 3".into()),
                purchase_date: NaiveDate::from_ymd_opt(2024, 1, 15),
                warranty_expiry: NaiveDate::from_ymd_opt(2027, 1, 15),
                ..AssetDetails::named("Dell XPS 15")
            },
            status: None,
        },
        AssetDraft {
            asset_tag: "DESK-042".into(),
            asset_type: AssetType::Hardware,
            details: AssetDetails {
                serial_number: Some("SDP-2024-042".into()),
                category_name: Some("Furniture".into()),
                department_name: Some("Operations".into()),
                location_name: Some("Building B - Floor 2".into()),
                purchase_date: NaiveDate::from_ymd_opt(2024, 2, 10),
                ..AssetDetails::named("Standing Desk Pro")
            },
            status: None,
        },
    ]
}

impl InMemoryAssetStore {
    /// Store pre-filled with the sample inventory for `tenant`
    ///
    /// # Errors
    /// Propagates store errors from inserting the samples.
    pub async fn with_samples(tenant: &TenantId) -> Result<Self, StoreError> {
        let store = Self::new();
        for draft in sample_drafts() {
            store.create(tenant.clone(), draft).await?;
        }
        Ok(store)
    }
}
