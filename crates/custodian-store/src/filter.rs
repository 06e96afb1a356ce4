//! Listing filters

use crate::store::StoredAsset;
use custodian_model::{Asset, AssetStatus};
use serde::{Deserialize, Serialize};

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// `createdAt` descending
    #[default]
    NewestFirst,
    /// `createdAt` ascending
    OldestFirst,
    /// Asset tag, case-insensitive
    TagAscending,
}

/// Criteria for listing assets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFilter {
    pub status: Option<AssetStatus>,
    /// Category name or id, case-insensitive
    pub category: Option<String>,
    /// Case-insensitive substring over name, tag and serial number
    pub search: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
}

impl AssetFilter {
    /// Filter matching everything
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Only this status
    #[must_use]
    pub fn with_status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Only this category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Free-text search
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Ordering
    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Whether `asset` passes every criterion
    #[must_use]
    pub fn matches(&self, asset: &Asset) -> bool {
        if self.status.is_some_and(|s| s != asset.status) {
            return false;
        }

        if let Some(category) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let same = |value: &Option<String>| {
                value
                    .as_deref()
                    .is_some_and(|v| v.eq_ignore_ascii_case(category))
            };
            if !same(&asset.details.category_name) && !same(&asset.details.category_id) {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                let hit = |hay: &str| hay.to_lowercase().contains(&needle);
                hit(&asset.details.name)
                    || hit(&asset.asset_tag)
                    || asset.details.serial_number.as_deref().is_some_and(hit)
            }
        }
    }

    /// Sort records in place according to `order`
    pub fn sort(&self, records: &mut [StoredAsset]) {
        match self.order {
            SortOrder::NewestFirst => records.sort_by(|a, b| {
                b.asset
                    .created_at
                    .cmp(&a.asset.created_at)
                    .then_with(|| a.asset.id.cmp(&b.asset.id))
            }),
            SortOrder::OldestFirst => records.sort_by(|a, b| {
                a.asset
                    .created_at
                    .cmp(&b.asset.created_at)
                    .then_with(|| a.asset.id.cmp(&b.asset.id))
            }),
            SortOrder::TagAscending => records.sort_by(|a, b| {
                a.asset
                    .asset_tag
                    .to_lowercase()
                    .cmp(&b.asset.asset_tag.to_lowercase())
            }),
        }
    }
}
