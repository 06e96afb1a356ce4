//! Record patches
//!
//! An [`AssetPatch`] is the unit of atomic change: field updates plus any
//! ledger appends that accompany them.

use crate::store::StoreError;
use custodian_model::{
    Asset, AssetDetails, AssetStatus, AssetType, Assignee, AssignmentEvent,
};

/// Ledger entry staged for a specific position in an asset's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAppend {
    /// Index the entry must land at
    pub position: usize,
    pub event: AssignmentEvent,
}

/// Field changes committed in one write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPatch {
    pub status: Option<AssetStatus>,
    /// `Some(None)` clears the assignee
    pub assignee: Option<Option<Assignee>>,
    pub asset_tag: Option<String>,
    pub asset_type: Option<AssetType>,
    pub details: Option<AssetDetails>,
    pub history: Vec<HistoryAppend>,
}

impl AssetPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set status
    #[must_use]
    pub fn with_status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set assignee
    #[must_use]
    pub fn with_assignee(mut self, assignee: Assignee) -> Self {
        self.assignee = Some(Some(assignee));
        self
    }

    /// Clear assignee
    #[must_use]
    pub fn clear_assignee(mut self) -> Self {
        self.assignee = Some(None);
        self
    }

    /// Stage a ledger append
    #[must_use]
    pub fn with_append(mut self, append: HistoryAppend) -> Self {
        self.history.push(append);
        self
    }

    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.assignee.is_none()
            && self.asset_tag.is_none()
            && self.asset_type.is_none()
            && self.details.is_none()
            && self.history.is_empty()
    }

    /// Compute the patched record
    ///
    /// # Errors
    /// Returns [`StoreError::Invariant`] if an append is staged for the
    /// wrong position, breaks timestamp order, or the result has an
    /// assignee without being assigned (or the reverse).
    pub fn apply_to(&self, current: &Asset) -> Result<Asset, StoreError> {
        let mut next = current.clone();

        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(assignee) = &self.assignee {
            next.assignee.clone_from(assignee);
        }
        if let Some(tag) = &self.asset_tag {
            next.asset_tag = tag.trim().to_string();
        }
        if let Some(asset_type) = self.asset_type {
            next.asset_type = asset_type;
        }
        if let Some(details) = &self.details {
            next.details = details.clone();
        }

        for append in &self.history {
            let len = next.assignment_history.len();
            if append.position != len {
                return Err(StoreError::Invariant(format!(
                    "ledger append staged at {} but history of {} has {len} entries",
                    append.position, current.id
                )));
            }
            next.assignment_history
                .append(append.event.clone())
                .map_err(|e| StoreError::Invariant(e.to_string()))?;
        }

        if !next.assignment_consistent() {
            return Err(StoreError::Invariant(format!(
                "asset {} would be {} with assignee {:?}",
                current.id,
                next.status,
                next.assigned_user_name()
            )));
        }
        Ok(next)
    }
}
