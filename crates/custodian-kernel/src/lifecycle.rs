//! Asset lifecycle state machine
//!
//! ```text
//! available -> assigned | in_repair | retired
//! assigned  -> available | in_repair | retired
//! in_repair -> available | retired
//! retired   -> available
//! disposed  -> (none)
//! ```
//!
//! Disposal is not part of the table: it has its own entry point, allowed
//! from any non-assigned, non-disposed status.

use crate::ledger::AssignmentLedger;
use custodian_model::{Asset, AssetStatus, Assignee, AssignmentAction, InventoryError};
use custodian_store::AssetPatch;

/// Statuses that may be disposed
pub const DISPOSABLE: [AssetStatus; 3] = [
    AssetStatus::Available,
    AssetStatus::InRepair,
    AssetStatus::Retired,
];

/// Statuses reachable from `from` through status changes
#[must_use]
pub fn allowed_transitions(from: AssetStatus) -> &'static [AssetStatus] {
    use AssetStatus::*;
    match from {
        Available => &[Assigned, InRepair, Retired],
        Assigned => &[Available, InRepair, Retired],
        InRepair => &[Available, Retired],
        Retired => &[Available],
        Disposed => &[],
    }
}

/// Validates a status transition.
///
/// # Errors
/// [`InventoryError::InvalidTransition`] for anything outside the table,
/// including every move into `disposed`.
pub fn validate_transition(from: AssetStatus, to: AssetStatus) -> Result<(), InventoryError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(InventoryError::InvalidTransition { from, to })
    }
}

/// Validates a disposal.
///
/// # Errors
/// [`InventoryError::InvalidTransition`] unless `from` is in [`DISPOSABLE`].
pub fn validate_disposal(from: AssetStatus) -> Result<(), InventoryError> {
    if DISPOSABLE.contains(&from) {
        Ok(())
    } else {
        Err(InventoryError::InvalidTransition {
            from,
            to: AssetStatus::Disposed,
        })
    }
}

/// Plans lifecycle changes as patches
///
/// Planning is pure: every method reads the current record and returns
/// the patch that moves it, ledger entries included. Nothing is written
/// until the store commits the patch against the revision that was read.
#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    ledger: AssignmentLedger,
}

impl LifecycleEngine {
    /// Engine staging ledger entries through `ledger`
    #[must_use]
    pub fn new(ledger: AssignmentLedger) -> Self {
        Self { ledger }
    }

    /// Ledger used for staged entries
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &AssignmentLedger {
        &self.ledger
    }

    /// Hand the asset to `assignee`
    ///
    /// # Errors
    /// [`InventoryError::InvalidTransition`] unless the asset is available;
    /// [`InventoryError::InvalidDraft`] for a blank user name.
    pub fn plan_assign(
        &self,
        current: &Asset,
        assignee: Assignee,
    ) -> Result<AssetPatch, InventoryError> {
        validate_transition(current.status, AssetStatus::Assigned)?;
        if assignee.user_name.trim().is_empty() {
            return Err(InventoryError::InvalidDraft("assignee name is required".into()));
        }
        let entry = self
            .ledger
            .append(current, AssignmentAction::Assigned, &assignee.user_name);
        Ok(AssetPatch::new()
            .with_status(AssetStatus::Assigned)
            .with_assignee(assignee)
            .with_append(entry))
    }

    /// Return the asset to the pool
    ///
    /// The ledger entry carries the name of the user the asset was taken
    /// from. `acting_user` is recorded only if that name was never stored.
    ///
    /// # Errors
    /// [`InventoryError::InvalidTransition`] unless the asset is assigned.
    pub fn plan_unassign(
        &self,
        current: &Asset,
        acting_user: &str,
    ) -> Result<AssetPatch, InventoryError> {
        self.release(current, AssetStatus::Available, acting_user)
    }

    /// Move to `target` through a plain status change
    ///
    /// Leaving `assigned` this way releases the holder in the same write.
    ///
    /// # Errors
    /// [`InventoryError::InvalidTransition`] for transitions outside the
    /// table and for targets that need their own operation (`assigned`
    /// needs an assignee, `disposed` goes through disposal).
    pub fn plan_status(
        &self,
        current: &Asset,
        target: AssetStatus,
        acting_user: &str,
    ) -> Result<AssetPatch, InventoryError> {
        if matches!(target, AssetStatus::Assigned | AssetStatus::Disposed) {
            return Err(InventoryError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }
        if current.status == AssetStatus::Assigned {
            return self.release(current, target, acting_user);
        }
        validate_transition(current.status, target)?;
        Ok(AssetPatch::new().with_status(target))
    }

    /// Move to the absorbing `disposed` status
    ///
    /// # Errors
    /// [`InventoryError::InvalidTransition`] from `assigned` or `disposed`.
    pub fn plan_disposal(&self, current: &Asset) -> Result<AssetPatch, InventoryError> {
        validate_disposal(current.status)?;
        Ok(AssetPatch::new().with_status(AssetStatus::Disposed))
    }

    fn release(
        &self,
        current: &Asset,
        target: AssetStatus,
        acting_user: &str,
    ) -> Result<AssetPatch, InventoryError> {
        validate_transition(current.status, target)?;
        if current.status != AssetStatus::Assigned {
            return Err(InventoryError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }
        let holder = current
            .assigned_user_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(acting_user);
        let entry = self
            .ledger
            .append(current, AssignmentAction::Unassigned, holder);
        Ok(AssetPatch::new()
            .with_status(target)
            .clear_assignee()
            .with_append(entry))
    }
}
