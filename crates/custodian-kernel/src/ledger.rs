//! Assignment ledger
//!
//! The only writer of assignment history. An append is staged as a
//! [`HistoryAppend`] bound to the asset's current history length and
//! committed by the store in the same write as the status change it
//! accompanies, so history and current-state fields never diverge.

use crate::clock::Clock;
use custodian_model::{Asset, AssignmentAction, AssignmentEvent};
use custodian_store::HistoryAppend;
use std::sync::Arc;

/// Per-asset append-only history
#[derive(Debug, Clone)]
pub struct AssignmentLedger {
    clock: Arc<dyn Clock>,
}

impl AssignmentLedger {
    /// Ledger stamping entries with `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Stage an entry at the end of `asset`'s history
    ///
    /// The timestamp never precedes the last recorded entry, even if the
    /// clock stepped backwards.
    #[must_use]
    pub fn append(&self, asset: &Asset, action: AssignmentAction, user_name: &str) -> HistoryAppend {
        let now = self.clock.now();
        let timestamp = asset
            .assignment_history
            .last()
            .map_or(now, |last| now.max(last.timestamp));
        HistoryAppend {
            position: asset.assignment_history.len(),
            event: AssignmentEvent::new(action, user_name, timestamp),
        }
    }

    /// Recorded entries, oldest first
    #[inline]
    #[must_use]
    pub fn read(asset: &Asset) -> &[AssignmentEvent] {
        asset.assignment_history.entries()
    }
}
