//! Lifecycle tests
//!
//! Every (source, target) pair is driven through the public operations and
//! checked against the transition table. Random operation sequences then
//! check that status and assignee agree, that history only grows, and that
//! history timestamps never go backwards.

use chrono::Duration;
use custodian_kernel::{allowed_transitions, InventoryHandle, ManualClock};
use custodian_model::{
    Asset, AssetEdit, AssetId, AssetStatus, InventoryError, RequesterContext, UserId,
};
use custodian_test_utils::{acme_admin, any_status, draft, epoch, laptop_draft, memory_store};
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Create an asset and walk it into `status`
async fn asset_in(handle: &InventoryHandle, requester: &RequesterContext, status: AssetStatus) -> Asset {
    let asset = handle.create_asset(requester, laptop_draft()).await.unwrap();
    match status {
        AssetStatus::Available => asset,
        AssetStatus::Assigned => handle
            .assign_asset(requester, asset.id, UserId::new("u-ansh"), "Ansh")
            .await
            .unwrap(),
        AssetStatus::InRepair | AssetStatus::Retired => {
            handle.set_status(requester, asset.id, status).await.unwrap()
        }
        AssetStatus::Disposed => handle.dispose_asset(requester, asset.id).await.unwrap(),
    }
}

/// Attempt `from -> to` with the operation a caller would use for it
async fn attempt(
    handle: &InventoryHandle,
    requester: &RequesterContext,
    asset: &Asset,
    to: AssetStatus,
) -> Result<Asset, InventoryError> {
    match (asset.status, to) {
        (_, AssetStatus::Assigned) => {
            handle
                .assign_asset(requester, asset.id, UserId::new("u-ravi"), "Ravi")
                .await
        }
        (AssetStatus::Assigned, AssetStatus::Available) => {
            handle.unassign_asset(requester, asset.id, "Admin").await
        }
        _ => handle.set_status(requester, asset.id, to).await,
    }
}

#[tokio::test]
async fn transition_table_is_closed() {
    for from in AssetStatus::ALL {
        for to in AssetStatus::ALL {
            let handle = InventoryHandle::new(memory_store());
            let admin = acme_admin();
            let asset = asset_in(&handle, &admin, from).await;
            let result = attempt(&handle, &admin, &asset, to).await;

            if allowed_transitions(from).contains(&to) {
                let moved = result.unwrap_or_else(|e| panic!("{from} -> {to} failed: {e}"));
                assert_eq!(moved.status, to, "{from} -> {to}");
                assert!(moved.assignment_consistent());
            } else {
                assert_eq!(
                    result.unwrap_err(),
                    InventoryError::InvalidTransition { from, to },
                    "{from} -> {to} should be refused"
                );
                let after = handle.get_asset(&admin, asset.id).await.unwrap();
                assert_eq!(after, asset, "refused {from} -> {to} changed the record");
            }
        }
    }
}

#[tokio::test]
async fn disposal_only_from_idle_statuses() {
    for from in AssetStatus::ALL {
        let handle = InventoryHandle::new(memory_store());
        let admin = acme_admin();
        let asset = asset_in(&handle, &admin, from).await;
        let result = handle.dispose_asset(&admin, asset.id).await;

        match from {
            AssetStatus::Available | AssetStatus::InRepair | AssetStatus::Retired => {
                assert_eq!(result.unwrap().status, AssetStatus::Disposed);
            }
            AssetStatus::Assigned | AssetStatus::Disposed => {
                assert_eq!(
                    result.unwrap_err(),
                    InventoryError::InvalidTransition {
                        from,
                        to: AssetStatus::Disposed
                    }
                );
            }
        }
    }
}

#[tokio::test]
async fn status_changes_do_not_touch_history() {
    let handle = InventoryHandle::new(memory_store());
    let admin = acme_admin();
    let asset = handle.create_asset(&admin, laptop_draft()).await.unwrap();

    handle.mark_in_repair(&admin, asset.id).await.unwrap();
    handle.mark_retired(&admin, asset.id).await.unwrap();
    let back = handle.mark_available(&admin, asset.id).await.unwrap();
    assert!(back.assignment_history.is_empty());
}

#[tokio::test]
async fn leaving_assigned_by_status_records_release() {
    let handle = InventoryHandle::new(memory_store());
    let admin = acme_admin();
    let asset = asset_in(&handle, &admin, AssetStatus::Assigned).await;

    let repaired = handle.mark_in_repair(&admin, asset.id).await.unwrap();
    assert!(repaired.assignee.is_none());
    let entries = repaired.assignment_history.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].user_name, "Ansh");
}

#[derive(Debug, Clone)]
enum Op {
    Assign(u8),
    Unassign,
    SetStatus(AssetStatus),
    Dispose,
    Retag(u16),
    /// Move the clock by this many minutes, possibly backwards
    Tick(i64),
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..4).prop_map(Op::Assign),
        3 => Just(Op::Unassign),
        3 => any_status().prop_map(Op::SetStatus),
        1 => Just(Op::Dispose),
        1 => (0u16..50).prop_map(Op::Retag),
        2 => (-120i64..120).prop_map(Op::Tick),
    ]
}

async fn apply(
    handle: &InventoryHandle,
    clock: &ManualClock,
    requester: &RequesterContext,
    id: AssetId,
    op: &Op,
) -> Result<(), InventoryError> {
    match op {
        Op::Assign(user) => handle
            .assign_asset(requester, id, UserId::new(format!("u-{user}")), &format!("User {user}"))
            .await
            .map(drop),
        Op::Unassign => handle.unassign_asset(requester, id, "Admin").await.map(drop),
        Op::SetStatus(target) => handle.set_status(requester, id, *target).await.map(drop),
        Op::Dispose => handle.dispose_asset(requester, id).await.map(drop),
        Op::Retag(n) => {
            let edit = AssetEdit {
                asset_tag: Some(format!("TAG-{n}")),
                ..AssetEdit::default()
            };
            handle.edit_asset(requester, id, edit).await.map(drop)
        }
        Op::Tick(minutes) => {
            clock.advance(Duration::minutes(*minutes));
            Ok(())
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_keep_invariants(ops in prop::collection::vec(any_op(), 1..40)) {
        runtime().block_on(async {
            let clock = Arc::new(ManualClock::new(epoch()));
            let handle = InventoryHandle::new(memory_store()).with_clock(clock.clone());
            let admin = acme_admin();
            let mut previous = handle.create_asset(&admin, draft("SEQ-1")).await.unwrap();

            for op in &ops {
                let outcome = apply(&handle, &clock, &admin, previous.id, op).await;
                let current = handle.get_asset(&admin, previous.id).await.unwrap();

                // status and assignee agree
                assert_eq!(
                    current.status == AssetStatus::Assigned,
                    current.assignee.is_some(),
                    "after {op:?}"
                );
                // history only grows, existing entries are untouched
                assert!(previous.assignment_history.is_prefix_of(&current.assignment_history));
                // timestamps non-decreasing
                let entries = current.assignment_history.entries();
                assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
                // failures leave no trace
                if outcome.is_err() {
                    assert_eq!(current, previous, "failed {op:?} changed the record");
                }
                // nothing leaves disposed
                if previous.status == AssetStatus::Disposed {
                    assert_eq!(current.status, AssetStatus::Disposed);
                }
                previous = current;
            }
        });
    }
}
