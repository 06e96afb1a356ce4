//! File-backed store tests
//!
//! Committed writes must survive a reopen, and a snapshot that fails
//! document validation must refuse to load rather than serve bad records.

use chrono::Utc;
use custodian_model::{
    AssetDraft, AssetStatus, AssetType, Assignee, AssignmentAction, AssignmentEvent, TenantId,
    UserId,
};
use custodian_store::{
    AssetFilter, AssetPatch, AssetStore, FileAssetStore, HistoryAppend, Snapshot, StoreError,
};

fn acme() -> TenantId {
    TenantId::new("acme")
}

fn assign_ansh() -> AssetPatch {
    AssetPatch::new()
        .with_status(AssetStatus::Assigned)
        .with_assignee(Assignee::new(UserId::new("u-ansh"), "Ansh"))
        .with_append(HistoryAppend {
            position: 0,
            event: AssignmentEvent::new(AssignmentAction::Assigned, "Ansh", Utc::now()),
        })
}

#[tokio::test]
async fn writes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assets.json");

    let store = FileAssetStore::open(&path).await.unwrap();
    let created = store
        .create(acme(), AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware))
        .await
        .unwrap();
    let assigned = store
        .apply_update(created.asset.id, created.revision, assign_ansh())
        .await
        .unwrap();
    drop(store);

    let reopened = FileAssetStore::open(&path).await.unwrap();
    let loaded = reopened.get(created.asset.id).await.unwrap();
    assert_eq!(loaded, assigned);
    assert_eq!(
        reopened
            .list(&acme(), &AssetFilter::all())
            .await
            .unwrap()
            .len(),
        1
    );

    // Tag index is rebuilt on load
    let dup = reopened
        .create(acme(), AssetDraft::new("LAPTOP-001", "Another", AssetType::Hardware))
        .await;
    assert!(matches!(dup, Err(StoreError::DuplicateTag { .. })));
}

#[tokio::test]
async fn failed_snapshot_write_commits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    let path = data.join("assets.json");

    let store = FileAssetStore::open(&path).await.unwrap();
    let desk = store
        .create(acme(), AssetDraft::new("DESK-042", "Standing desk", AssetType::Other))
        .await
        .unwrap();

    std::fs::remove_dir_all(&data).unwrap();

    let created = store
        .create(acme(), AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware))
        .await;
    assert!(matches!(created, Err(StoreError::Backend(_))));
    let updated = store
        .apply_update(desk.asset.id, desk.revision, assign_ansh())
        .await;
    assert!(matches!(updated, Err(StoreError::Backend(_))));

    // Neither write is visible
    assert_eq!(
        store.list(&acme(), &AssetFilter::all()).await.unwrap().len(),
        1
    );
    assert!(matches!(
        store.find_by_tag(&acme(), "LAPTOP-001").await,
        Err(StoreError::TagNotFound(_))
    ));
    assert_eq!(store.get(desk.asset.id).await.unwrap(), desk);

    // Retrying once the directory is back succeeds without a duplicate tag
    std::fs::create_dir(&data).unwrap();
    store
        .create(acme(), AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware))
        .await
        .unwrap();
    let assigned = store
        .apply_update(desk.asset.id, desk.revision, assign_ansh())
        .await
        .unwrap();
    assert_eq!(assigned.revision, desk.revision.next());
    drop(store);

    let reopened = FileAssetStore::open(&path).await.unwrap();
    assert_eq!(
        reopened.list(&acme(), &AssetFilter::all()).await.unwrap().len(),
        2
    );
    assert_eq!(reopened.get(desk.asset.id).await.unwrap(), assigned);
}

#[tokio::test]
async fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileAssetStore::open(dir.path().join("none.json")).await.unwrap();
    assert!(store
        .list(&acme(), &AssetFilter::all())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.backend_name(), "file");
}

#[tokio::test]
async fn invalid_snapshot_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assets.json");

    let store = FileAssetStore::open(&path).await.unwrap();
    store
        .create(acme(), AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware))
        .await
        .unwrap();
    drop(store);

    let raw = std::fs::read(&path).unwrap();
    let mut snapshot: Snapshot = serde_json::from_slice(&raw).unwrap();
    snapshot.assets[0].status = "assigned".into();
    std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

    let err = FileAssetStore::open(&path).await.unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
}

#[tokio::test]
async fn garbage_file_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assets.json");
    std::fs::write(&path, b"not json").unwrap();
    assert!(matches!(
        FileAssetStore::open(&path).await,
        Err(StoreError::Backend(_))
    ));
}
