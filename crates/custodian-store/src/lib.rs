//! Custodian Store
//!
//! Durable mapping from asset id to record, and from `(tenant, tag)` to id.
//!
//! Writes are optimistic: every record carries a [`Revision`], and
//! [`AssetStore::apply_update`] commits only if the revision observed by the
//! caller is still current. A status change and its ledger appends travel in
//! one [`AssetPatch`] and commit together or not at all.
//!
//! Implementations:
//! - [`InMemoryAssetStore`]: concurrent in-process store
//! - [`FileAssetStore`]: in-memory store persisted as versioned
//!   [`AssetDocument`] snapshots

#![warn(unreachable_pub)]

pub mod document;
pub mod file;
pub mod filter;
pub mod memory;
pub mod patch;
pub mod samples;
pub mod store;

pub use document::{AssetDocument, AssignmentEventDocument, DocumentError, Snapshot, DOCUMENT_VERSION};
pub use file::FileAssetStore;
pub use filter::{AssetFilter, SortOrder};
pub use memory::InMemoryAssetStore;
pub use patch::{AssetPatch, HistoryAppend};
pub use samples::sample_drafts;
pub use store::{AssetStore, Revision, StoreError, StoredAsset};
