//! Custodian Model
//!
//! Shared vocabulary of the inventory core:
//! - Asset records, lifecycle status and descriptive attributes
//! - Assignment events and the append-only assignment history
//! - Tenants, sessions and requester contexts
//! - The QR identity codec binding a printed code to an asset id
//! - The boundary error taxonomy
//!
//! # Example
//!
//! ```rust
//! use custodian_model::{AssetId, QrCodec};
//!
//! let codec = QrCodec::with_base("https://inventory.example.com").unwrap();
//! let id = AssetId::new();
//! let payload = codec.locator_for(id).unwrap();
//! assert_eq!(QrCodec::decode(&payload).unwrap(), id);
//! ```

pub mod asset;
pub mod error;
pub mod ids;
pub mod qr;
pub mod tenancy;

pub use asset::{
    Asset, AssetDetails, AssetDraft, AssetEdit, AssetStatus, AssetType, Assignee,
    AssignmentAction, AssignmentEvent, AssignmentHistory, HistoryError,
};
pub use error::{DecodeError, DenialReason, InventoryError};
pub use ids::{AssetId, IdParseError, TenantId, UserId};
pub use qr::{AssetCard, BaseLocatorError, QrCodec, QrPayload, ASSET_DETAIL_PATH};
pub use tenancy::{RequesterContext, Session};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
