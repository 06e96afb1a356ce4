//! Custodian Kernel
//!
//! Operations of the inventory core:
//! - Lifecycle state machine and the planner that turns operations into
//!   atomic record patches
//! - Assignment ledger, the only writer of assignment history
//! - Tenant access guard applied to every read and write
//! - [`InventoryHandle`], the entry point callers hold
//! - Configuration and tracing setup for binaries
//!
//! # Example
//!
//! ```rust
//! use custodian_kernel::InventoryHandle;
//! use custodian_model::{AssetDraft, AssetStatus, AssetType, RequesterContext, TenantId, UserId};
//! use custodian_store::InMemoryAssetStore;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let handle = InventoryHandle::new(Arc::new(InMemoryAssetStore::new()));
//! let admin = RequesterContext::user(TenantId::new("acme"), UserId::new("u-1"), "Admin");
//!
//! let laptop = handle
//!     .create_asset(&admin, AssetDraft::new("LAPTOP-001", "Dell XPS 15", AssetType::Hardware))
//!     .await
//!     .unwrap();
//! let laptop = handle
//!     .assign_asset(&admin, laptop.id, UserId::new("u-2"), "Ansh")
//!     .await
//!     .unwrap();
//! assert_eq!(laptop.status, AssetStatus::Assigned);
//! # });
//! ```

pub mod clock;
pub mod config;
pub mod guard;
pub mod handle;
pub mod ledger;
pub mod lifecycle;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConfigError, InventoryConfig, ResolverConfig, StoreBackend, StoreConfig,
    DEFAULT_CACHE_CONTROL, ENV_BIND, ENV_PUBLIC_BASE,
};
pub use guard::{AccessGuard, Decision};
pub use handle::{AssetStats, InventoryHandle, InventoryResult};
pub use ledger::AssignmentLedger;
pub use lifecycle::{
    allowed_transitions, validate_disposal, validate_transition, LifecycleEngine, DISPOSABLE,
};
pub use logging::init_tracing;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
