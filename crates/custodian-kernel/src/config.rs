//! Inventory configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! | Variable                | Field             |
//! |-------------------------|-------------------|
//! | `CUSTODIAN_PUBLIC_BASE` | `public_base`     |
//! | `CUSTODIAN_BIND`        | `resolver.bind`   |
//!
//! ```toml
//! public_base = "https://inventory.example.com"
//!
//! [resolver]
//! bind = "0.0.0.0:8080"
//! tenant = "acme"
//!
//! [store]
//! backend = "file"
//! path = "/var/lib/custodian/assets.json"
//! ```

use crate::handle::InventoryHandle;
use custodian_model::{BaseLocatorError, QrCodec, TenantId};
use custodian_store::{AssetStore, FileAssetStore, InMemoryAssetStore, StoreError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the public base locator
pub const ENV_PUBLIC_BASE: &str = "CUSTODIAN_PUBLIC_BASE";
/// Environment variable overriding the resolver bind address
pub const ENV_BIND: &str = "CUSTODIAN_BIND";

/// Default `Cache-Control` for resolver responses
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=300, s-maxage=600";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid public base: {0}")]
    PublicBase(#[from] BaseLocatorError),

    #[error("invalid bind address {value:?}")]
    Bind { value: String },

    #[error("file backend requires store.path")]
    MissingStorePath,

    #[error("resolver tenant must not be empty")]
    MissingTenant,

    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Empty in-memory store
    #[default]
    Memory,
    /// In-memory store seeded with the sample inventory
    Mock,
    /// Snapshot file
    File,
}

/// Store settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Snapshot location for the file backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// HTTP resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub bind: SocketAddr,
    /// Tenant whose assets the resolver serves
    pub tenant: String,
    pub cache_control: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            tenant: "default".into(),
            cache_control: DEFAULT_CACHE_CONTROL.into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Base locator embedded in QR codes; card payloads when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base: Option<String>,
    pub store: StoreConfig,
    pub resolver: ResolverConfig,
}

impl InventoryConfig {
    /// Set the QR base locator
    #[must_use]
    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = Some(base.into());
        self
    }

    /// Set the store backend
    #[must_use]
    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.store.backend = backend;
        self
    }

    /// Set the snapshot path and select the file backend
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.backend = StoreBackend::File;
        self.store.path = Some(path.into());
        self
    }

    /// Set the tenant the resolver serves
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.resolver.tenant = tenant.into();
        self
    }

    /// Set the resolver bind address
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.resolver.bind = bind;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML or unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from an optional file, apply process environment, validate
    ///
    /// # Errors
    /// Any [`ConfigError`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    ///
    /// An empty `CUSTODIAN_PUBLIC_BASE` clears the base.
    ///
    /// # Errors
    /// [`ConfigError::Bind`] if `CUSTODIAN_BIND` is not a socket address.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(base) = lookup(ENV_PUBLIC_BASE) {
            let base = base.trim();
            self.public_base = (!base.is_empty()).then(|| base.to_string());
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.resolver.bind = bind
                .trim()
                .parse()
                .map_err(|_| ConfigError::Bind { value: bind.clone() })?;
        }
        Ok(self)
    }

    /// Check cross-field requirements
    ///
    /// # Errors
    /// Bad public base, missing file path, empty tenant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.codec()?;
        if self.store.backend == StoreBackend::File && self.store.path.is_none() {
            return Err(ConfigError::MissingStorePath);
        }
        if self.resolver.tenant.trim().is_empty() {
            return Err(ConfigError::MissingTenant);
        }
        Ok(())
    }

    /// QR codec for the configured base
    ///
    /// # Errors
    /// [`ConfigError::PublicBase`] if the base is not an absolute http(s)
    /// locator.
    pub fn codec(&self) -> Result<QrCodec, ConfigError> {
        Ok(QrCodec::from_optional_base(self.public_base.as_deref())?)
    }

    /// Tenant the resolver serves
    #[must_use]
    pub fn resolver_tenant(&self) -> TenantId {
        TenantId::new(self.resolver.tenant.trim())
    }

    /// Construct the configured store
    ///
    /// # Errors
    /// [`ConfigError::MissingStorePath`], or store failures while loading
    /// or seeding.
    pub async fn build_store(&self) -> Result<Arc<dyn AssetStore>, ConfigError> {
        let store: Arc<dyn AssetStore> = match self.store.backend {
            StoreBackend::Memory => Arc::new(InMemoryAssetStore::new()),
            StoreBackend::Mock => {
                Arc::new(InMemoryAssetStore::with_samples(&self.resolver_tenant()).await?)
            }
            StoreBackend::File => {
                let path = self.store.path.as_ref().ok_or(ConfigError::MissingStorePath)?;
                Arc::new(FileAssetStore::open(path).await?)
            }
        };
        tracing::info!("Using {} asset store", store.backend_name());
        Ok(store)
    }

    /// Wire a handle from this configuration
    ///
    /// # Errors
    /// See [`Self::codec`] and [`Self::build_store`].
    pub async fn build_handle(&self) -> Result<InventoryHandle, ConfigError> {
        let codec = self.codec()?;
        let store = self.build_store().await?;
        Ok(InventoryHandle::new(store).with_codec(codec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = InventoryConfig::default();
        assert_eq!(config.resolver.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.resolver.cache_control, DEFAULT_CACHE_CONTROL);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.public_base.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_toml() {
        let config = InventoryConfig::from_toml_str(
            r#"
            public_base = "https://inventory.example.com/"

            [resolver]
            bind = "0.0.0.0:9000"
            tenant = "acme"

            [store]
            backend = "mock"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Mock);
        assert_eq!(config.resolver.tenant, "acme");
        assert_eq!(config.resolver.cache_control, DEFAULT_CACHE_CONTROL);
        assert_eq!(
            config.codec().unwrap().base(),
            Some("https://inventory.example.com")
        );
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = InventoryConfig::from_toml_str("[store]\nbackend = \"postgres\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_PUBLIC_BASE, "http://localhost:3000"),
            (ENV_BIND, "127.0.0.1:9999"),
        ]);
        let config = InventoryConfig::default()
            .with_env(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.public_base.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.resolver.bind.port(), 9999);

        let cleared = config.with_env(|k| (k == ENV_PUBLIC_BASE).then(String::new)).unwrap();
        assert!(cleared.public_base.is_none());
    }

    #[test]
    fn bad_bind_is_rejected() {
        let err = InventoryConfig::default()
            .with_env(|k| (k == ENV_BIND).then(|| "nowhere".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Bind { .. }));
    }

    #[test]
    fn validation_catches_bad_fields() {
        let mut config = InventoryConfig {
            public_base: Some("ftp://files.example.com".into()),
            ..InventoryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PublicBase(_))));

        config.public_base = None;
        config.store.backend = StoreBackend::File;
        assert!(matches!(config.validate(), Err(ConfigError::MissingStorePath)));

        config.store.backend = StoreBackend::Memory;
        config.resolver.tenant = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingTenant)));
    }

    #[tokio::test]
    async fn mock_backend_is_seeded() {
        let config = InventoryConfig::default()
            .with_backend(StoreBackend::Mock)
            .with_tenant("acme");
        let store = config.build_store().await.unwrap();
        assert!(store
            .find_by_tag(&config.resolver_tenant(), "DESK-042")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn file_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = InventoryConfig::default()
            .with_public_base("https://inventory.example.com")
            .with_store_path(dir.path().join("assets.json"));
        assert!(config.validate().is_ok());

        let handle = config.build_handle().await.unwrap();
        assert_eq!(handle.backend_name(), "file");
        assert_eq!(handle.codec().base(), Some("https://inventory.example.com"));
    }
}
