//! QR identity codec
//!
//! A printed code carries one of two payload shapes:
//! - a locator `<base>/asset-detail?id=<assetId>` any generic scanner can open
//! - a self-describing asset card `{id, assetTag, name, serialNumber}` used
//!   when no public base is configured
//!
//! Both decode to the same [`AssetId`]. The origin of a locator is not
//! checked, so codes stay valid when the serving origin moves.

use crate::asset::Asset;
use crate::error::DecodeError;
use crate::ids::AssetId;
use serde::{Deserialize, Serialize};
use url::Url;

/// Final path segment of an asset detail locator
pub const ASSET_DETAIL_PATH: &str = "asset-detail";

/// Query parameter carrying the asset id
const ID_PARAM: &str = "id";

/// Fallback payload shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCard {
    pub id: AssetId,
    pub asset_tag: String,
    pub name: String,
    #[serde(default)]
    pub serial_number: Option<String>,
}

impl From<&Asset> for AssetCard {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id,
            asset_tag: asset.asset_tag.clone(),
            name: asset.details.name.clone(),
            serial_number: asset.details.serial_number.clone(),
        }
    }
}

/// Decoded or encoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    /// Resolvable locator
    Locator(String),
    /// Self-describing card
    Card(AssetCard),
}

impl QrPayload {
    /// Text to embed in the code
    ///
    /// # Errors
    /// Returns the encoder error if a card cannot be serialized.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Locator(url) => Ok(url.clone()),
            Self::Card(card) => serde_json::to_string(card),
        }
    }
}

/// Problems with a configured public base locator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BaseLocatorError {
    /// Not a URL
    #[error("unparseable base locator: {0}")]
    Unparseable(String),

    /// Only http and https can be opened by generic scanners
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// Base must be a plain origin or path, without query or fragment
    #[error("base locator must not carry a query or fragment: {0}")]
    NotABase(String),
}

/// Encoder/decoder for QR payloads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QrCodec {
    base: Option<String>,
}

impl QrCodec {
    /// Codec without a public base; encodes asset cards
    #[inline]
    #[must_use]
    pub fn fallback() -> Self {
        Self { base: None }
    }

    /// Codec encoding locators under `base`
    ///
    /// # Errors
    /// Returns [`BaseLocatorError`] if `base` is not an http(s) URL usable
    /// as a prefix.
    pub fn with_base(base: &str) -> Result<Self, BaseLocatorError> {
        let url = Url::parse(base.trim())
            .map_err(|e| BaseLocatorError::Unparseable(format!("{base}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BaseLocatorError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
            return Err(BaseLocatorError::NotABase(base.to_string()));
        }
        Ok(Self {
            base: Some(url.as_str().trim_end_matches('/').to_string()),
        })
    }

    /// Codec from an optional base
    ///
    /// # Errors
    /// See [`QrCodec::with_base`].
    pub fn from_optional_base(base: Option<&str>) -> Result<Self, BaseLocatorError> {
        match base {
            Some(base) if !base.trim().is_empty() => Self::with_base(base),
            _ => Ok(Self::fallback()),
        }
    }

    /// Normalized base, if configured
    #[inline]
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Locator for `id`, if a base is configured
    #[must_use]
    pub fn locator_for(&self, id: AssetId) -> Option<String> {
        self.base
            .as_ref()
            .map(|base| format!("{base}/{ASSET_DETAIL_PATH}?{ID_PARAM}={id}"))
    }

    /// Payload for an asset
    #[must_use]
    pub fn encode(&self, asset: &Asset) -> QrPayload {
        match self.locator_for(asset.id) {
            Some(locator) => QrPayload::Locator(locator),
            None => QrPayload::Card(AssetCard::from(asset)),
        }
    }

    /// Parse either payload shape
    ///
    /// # Errors
    /// [`DecodeError::InvalidPayload`] for unrecognized text,
    /// [`DecodeError::WrongResourceType`] for locators that do not point at
    /// an asset detail view.
    pub fn parse(payload: &str) -> Result<QrPayload, DecodeError> {
        let text = payload.trim();
        if text.is_empty() {
            return Err(DecodeError::InvalidPayload("empty payload".into()));
        }

        if text.starts_with('{') {
            return serde_json::from_str::<AssetCard>(text)
                .map(QrPayload::Card)
                .map_err(|e| DecodeError::InvalidPayload(format!("malformed asset card: {e}")));
        }

        let url = Url::parse(text)
            .map_err(|_| DecodeError::InvalidPayload("neither a locator nor an asset card".into()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DecodeError::InvalidPayload(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let is_detail = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .is_some_and(|last| last == ASSET_DETAIL_PATH);
        if !is_detail {
            return Err(DecodeError::WrongResourceType(url.path().to_string()));
        }

        let raw_id = url
            .query_pairs()
            .find(|(key, _)| key == ID_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| DecodeError::InvalidPayload("locator carries no asset id".into()))?;
        raw_id
            .parse::<AssetId>()
            .map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;

        Ok(QrPayload::Locator(url.into()))
    }

    /// Asset id referenced by a payload
    ///
    /// # Errors
    /// See [`QrCodec::parse`].
    pub fn decode(payload: &str) -> Result<AssetId, DecodeError> {
        match Self::parse(payload)? {
            QrPayload::Card(card) => Ok(card.id),
            QrPayload::Locator(locator) => Url::parse(&locator)
                .ok()
                .and_then(|url| {
                    url.query_pairs()
                        .find(|(key, _)| key == ID_PARAM)
                        .and_then(|(_, value)| value.parse().ok())
                })
                .ok_or_else(|| DecodeError::InvalidPayload(locator)),
        }
    }
}
