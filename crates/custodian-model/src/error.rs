//! Error types for the inventory core
//!
//! Every failure reaches the caller as a typed result:
//! - Unknown ids and tag collisions
//! - Lifecycle violations, naming source and target
//! - Optimistic concurrency losses
//! - Access denials, with a sub-reason
//! - QR payload decode failures

use crate::asset::AssetStatus;
use crate::ids::AssetId;

/// Why a requester was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// Asset belongs to another tenant
    CrossTenant,
    /// No session
    Unauthenticated,
    /// Generic denial that does not reveal whether the asset exists
    Withheld,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CrossTenant => "cross-tenant access",
            Self::Unauthenticated => "unauthenticated",
            Self::Withheld => "access denied",
        })
    }
}

/// QR payload decode failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload is neither a locator nor an asset card
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Well-formed locator that does not point at an asset detail view
    #[error("locator does not identify an asset: {0}")]
    WrongResourceType(String),
}

/// Main inventory error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// Unknown id or tag
    #[error("not found: {0}")]
    NotFound(String),

    /// Tag already used in the tenant
    #[error("duplicate asset tag: {tag}")]
    DuplicateTag {
        /// The colliding tag
        tag: String,
    },

    /// Lifecycle state machine violation
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: AssetStatus,
        /// Requested status
        to: AssetStatus,
    },

    /// Record changed between read and commit
    #[error("concurrent modification of asset {0}")]
    Conflict(AssetId),

    /// Requester may not see or touch the asset
    #[error("access denied: {0}")]
    AccessDenied(DenialReason),

    /// QR payload could not be decoded
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Draft or edit is incomplete
    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    /// Backend failure
    #[error("store error: {0}")]
    Store(String),
}

impl InventoryError {
    /// Not-found error for an id
    #[inline]
    #[must_use]
    pub fn not_found(id: AssetId) -> Self {
        Self::NotFound(id.to_string())
    }

    /// Check if the caller may retry after re-reading
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if the error is an access denial
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    /// Check if the error names a status machine violation
    #[inline]
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_both_ends() {
        let err = InventoryError::InvalidTransition {
            from: AssetStatus::Retired,
            to: AssetStatus::Assigned,
        };
        assert_eq!(err.to_string(), "invalid transition: retired -> assigned");
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(InventoryError::Conflict(AssetId::new()).is_retryable());
        assert!(!InventoryError::AccessDenied(DenialReason::Withheld).is_retryable());
        assert!(!InventoryError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn decode_errors_convert() {
        let err: InventoryError = DecodeError::InvalidPayload("garbage".into()).into();
        assert!(matches!(err, InventoryError::Decode(DecodeError::InvalidPayload(_))));
    }
}
