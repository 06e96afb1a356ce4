//! Tenant access guard

use custodian_model::{Asset, DenialReason, InventoryError, RequesterContext, Session};

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny(DenialReason),
}

impl Decision {
    /// Check if access was granted
    #[inline]
    #[must_use]
    pub fn is_permit(self) -> bool {
        matches!(self, Self::Permit)
    }
}

/// Checks a requester against an asset's tenant
///
/// Every read and write of an asset goes through here. Anonymous callers
/// and callers from another tenant are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    /// Require a session
    ///
    /// # Errors
    /// [`DenialReason::Unauthenticated`] for anonymous requesters.
    pub fn session<'a>(&self, requester: &'a RequesterContext) -> Result<&'a Session, InventoryError> {
        requester
            .session()
            .ok_or(InventoryError::AccessDenied(DenialReason::Unauthenticated))
    }

    /// Decide whether `requester` may access `asset`
    #[must_use]
    pub fn decide(&self, requester: &RequesterContext, asset: &Asset) -> Decision {
        match requester.session() {
            None => Decision::Deny(DenialReason::Unauthenticated),
            Some(session) if session.tenant == asset.tenant => Decision::Permit,
            Some(_) => Decision::Deny(DenialReason::CrossTenant),
        }
    }

    /// [`Self::decide`] as a result
    ///
    /// # Errors
    /// [`InventoryError::AccessDenied`] with the denial reason.
    pub fn authorize(&self, requester: &RequesterContext, asset: &Asset) -> Result<(), InventoryError> {
        match self.decide(requester, asset) {
            Decision::Permit => Ok(()),
            Decision::Deny(reason) => {
                tracing::warn!(
                    "Denied access to asset {} ({}) for {:?}",
                    asset.id,
                    reason,
                    requester.tenant().map(|t| t.as_str())
                );
                Err(InventoryError::AccessDenied(reason))
            }
        }
    }
}
