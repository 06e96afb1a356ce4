//! Requester contexts
//!
//! Who is asking, and on behalf of which tenant. The kernel's access guard
//! decides from this alone.

use crate::ids::{TenantId, UserId};
use serde::{Deserialize, Serialize};

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub tenant: TenantId,
    pub user_id: UserId,
    pub user_name: String,
}

/// Requester of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequesterContext {
    /// No session
    Anonymous,
    /// Signed-in user
    Authenticated(Session),
}

impl RequesterContext {
    /// Context for a signed-in user
    #[must_use]
    pub fn user(tenant: TenantId, user_id: UserId, user_name: impl Into<String>) -> Self {
        Self::Authenticated(Session {
            tenant,
            user_id,
            user_name: user_name.into(),
        })
    }

    /// Session, if any
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(session) => Some(session),
        }
    }

    /// Tenant of the session, if any
    #[inline]
    #[must_use]
    pub fn tenant(&self) -> Option<&TenantId> {
        self.session().map(|s| &s.tenant)
    }
}
