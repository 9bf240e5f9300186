//! In-memory authentication state

use serde::{Deserialize, Serialize};
use terravale_core::Role;

/// The signed-in user as far as the portal knows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalUser {
    pub role: Role,
    /// Unknown when the state was restored from storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PortalUser {
    pub fn with_role(role: Role) -> Self {
        Self {
            role,
            id: None,
            email: None,
        }
    }
}

/// Authentication state driving UI gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<PortalUser>,
    /// True until the stored session has been restored
    pub loading: bool,
}

impl AuthState {
    /// State before restoration has run
    pub fn initial() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: true,
        }
    }

    /// Settled, signed-out state
    pub fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: false,
        }
    }

    pub fn signed_in(user: PortalUser) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            loading: false,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Successful login response body as returned by `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub token: String,
    pub role: Role,
    pub user: LoginPayloadUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayloadUser {
    pub id: String,
    pub email: String,
}

impl LoginPayload {
    pub fn portal_user(&self) -> PortalUser {
        PortalUser {
            role: self.role,
            id: Some(self.user.id.clone()),
            email: Some(self.user.email.clone()),
        }
    }
}
