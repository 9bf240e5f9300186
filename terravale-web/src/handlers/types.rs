//! Response types for the health and dashboard handlers

use crate::auth::{users::RoleCounts, SessionUser};
use serde::Serialize;
use terravale_core::Role;
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Credential store backend
    #[schema(example = "sqlite")]
    pub store: String,
}

/// Admin dashboard payload
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub viewer: PortalViewer,
    pub users: RoleCounts,
    #[schema(example = 12)]
    pub total_users: u64,
}

/// Buyer and labour dashboard payload
#[derive(Debug, Serialize, ToSchema)]
pub struct PortalSummary {
    pub viewer: PortalViewer,
    #[schema(example = "Welcome back, Ada")]
    pub greeting: String,
}

/// Identity of the caller as seen by a dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct PortalViewer {
    pub id: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub role: Role,
}

impl From<&SessionUser> for PortalViewer {
    fn from(user: &SessionUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
