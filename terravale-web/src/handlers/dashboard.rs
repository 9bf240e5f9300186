//! Role-gated dashboard handlers
//!
//! Each portal gets its own endpoint. The role check happens in the extractor,
//! so a handler body only runs for callers holding the matching role.

use super::types::{AdminDashboard, PortalSummary, PortalViewer};
use crate::{
    auth::{jwt::AuthError, AdminUser, BuyerUser, LabourUser, SessionUser},
    AppState,
};
use axum::{extract::State, response::Json};
use tracing::debug;

/// Admin dashboard with account counts per role
#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboard),
        (status = 401, description = "Missing, invalid or expired session"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<AdminDashboard>, AuthError> {
    debug!("Admin dashboard requested by {}", admin.user.email);

    let users = state.user_service.role_counts().await?;

    Ok(Json(AdminDashboard {
        viewer: PortalViewer::from(&admin.user),
        total_users: users.total(),
        users,
    }))
}

/// Buyer portal summary
#[utoipa::path(
    get,
    path = "/api/dashboard/buyer",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Buyer dashboard", body = PortalSummary),
        (status = 401, description = "Missing, invalid or expired session"),
        (status = 403, description = "Caller is not a buyer")
    )
)]
pub async fn buyer_dashboard(
    State(state): State<AppState>,
    buyer: BuyerUser,
) -> Result<Json<PortalSummary>, AuthError> {
    portal_summary(&state, &buyer.user).await.map(Json)
}

/// Labour portal summary
#[utoipa::path(
    get,
    path = "/api/dashboard/labour",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Labour dashboard", body = PortalSummary),
        (status = 401, description = "Missing, invalid or expired session"),
        (status = 403, description = "Caller is not a labourer")
    )
)]
pub async fn labour_dashboard(
    State(state): State<AppState>,
    labour: LabourUser,
) -> Result<Json<PortalSummary>, AuthError> {
    portal_summary(&state, &labour.user).await.map(Json)
}

async fn portal_summary(state: &AppState, user: &SessionUser) -> Result<PortalSummary, AuthError> {
    let account = state
        .user_service
        .get_user_by_id(&user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(PortalSummary {
        viewer: PortalViewer::from(user),
        greeting: format!("Welcome back, {}", account.profile.full_name),
    })
}
