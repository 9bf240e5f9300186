//! Authentication and role-based authorization

pub mod cookie;
#[cfg(feature = "sqlite")]
pub mod database;
pub mod handlers;
pub mod jwt;
pub mod session;
pub mod users;

#[cfg(test)]
mod tests;

use self::{cookie::SessionCookie, jwt::AuthError};
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use terravale_core::Role;
use tracing::warn;

/// Identity carried by a verified session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Session token from the cookie, falling back to an `Authorization: Bearer` header
fn session_token(headers: &HeaderMap, cookie: &SessionCookie) -> Option<String> {
    if let Some(token) = cookie.read(&CookieJar::from_headers(headers)) {
        return Some(token);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let sessions = &app_state.sessions;

        let token = session_token(&parts.headers, sessions.cookie())
            .ok_or(AuthError::MissingSession)?;

        sessions.tokens().verify(&token).map(SessionUser::from)
    }
}

/// Optional session extractor - doesn't fail if the caller is anonymous
pub struct OptionalSessionUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalSessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalSessionUser(
            SessionUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// Role required by a [`RequireRole`] extractor
pub trait RoleRequirement: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct AdminOnly;
pub struct BuyerOnly;
pub struct LabourOnly;

impl RoleRequirement for AdminOnly {
    const ROLE: Role = Role::Admin;
}

impl RoleRequirement for BuyerOnly {
    const ROLE: Role = Role::Buyer;
}

impl RoleRequirement for LabourOnly {
    const ROLE: Role = Role::Labour;
}

/// Session whose role equals `R::ROLE`
pub struct RequireRole<R: RoleRequirement> {
    pub user: SessionUser,
    _role: PhantomData<R>,
}

pub type AdminUser = RequireRole<AdminOnly>;
pub type BuyerUser = RequireRole<BuyerOnly>;
pub type LabourUser = RequireRole<LabourOnly>;

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    AppState: FromRef<S>,
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = SessionUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if user.role == R::ROLE {
            Ok(RequireRole {
                user,
                _role: PhantomData,
            })
        } else {
            warn!(
                "Role '{}' required but user '{}' has role '{}'",
                R::ROLE,
                user.id,
                user.role
            );
            Err(RoleDenied::new(R::ROLE, &user).into_response())
        }
    }
}

/// Role mismatch on a role-gated route
#[derive(Debug)]
pub struct RoleDenied {
    pub required_role: Role,
    pub actual_role: Role,
    pub user_id: String,
}

impl RoleDenied {
    pub fn new(required_role: Role, user: &SessionUser) -> Self {
        Self {
            required_role,
            actual_role: user.role,
            user_id: user.id.clone(),
        }
    }
}

impl IntoResponse for RoleDenied {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "role_denied",
                "message": format!("This resource requires the '{}' role", self.required_role),
                "required_role": self.required_role,
                "actual_role": self.actual_role,
            })),
        )
            .into_response()
    }
}
