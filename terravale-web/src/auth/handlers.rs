//! Authentication handlers for registration, login, logout and profile management

use super::{
    jwt::AuthError,
    session::LoginResponse,
    users::{LoginRequest, RegisterRequest, UpdateProfileRequest, UserInfo},
    SessionUser,
};
use crate::AppState;
use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use tracing::info;

/// JSON request body whose rejections use the API error shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AuthError))]
pub struct ApiJson<T>(pub T);

/// User registration endpoint
///
/// Creates a buyer or labour account. Admin accounts are provisioned by operators.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserInfo),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Role cannot be self-registered"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(app_state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserInfo>), AuthError> {
    info!("User registration attempt: {}", request.email);

    let user = app_state.user_service.register(request).await?;

    info!("User registered successfully: {}", user.email);
    Ok((StatusCode::CREATED, Json(user.to_user_info())))
}

/// User login endpoint
///
/// Verifies the credential pair and sets the session cookie. No cookie is set on failure.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; Set-Cookie carries the token", body = LoginResponse),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Invalid email or password"),
        (status = 503, description = "Credential store unavailable")
    )
)]
pub async fn login_user(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    info!("User login attempt: {}", request.email);

    let (jar, response) = app_state.sessions.login(jar, request).await?;

    info!("User logged in successfully: {}", response.user.email);
    Ok((jar, Json(response)))
}

/// Logout endpoint
///
/// Tokens are stateless and cannot be revoked; this clears the session cookie
/// and always succeeds, with or without an active session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session cookie cleared")
    )
)]
pub async fn logout_user(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    info!("User logout");

    (
        app_state.sessions.logout(jar),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// Get current user information
///
/// Reloads the account from the store; a valid token for a deleted account is rejected.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing, invalid or expired session")
    )
)]
pub async fn get_current_user(
    State(app_state): State<AppState>,
    user: SessionUser,
) -> Result<Json<UserInfo>, AuthError> {
    let user_data = app_state
        .user_service
        .get_user_by_id(&user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user_data.to_user_info()))
}

/// Profile edit endpoint
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserInfo),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing, invalid or expired session")
    )
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    user: SessionUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserInfo>, AuthError> {
    info!("Profile update for user: {}", user.id);

    let updated = app_state
        .user_service
        .update_profile(&user.id, request)
        .await?;

    Ok(Json(updated.to_user_info()))
}
