use super::*;
use crate::auth::users::UserStore;
use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, Request},
};
use terravale_core::TerravaleConfig;

fn state() -> AppState {
    let mut config = TerravaleConfig::default();
    config.session.jwt_secret = Some("extractor-test-secret".to_string());
    AppState::with_store(config, UserStore::memory())
}

fn token_for(state: &AppState, role: Role) -> String {
    state
        .sessions
        .tokens()
        .issue("user-1", "a@x.com", role)
        .unwrap()
        .token
}

fn parts(header: Option<(axum::http::HeaderName, String)>) -> Parts {
    let mut builder = Request::builder().uri("/api/auth/me");
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    builder.body(()).unwrap().into_parts().0
}

#[tokio::test]
async fn test_session_from_cookie() {
    let state = state();
    let token = token_for(&state, Role::Buyer);
    let mut parts = parts(Some((COOKIE, format!("theme=dark; token={}", token))));

    let user = SessionUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(user.role, Role::Buyer);
}

#[tokio::test]
async fn test_session_from_bearer_header() {
    let state = state();
    let token = token_for(&state, Role::Labour);
    let mut parts = parts(Some((AUTHORIZATION, format!("Bearer {}", token))));

    let user = SessionUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(user.role, Role::Labour);
}

#[tokio::test]
async fn test_missing_session_is_rejected() {
    let state = state();
    let mut parts = parts(None);

    let result = SessionUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AuthError::MissingSession)));

    let OptionalSessionUser(user) = OptionalSessionUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn test_foreign_token_is_rejected() {
    let state = state();
    let foreign = jwt::JwtService::new(b"some-other-secret", "terravale-api")
        .issue("user-1", "a@x.com", Role::Admin)
        .unwrap()
        .token;
    let mut parts = parts(Some((COOKIE, format!("token={}", foreign))));

    let result = SessionUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn test_role_requirement() {
    let state = state();
    let token = token_for(&state, Role::Buyer);

    let mut buyer_parts = parts(Some((COOKIE, format!("token={}", token))));
    let buyer = BuyerUser::from_request_parts(&mut buyer_parts, &state)
        .await
        .unwrap();
    assert_eq!(buyer.user.email, "a@x.com");

    let mut admin_parts = parts(Some((COOKIE, format!("token={}", token))));
    let denied = AdminUser::from_request_parts(&mut admin_parts, &state)
        .await
        .err()
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let mut anonymous = parts(None);
    let denied = LabourUser::from_request_parts(&mut anonymous, &state)
        .await
        .err()
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
}
