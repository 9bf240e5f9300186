//! Credential store outages are reported as retryable, never as bad credentials

#![cfg(feature = "sqlite")]

mod helpers;

use axum::http::StatusCode;
use helpers::{body_json, set_cookies, TestApp};
use terravale_core::Role;
use terravale_web::auth::{database::DatabaseUserStore, users::UserStore};

#[tokio::test]
async fn test_login_during_store_outage_is_retryable() {
    let store = DatabaseUserStore::connect("sqlite::memory:").await.unwrap();
    let app = TestApp::with_store(UserStore::database(store.clone()));
    app.provision("a@x.com", "right-secret", Role::Buyer).await;

    store.pool().close().await;

    let response = app.login("a@x.com", "right-secret").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(set_cookies(&response).is_empty());

    let body = body_json(response).await;
    assert_eq!(body["error"], "store_unavailable");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_login_against_live_store_succeeds() {
    let store = DatabaseUserStore::connect("sqlite::memory:").await.unwrap();
    let app = TestApp::with_store(UserStore::database(store));
    app.provision("a@x.com", "right-secret", Role::Labour).await;

    let response = app.login("a@x.com", "right-secret").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookies(&response).len(), 1);
    assert_eq!(body_json(response).await["role"], "labour");
}
