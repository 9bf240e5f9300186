//! Shared helpers for the web integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::SET_COOKIE, Request, Response},
    Router,
};
use serde_json::{json, Value};
use terravale_core::{Role, TerravaleConfig, UserProfile};
use terravale_web::{auth::users::UserStore, create_app, AppState};
use tower::ServiceExt;

/// Application under test, backed by the in-memory store unless given one
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(UserStore::memory())
    }

    pub fn with_store(store: UserStore) -> Self {
        let mut config = TerravaleConfig::default();
        config.session.jwt_secret = Some("integration-test-secret".to_string());

        let state = AppState::with_store(config, store);
        Self {
            app: create_app(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        self.send(json_request("POST", uri, body, None)).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header("Cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Self-register a buyer or labour account
    pub async fn register(&self, email: &str, password: &str, role: &str) -> Response<Body> {
        self.post_json(
            "/api/auth/register",
            json!({
                "email": email,
                "password": password,
                "role": role,
                "full_name": "Test User",
            }),
        )
        .await
    }

    /// Create an account of any role directly through the service
    pub async fn provision(&self, email: &str, password: &str, role: Role) {
        self.state
            .user_service
            .provision(
                email,
                password,
                role,
                UserProfile {
                    full_name: "Provisioned User".to_string(),
                    ..UserProfile::default()
                },
            )
            .await
            .unwrap();
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        self.post_json(
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Log in and return the `name=value` pair to send back as a Cookie header
    pub async fn session_cookie(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        let set_cookie = set_cookies(&response);
        assert_eq!(set_cookie.len(), 1, "expected exactly one Set-Cookie");
        set_cookie[0]
            .split(';')
            .next()
            .unwrap()
            .trim()
            .to_string()
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
