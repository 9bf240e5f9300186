//! Route definitions for the Terravale web server

use crate::{auth, handlers, openapi, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        .nest("/auth", auth_routes())
        .nest("/dashboard", dashboard_routes())
}

/// Account and session routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::handlers::register_user))
        .route("/login", post(auth::handlers::login_user))
        .route("/logout", post(auth::handlers::logout_user))
        .route("/me", get(auth::handlers::get_current_user))
        .route("/profile", put(auth::handlers::update_profile))
}

/// Role-gated portal routes
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(handlers::admin_dashboard))
        .route("/buyer", get(handlers::buyer_dashboard))
        .route("/labour", get(handlers::labour_dashboard))
}
