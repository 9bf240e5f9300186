//! HTTP request handlers for the Terravale web server
//!
//! Authentication handlers live in [`crate::auth::handlers`]; this module holds
//! the health check and the role-gated dashboards.

pub mod dashboard;
pub mod health;
pub mod types;

pub use dashboard::*;
pub use health::*;
pub use types::*;

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

/// Fallback for unknown routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "No such route",
        })),
    )
}
