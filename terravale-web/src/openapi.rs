//! OpenAPI document for the Terravale API

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::auth::{
    session::LoginResponse,
    users::{LoginRequest, RegisterRequest, RoleCounts, UpdateProfileRequest, UserInfo},
};
use crate::handlers::{AdminDashboard, HealthResponse, PortalSummary, PortalViewer};
use terravale_core::{Role, UserProfile};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Terravale Ventures API",
        description = "Accounts, cookie sessions and role-gated portal endpoints",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,

        crate::auth::handlers::register_user,
        crate::auth::handlers::login_user,
        crate::auth::handlers::logout_user,
        crate::auth::handlers::get_current_user,
        crate::auth::handlers::update_profile,

        crate::handlers::admin_dashboard,
        crate::handlers::buyer_dashboard,
        crate::handlers::labour_dashboard,
    ),
    components(
        schemas(
            Role,
            UserProfile,
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            UserInfo,
            RoleCounts,
            AdminDashboard,
            PortalSummary,
            PortalViewer,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and profile management"),
        (name = "Dashboard", description = "Role-gated portal endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Session security schemes: the cookie, or the same token as a bearer header
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Terravale Ventures API");
        assert!(openapi.paths.paths.contains_key("/api/auth/login"));
        assert!(openapi.paths.paths.contains_key("/api/dashboard/admin"));
    }

    #[test]
    fn test_openapi_json() {
        let json = ApiDoc::openapi().to_pretty_json().unwrap();
        assert!(json.contains("Terravale Ventures API"));
        assert!(json.contains("session_cookie"));
    }
}
