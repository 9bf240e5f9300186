//! Signed session tokens (HS256 JWT)

use super::SessionUser;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use terravale_core::{Role, SessionConfig};
use tracing::{debug, warn};

/// Session lifetime: 24 hours, expressed in milliseconds
pub const SESSION_TTL_MS: i64 = 86_400_000;

/// Signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Login email at issuance
    pub email: String,
    /// Role held at issuance
    pub role: Role,
    /// Issuer
    pub iss: String,
    /// Issued at (seconds)
    pub iat: i64,
    /// Expiration time (seconds)
    pub exp: i64,
}

impl SessionClaims {
    fn new(user_id: &str, email: &str, role: Role, issuer: &str, issued_at: DateTime<Utc>) -> Self {
        let expires_at = issued_at + Duration::milliseconds(SESSION_TTL_MS);
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iss: issuer.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Check if token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        SessionUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// A freshly minted token together with its validity window
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: &'static str,
    },
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Role '{0}' cannot be self-registered")]
    RoleNotRegistrable(Role),
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing session")]
    MissingSession,
    #[error("Account no longer exists")]
    UserNotFound,
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_))
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password".to_string(),
            ),
            AuthError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                "missing_credentials",
                "Email and password are required".to_string(),
            ),
            AuthError::InvalidInput { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_input", self.to_string())
            }
            AuthError::MalformedBody(detail) => {
                (StatusCode::BAD_REQUEST, "invalid_input", detail.clone())
            }
            AuthError::EmailTaken => (
                StatusCode::CONFLICT,
                "email_taken",
                "An account with this email already exists".to_string(),
            ),
            AuthError::RoleNotRegistrable(role) => (
                StatusCode::FORBIDDEN,
                "role_not_registrable",
                format!("Accounts with role '{}' must be provisioned by an operator", role),
            ),
            AuthError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_creation_failed",
                "Failed to create session token".to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid or malformed session token".to_string(),
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Session has expired".to_string(),
            ),
            AuthError::MissingSession => (
                StatusCode::UNAUTHORIZED,
                "missing_session",
                "Authentication is required".to_string(),
            ),
            AuthError::UserNotFound => (
                StatusCode::UNAUTHORIZED,
                "user_not_found",
                "The account for this session no longer exists".to_string(),
            ),
            AuthError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "Credential store is temporarily unavailable".to_string(),
            ),
            AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        let body = Json(json!({
            "error": error_code,
            "message": message,
            "retryable": self.is_transient(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        AuthError::MalformedBody(rejection.body_text())
    }
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct JwtService {
    keys: Arc<Keys>,
    issuer: String,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            keys: Arc::new(Keys::new(secret)),
            issuer: issuer.into(),
        }
    }

    /// Build from session settings. Without a configured secret a random
    /// per-process secret is used, so tokens do not survive a restart.
    pub fn from_config(config: &SessionConfig) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret.as_bytes(), config.issuer.clone()),
            None => {
                warn!("JWT_SECRET not set; using an ephemeral signing secret");
                let secret = format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
                Self::new(secret.as_bytes(), config.issuer.clone())
            }
        }
    }

    /// Mint a session token for the given identity
    pub fn issue(&self, user_id: &str, email: &str, role: Role) -> Result<IssuedToken, AuthError> {
        let issued_at = Utc::now();
        let claims = SessionClaims::new(user_id, email, role, &self.issuer, issued_at);
        let expires_at = issued_at + Duration::milliseconds(SESSION_TTL_MS);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| {
                warn!("Failed to encode session token: {}", e);
                AuthError::TokenCreation
            })?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature, issuer and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        let token_data =
            decode::<SessionClaims>(token, &self.keys.decoding, &validation).map_err(|e| {
                debug!("Token verification failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;

        let claims = token_data.claims;

        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(b"test-secret-that-is-long-enough-for-hs256", "terravale-test")
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = service();
        let issued = jwt.issue("user-1", "a@x.com", Role::Buyer).unwrap();

        assert_eq!(
            (issued.expires_at - issued.issued_at).num_milliseconds(),
            SESSION_TTL_MS
        );

        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Buyer);
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_MS / 1000);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let issued = JwtService::new(b"another-secret", "terravale-test")
            .issue("user-1", "a@x.com", Role::Admin)
            .unwrap();

        assert!(matches!(
            service().verify(&issued.token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_rejects_foreign_issuer() {
        let secret = b"test-secret-that-is-long-enough-for-hs256";
        let issued = JwtService::new(secret, "someone-else")
            .issue("user-1", "a@x.com", Role::Admin)
            .unwrap();

        assert!(matches!(
            service().verify(&issued.token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let jwt = service();
        let claims = SessionClaims::new(
            "user-1",
            "a@x.com",
            Role::Labour,
            "terravale-test",
            Utc::now() - Duration::hours(25),
        );
        let token = encode(&Header::new(Algorithm::HS256), &claims, &jwt.keys.encoding).unwrap();

        assert!(matches!(jwt.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            service().verify("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_only_store_failures_are_transient() {
        assert!(AuthError::StoreUnavailable("down".into()).is_transient());
        assert!(!AuthError::InvalidCredentials.is_transient());
        assert!(!AuthError::TokenExpired.is_transient());
    }
}
