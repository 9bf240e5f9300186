//! Session issuance: credential check, token minting and the session cookie

use super::{
    cookie::SessionCookie,
    jwt::{AuthError, JwtService},
    users::{LoginRequest, UserInfo, UserService},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use terravale_core::{Role, SessionConfig};
use tracing::info;
use utoipa::ToSchema;

/// Successful login payload
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserInfo,
    /// Role claim for client-side route gating
    pub role: Role,
    /// Session token, also delivered as the session cookie
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Verifies credentials and hands out session cookies
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    users: UserService,
    tokens: JwtService,
    cookie: SessionCookie,
}

impl SessionIssuer {
    pub fn new(users: UserService, tokens: JwtService, cookie: SessionCookie) -> Self {
        Self {
            users,
            tokens,
            cookie,
        }
    }

    pub fn from_config(users: UserService, config: &SessionConfig) -> Self {
        Self::new(
            users,
            JwtService::from_config(config),
            SessionCookie::new(config.cookie_name.clone()),
        )
    }

    pub fn tokens(&self) -> &JwtService {
        &self.tokens
    }

    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// Authenticate and, on success only, add exactly one session cookie to the jar.
    /// The jar is consumed either way, so a failed attempt cannot leak a cookie.
    pub async fn login(
        &self,
        jar: CookieJar,
        request: LoginRequest,
    ) -> Result<(CookieJar, LoginResponse), AuthError> {
        let user = self.users.authenticate(&request).await?;
        let issued = self.tokens.issue(&user.id, &user.email, user.role)?;

        let jar = jar.add(self.cookie.issue(issued.token.clone()));
        info!("Issued session for {} ({})", user.email, user.role);

        Ok((
            jar,
            LoginResponse {
                role: user.role,
                user: user.to_user_info(),
                token: issued.token,
                expires_at: issued.expires_at,
            },
        ))
    }

    /// Clear the session cookie. Safe to call with or without an active session.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.cookie.removal())
    }
}
