//! Session cookie attributes
//!
//! The frontend and the API are served from different origins, so the cookie
//! must be `SameSite=None`, which browsers only accept together with `Secure`.

use super::jwt::SESSION_TTL_MS;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Builds, reads and clears the session cookie
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie max age: exactly [`SESSION_TTL_MS`]
    pub fn max_age() -> time::Duration {
        time::Duration::milliseconds(SESSION_TTL_MS)
    }

    /// Cookie carrying a freshly issued session token
    pub fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .path("/")
            .max_age(Self::max_age())
            .build()
    }

    /// Cookie that instructs the browser to drop the session
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), ""))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::None)
            .path("/")
            .build();
        cookie.make_removal();
        cookie
    }

    /// Session token presented by the client, if any
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_cookie_attributes() {
        let cookie = SessionCookie::new("token").issue("abc".to_string());

        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age().map(|age| age.whole_milliseconds()),
            Some(86_400_000)
        );

        let header = cookie.to_string();
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=None"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=86400"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = SessionCookie::new("token").removal();

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_read_ignores_empty_value() {
        let session = SessionCookie::new("token");

        let jar = CookieJar::new().add(Cookie::new("token", ""));
        assert_eq!(session.read(&jar), None);

        let jar = CookieJar::new().add(Cookie::new("token", "abc"));
        assert_eq!(session.read(&jar).as_deref(), Some("abc"));

        let jar = CookieJar::new().add(Cookie::new("other", "abc"));
        assert_eq!(session.read(&jar), None);
    }
}
