//! Shared-secret gate in front of the admin panel.
//!
//! One plaintext password from configuration. A correct password yields an
//! opaque session token kept in memory and handed out as a cookie. This only
//! hides the admin UI from casual visitors; it is not access control.

use axum::http::{header, HeaderMap};
use std::collections::HashSet;
use tracing::{debug, info};

pub const SESSION_COOKIE: &str = "calendario_admin";

#[derive(Debug)]
pub struct AdminGate {
    secret: String,
    sessions: HashSet<String>,
}

impl AdminGate {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            sessions: HashSet::new(),
        }
    }

    pub fn check_password(&self, attempt: &str) -> bool {
        attempt == self.secret
    }

    /// Start a session if the password matches
    pub fn login(&mut self, attempt: &str) -> Option<String> {
        if !self.check_password(attempt) {
            debug!("Admin password rejected");
            return None;
        }

        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone());
        info!(sessions = self.sessions.len(), "Admin session started");
        Some(token)
    }

    pub fn is_admitted(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| self.sessions.contains(t))
    }

    pub fn logout(&mut self, token: &str) -> bool {
        self.sessions.remove(token)
    }
}

/// Extract the session token from the request cookies
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores the token
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, token
    )
}

/// `Set-Cookie` value that clears the token
pub fn expired_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
        SESSION_COOKIE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_wrong_password_no_session() {
        let mut gate = AdminGate::new("admin123");
        assert!(gate.login("nope").is_none());
        assert!(gate.login("").is_none());
        assert!(!gate.is_admitted(None));
    }

    #[test]
    fn test_login_and_logout() {
        let mut gate = AdminGate::new("admin123");
        let token = gate.login("admin123").unwrap();

        assert!(gate.is_admitted(Some(&token)));
        assert!(!gate.is_admitted(Some("forged")));

        assert!(gate.logout(&token));
        assert!(!gate.is_admitted(Some(&token)));
        assert!(!gate.logout(&token));
    }

    #[test]
    fn test_each_login_gets_its_own_token() {
        let mut gate = AdminGate::new("s3cret");
        let a = gate.login("s3cret").unwrap();
        let b = gate.login("s3cret").unwrap();
        assert_ne!(a, b);
        assert!(gate.is_admitted(Some(&a)));
        assert!(gate.is_admitted(Some(&b)));
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; calendario_admin=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_session_token_absent() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_cookie_values() {
        assert!(session_cookie("t").starts_with("calendario_admin=t;"));
        assert!(session_cookie("t").contains("HttpOnly"));
        assert!(expired_cookie().contains("Max-Age=0"));
    }
}
