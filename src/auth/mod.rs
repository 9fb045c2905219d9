//! Cookie-based sessions for the web interface.
//!
//! A successful login issues an HS256-signed token that is stored in an
//! `HttpOnly` cookie named [`SESSION_COOKIE`]. Protected routes sit behind
//! [`require_session`] (pages, redirect to `/login`) or
//! [`require_api_session`] (JSON, 401).

pub mod password;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    entities::user,
    errors::{ApiError, ServiceError},
    AppState,
};

pub use password::{hash_password, verify_password};

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_PATH: &str = "/login";

/// Claims carried by the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub username: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// The signed-in user, placed in request extensions by the session middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i32,
    pub username: String,
    pub full_name: String,
}

struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Clone)]
pub struct SessionManager {
    keys: Arc<SessionKeys>,
    ttl_secs: u64,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            keys: Arc::new(SessionKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl_secs,
            secure_cookie: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut manager = Self::new(&config.session_secret, config.session_ttl_secs);
        manager.secure_cookie = config.is_production();
        manager
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issues a signed session token for the given user
    pub fn issue(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            name: user.full_name.clone(),
            iat: now,
            exp: now + self.ttl_secs as i64,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.encoding,
        )?)
    }

    /// Validates a token's signature and expiry
    pub fn verify(&self, token: &str) -> Result<SessionUser, ServiceError> {
        let data = decode::<SessionClaims>(
            token,
            &self.keys.decoding,
            &Validation::new(Algorithm::HS256),
        )?;

        let user_id = data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| ServiceError::Unauthorized("malformed session subject".into()))?;

        Ok(SessionUser {
            user_id,
            username: data.claims.username,
            full_name: data.claims.name,
        })
    }

    /// `Set-Cookie` value carrying a freshly issued token
    pub fn cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, self.ttl_secs
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that removes the session
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE
        )
    }

    /// Resolves the session user from request headers, if any
    pub fn user_from_headers(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let token = session_token(headers)?;
        match self.verify(&token) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "rejecting session cookie");
                None
            }
        }
    }
}

/// Extracts the session token from the `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Page guard: anonymous requests are redirected to the login form
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.sessions.user_from_headers(request.headers()) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// API guard: anonymous requests get a JSON 401
pub async fn require_api_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.sessions.user_from_headers(request.headers()) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin() -> user::Model {
        user::Model {
            id: 1,
            username: "admin".into(),
            password_hash: String::new(),
            full_name: "مدير النظام".into(),
            created_at: Utc::now(),
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new("a_session_secret_that_is_long_enough_for_tests", 3600)
    }

    #[test]
    fn issued_token_verifies() {
        let sessions = manager();
        let token = sessions.issue(&admin()).unwrap();
        let user = sessions.verify(&token).unwrap();
        assert_eq!(user.user_id, 1);
        assert_eq!(user.username, "admin");
        assert_eq!(user.full_name, "مدير النظام");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = manager().issue(&admin()).unwrap();
        let other = SessionManager::new("another_session_secret_of_sufficient_len", 3600);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn cookie_is_http_only() {
        let sessions = manager();
        let cookie = sessions.cookie("abc");
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(sessions.clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn session_token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=tok123; lang=ar"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("tok123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&empty), None);
    }
}
