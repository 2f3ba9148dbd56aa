//! Session management with JWT tokens.
//!
//! A session is a signed token naming a known user. Clients present it as
//! `Authorization: Bearer <token>` or in the session cookie set when the
//! session is established.

use crate::config::UserConfig;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use quill_domain::{Principal, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "quill_session";

/// Session management error
#[derive(Debug, Error)]
pub enum SessionError {
    /// JWT encoding failed
    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[from] jsonwebtoken::errors::Error),

    /// No token on the request
    #[error("No session token presented")]
    MissingToken,

    /// Token expired
    #[error("Session token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid session token")]
    InvalidToken,

    /// User is not known to this server
    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User identifier
    pub user_id: String,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

/// Resolves a request to an authenticated principal
///
/// The login guard calls this for every article route; an error means the
/// caller is sent to the login page.
pub trait IdentityProvider: Send + Sync {
    /// Authenticate the request described by `headers`
    fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, SessionError>;
}

/// Session manager handles JWT token generation and validation
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
    users: HashMap<String, String>,
}

impl SessionManager {
    /// Create a new session manager with the given JWT secret and expiry
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_secs,
            users: HashMap::new(),
        }
    }

    /// Register the users that may hold sessions
    pub fn with_users<'a>(mut self, users: impl IntoIterator<Item = &'a UserConfig>) -> Self {
        for user in users {
            let username = user.username.trim().to_string();
            let display_name = user
                .display_name
                .clone()
                .unwrap_or_else(|| username.clone());
            self.users.insert(username, display_name);
        }
        self
    }

    /// Token lifetime in seconds
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_secs
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Resolve a known user to a principal
    pub fn principal(&self, user_id: &str) -> Result<Principal, SessionError> {
        let display_name = self
            .users
            .get(user_id)
            .ok_or_else(|| SessionError::UnknownUser(user_id.to_string()))?;
        let id = UserId::new(user_id).ok_or_else(|| SessionError::UnknownUser(user_id.to_string()))?;
        Ok(Principal::with_display_name(id, display_name.clone()))
    }

    /// Generate a new session token for a known user
    pub fn generate_token(&self, user_id: &str) -> Result<String, SessionError> {
        let principal = self.principal(user_id.trim())?;
        let now = Self::now();

        let claims = SessionClaims {
            user_id: principal.id.as_str().to_string(),
            exp: now + self.token_expiry_secs,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a session token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let validation = Validation::default();
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }

    /// `Set-Cookie` value installing a session token
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, self.token_expiry_secs
        )
    }

    /// `Set-Cookie` value removing the session token
    pub fn clear_cookie() -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

impl IdentityProvider for SessionManager {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, SessionError> {
        let token = token_from_headers(headers).ok_or(SessionError::MissingToken)?;
        let claims = self.validate_token(token)?;
        // users removed from config lose their sessions
        self.principal(&claims.user_id)
    }
}

/// Extract a session token, preferring the bearer header over the cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn manager() -> SessionManager {
        SessionManager::new("test-secret", 3600).with_users(&[
            UserConfig {
                username: "test-user".to_string(),
                display_name: Some("Test User".to_string()),
            },
            UserConfig {
                username: "other".to_string(),
                display_name: None,
            },
        ])
    }

    #[test]
    fn test_generate_and_validate_token() {
        let manager = manager();
        let token = manager.generate_token("test-user").unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.user_id, "test-user");
    }

    #[test]
    fn test_unknown_user_gets_no_token() {
        let manager = manager();
        let result = manager.generate_token("stranger");
        assert!(matches!(result, Err(SessionError::UnknownUser(_))));
    }

    #[test]
    fn test_expired_token() {
        let manager = manager();

        let now = SessionManager::now();
        let claims = SessionClaims {
            user_id: "test-user".to_string(),
            exp: now - 100, // Expired 100 seconds ago
            iat: now - 200,
        };

        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        let result = manager.validate_token(&token);
        assert!(matches!(result, Err(SessionError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let manager = manager();
        let result = manager.validate_token("invalid-token");
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let users = [UserConfig {
            username: "test-user".to_string(),
            display_name: None,
        }];
        let manager1 = SessionManager::new("secret1", 3600).with_users(&users);
        let manager2 = SessionManager::new("secret2", 3600).with_users(&users);

        let token = manager1.generate_token("test-user").unwrap();
        let result = manager2.validate_token(&token);
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_authenticate_with_bearer() {
        let manager = manager();
        let token = manager.generate_token("test-user").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let principal = manager.authenticate(&headers).unwrap();
        assert_eq!(principal.id.as_str(), "test-user");
        assert_eq!(principal.display_name, "Test User");
    }

    #[test]
    fn test_authenticate_with_cookie() {
        let manager = manager();
        let token = manager.generate_token("other").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, token)).unwrap(),
        );

        let principal = manager.authenticate(&headers).unwrap();
        assert_eq!(principal.id.as_str(), "other");
        assert_eq!(principal.display_name, "other");
    }

    #[test]
    fn test_authenticate_without_token() {
        let manager = manager();
        let result = manager.authenticate(&HeaderMap::new());
        assert!(matches!(result, Err(SessionError::MissingToken)));
    }

    #[test]
    fn test_removed_user_loses_session() {
        let token = manager().generate_token("other").unwrap();
        let reconfigured = SessionManager::new("test-secret", 3600).with_users(&[UserConfig {
            username: "test-user".to_string(),
            display_name: None,
        }]);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert!(matches!(
            reconfigured.authenticate(&headers),
            Err(SessionError::UnknownUser(_))
        ));
    }

    #[test]
    fn test_cookie_round_trip() {
        let manager = manager();
        let cookie = manager.session_cookie("abc");
        assert!(cookie.starts_with("quill_session=abc;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(SessionManager::clear_cookie().contains("Max-Age=0"));
    }
}
