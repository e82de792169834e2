//! Staff sessions backed by JWT bearer tokens.
//!
//! Staff exchange a username and password for a signed token; protected
//! routes take a [`StaffSession`] extractor that rejects requests without a
//! valid `Authorization: Bearer <token>` header.

use crate::config::StaffAccount;
use crate::error::AppError;
use crate::handlers::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Session management error
#[derive(Debug, Error)]
pub enum SessionError {
    /// JWT encoding failed
    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[from] jsonwebtoken::errors::Error),

    /// Token expired
    #[error("Session token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid session token")]
    InvalidToken,

    /// No bearer token on the request
    #[error("Authentication credentials were not provided")]
    MissingToken,

    /// Username or password did not match a staff account
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// JWT claims for staff tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Staff username
    pub sub: String,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

/// Session manager handles JWT token generation and validation
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
}

impl SessionManager {
    /// Create a new session manager with the given JWT secret and expiry
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_secs,
        }
    }

    /// Lifetime of issued tokens, in seconds
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_secs
    }

    /// Check credentials against the configured staff and issue a token
    pub fn login(
        &self,
        staff: &[StaffAccount],
        username: &str,
        password: &str,
    ) -> Result<String, SessionError> {
        let account = staff
            .iter()
            .find(|account| account.username == username)
            .ok_or(SessionError::InvalidCredentials)?;

        if !account.verify(password) {
            return Err(SessionError::InvalidCredentials);
        }

        self.generate_token(&account.username)
    }

    /// Generate a new session token for the given staff member
    pub fn generate_token(&self, username: &str) -> Result<String, SessionError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let claims = SessionClaims {
            sub: username.to_string(),
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
}

/// An authenticated staff member, extracted from the bearer token
#[derive(Debug, Clone)]
pub struct StaffSession(pub SessionClaims);

impl StaffSession {
    /// Username the token was issued to
    pub fn username(&self) -> &str {
        &self.0.sub
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StaffSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;

        let claims = state.session_manager.validate_token(token)?;
        Ok(StaffSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let manager = SessionManager::new("test-secret", 3600);
        let token = manager.generate_token("librarian").unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "librarian");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let manager = SessionManager::new("test-secret", 3600);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Past the default 60s leeway
        let claims = SessionClaims {
            sub: "librarian".to_string(),
            exp: now - 100,
            iat: now - 200,
        };

        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        let result = manager.validate_token(&token);
        assert!(matches!(result, Err(SessionError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let manager = SessionManager::new("test-secret", 3600);
        let result = manager.validate_token("invalid-token");
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = SessionManager::new("secret1", 3600);
        let manager2 = SessionManager::new("secret2", 3600);

        let token = manager1.generate_token("librarian").unwrap();
        let result = manager2.validate_token(&token);
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_login() {
        let manager = SessionManager::new("test-secret", 3600);
        let staff = vec![
            StaffAccount::with_password("desk", "front"),
            StaffAccount::with_password("archive", "back"),
        ];

        let token = manager.login(&staff, "archive", "back").unwrap();
        assert_eq!(manager.validate_token(&token).unwrap().sub, "archive");

        assert!(matches!(
            manager.login(&staff, "archive", "front"),
            Err(SessionError::InvalidCredentials)
        ));
        assert!(matches!(
            manager.login(&staff, "nobody", "back"),
            Err(SessionError::InvalidCredentials)
        ));
        assert!(matches!(
            manager.login(&[], "desk", "front"),
            Err(SessionError::InvalidCredentials)
        ));
    }
}
