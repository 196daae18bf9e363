//! JWT bearer token creation and verification.
//!
//! Two kinds of token are issued from the same secret: short-lived access tokens
//! sent with every authenticated request, and long-lived refresh tokens that can
//! only be exchanged for a new access token. The `kind` claim keeps them apart.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{api::models::users::CurrentUser, config::Config, errors::Error, types::UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,      // Subject (user ID)
    pub email: String,    // User email
    pub username: String, // Username
    pub is_admin: bool,   // Admin flag at issue time
    pub kind: TokenKind,  // Access or refresh
    pub exp: i64,         // Expiration time
    pub iat: i64,         // Issued at
}

impl SessionClaims {
    pub fn new(user: &CurrentUser, kind: TokenKind, lifetime: Duration) -> Self {
        let now = Utc::now();
        let exp = now + lifetime;

        Self {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            kind,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret(config: &Config) -> Result<&[u8], Error> {
    config
        .secret_key
        .as_deref()
        .map(str::as_bytes)
        .ok_or_else(|| Error::Internal {
            operation: "JWT sessions: secret_key is required".to_string(),
        })
}

fn create_token(user: &CurrentUser, kind: TokenKind, config: &Config) -> Result<String, Error> {
    let lifetime = match kind {
        TokenKind::Access => config.auth.security.jwt_expiry,
        TokenKind::Refresh => config.auth.security.refresh_token_expiry,
    };
    let claims = SessionClaims::new(user, kind, lifetime);
    let key = EncodingKey::from_secret(secret(config)?);

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Create a short-lived access token
pub fn create_access_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    create_token(user, TokenKind::Access, config)
}

/// Create a refresh token
pub fn create_refresh_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    create_token(user, TokenKind::Refresh, config)
}

/// Verify and decode a token, requiring it to be of the expected kind
pub fn verify_token(token: &str, expected: TokenKind, config: &Config) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret(config)?);
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: Some("Invalid or expired token".to_string()),
        },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    if token_data.claims.kind != expected {
        return Err(Error::Unauthenticated {
            message: Some("Invalid token type".to_string()),
        });
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        }
    }

    fn create_test_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            first_name: "Test".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn test_create_and_verify_access_token() {
        let config = create_test_config();
        let user = create_test_user();

        let token = create_access_token(&user, &config).unwrap();
        let claims = verify_token(&token, TokenKind::Access, &config).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.username, user.username);
        assert!(!claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let config = create_test_config();
        let user = create_test_user();

        let token = create_refresh_token(&user, &config).unwrap();
        let claims = verify_token(&token, TokenKind::Refresh, &config).unwrap();
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let config = create_test_config();
        let user = create_test_user();

        let refresh = create_refresh_token(&user, &config).unwrap();
        let err = verify_token(&refresh, TokenKind::Access, &config).unwrap_err();
        assert_eq!(err.user_message(), "Invalid token type");

        let access = create_access_token(&user, &config).unwrap();
        assert!(matches!(
            verify_token(&access, TokenKind::Refresh, &config),
            Err(Error::Unauthenticated { .. })
        ));
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let user = create_test_user();

        let token = create_access_token(&user, &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_token(&token, TokenKind::Access, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let user = create_test_user();

        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_admin: false,
            kind: TokenKind::Access,
            exp: (now - chrono::Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
        };

        let key = EncodingKey::from_secret(config.secret_key.as_ref().unwrap().as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let result = verify_token(&token, TokenKind::Access, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_token(token, TokenKind::Access, &config);
            assert!(
                matches!(result, Err(Error::Unauthenticated { .. })),
                "Expected Unauthenticated error for token: {token}"
            );
        }
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let config = Config::default();
        let result = create_access_token(&create_test_user(), &config);
        assert!(matches!(result, Err(Error::Internal { .. })));
    }
}
