//! JWT generation and validation for access and refresh tokens.
//!
//! Both kinds are HS256-signed JWTs carrying a [`Claims`] payload; the
//! `kind` claim keeps one from being accepted in place of the other.
//! Nothing is persisted server-side, so a token stays valid until it expires.

use banamon_core::types::{DbId, Timestamp};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token expiry in minutes.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;
/// Default refresh token expiry in days.
pub const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub kind: TokenKind,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Lifetime of a token of `kind`, in seconds.
    pub fn lifetime_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_token_expiry_mins.saturating_mul(60),
            TokenKind::Refresh => self.refresh_token_expiry_days.saturating_mul(24 * 60 * 60),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry_mins", &self.access_token_expiry_mins)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// Bad signature, bad encoding, or missing claims.
    #[error("Invalid token")]
    Invalid,

    #[error("Token expired")]
    Expired,

    #[error("Expected {expected} token, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Sign a token of `kind` for `user_id`, issued at `now`.
pub fn generate_token(
    user_id: DbId,
    kind: TokenKind,
    config: &JwtConfig,
    now: Timestamp,
) -> Result<String, TokenError> {
    let iat = now.timestamp();
    let claims = Claims {
        sub: user_id,
        kind,
        iat,
        exp: iat.saturating_add(config.lifetime_secs(kind)),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(TokenError::Encode)
}

/// Validate signature, kind and expiry of `token` as seen at `now`.
///
/// Expiry is exact: the token is accepted iff `now < exp`, with no leeway.
pub fn validate_token(
    token: &str,
    kind: TokenKind,
    config: &JwtConfig,
    now: Timestamp,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below against the caller's clock.
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| TokenError::Invalid)?
    .claims;

    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    if claims.kind != kind {
        return Err(TokenError::WrongKind {
            expected: kind.as_str(),
            actual: claims.kind.as_str(),
        });
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();
        let now = Utc::now();
        let token = generate_token(42, TokenKind::Access, &config, now).unwrap();

        let claims = validate_token(&token, TokenKind::Access, &config, now).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expiry_boundary_is_exact() {
        let config = test_config();
        let issued = Utc::now();
        let token = generate_token(1, TokenKind::Access, &config, issued).unwrap();
        let exp = issued + Duration::minutes(15);

        let just_before = exp - Duration::seconds(1);
        assert!(validate_token(&token, TokenKind::Access, &config, just_before).is_ok());
        assert_matches!(
            validate_token(&token, TokenKind::Access, &config, exp),
            Err(TokenError::Expired)
        );
        assert_matches!(
            validate_token(&token, TokenKind::Access, &config, exp + Duration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = test_config();
        let now = Utc::now();
        let refresh = generate_token(1, TokenKind::Refresh, &config, now).unwrap();

        assert_matches!(
            validate_token(&refresh, TokenKind::Access, &config, now),
            Err(TokenError::WrongKind { expected: "access", actual: "refresh" })
        );
        let claims = validate_token(&refresh, TokenKind::Refresh, &config, now).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let config = JwtConfig {
            refresh_token_expiry_days: i64::MAX,
            ..test_config()
        };
        assert_eq!(config.lifetime_secs(TokenKind::Refresh), i64::MAX);

        let now = Utc::now();
        let token = generate_token(1, TokenKind::Refresh, &config, now).unwrap();
        let claims = validate_token(&token, TokenKind::Refresh, &config, now).unwrap();
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = test_config();
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };
        let now = Utc::now();

        let token = generate_token(1, TokenKind::Access, &config_a, now).unwrap();
        assert_matches!(
            validate_token(&token, TokenKind::Access, &config_b, now),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_matches!(
            validate_token("not.a.jwt", TokenKind::Access, &test_config(), Utc::now()),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("test-secret"));
    }
}
