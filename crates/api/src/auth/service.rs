//! Token Service: registration, login, refresh and token verification.

use std::sync::{Arc, OnceLock};

use banamon_core::credentials::{normalize_email, validate_email, validate_password};
use banamon_core::error::CoreError;
use banamon_core::types::{DbId, Timestamp};
use banamon_db::models::user::{CreateUser, User};
use banamon_db::UserDirectory;
use chrono::Utc;

use crate::auth::jwt::{generate_token, validate_token, JwtConfig, TokenError, TokenKind};
use crate::auth::password::{hash_password, verify_password};

/// Message shared by every credential failure so callers cannot probe which
/// emails are registered.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Hash checked on the unknown-email path so every failed login pays for
/// one Argon2 verify.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("banamon-unknown-user").unwrap_or_default())
}

/// Tokens issued by a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: String,
    pub expires_in: i64,
}

pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserDirectory>, jwt: JwtConfig) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Create a user. Format rules are checked before any store access.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, CoreError> {
        validate_email(email)?;
        validate_password(password)?;
        let email = normalize_email(email);

        let password_hash = run_blocking({
            let password = password.to_string();
            move || hash_password(&password)
        })
        .await?
        .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))?;

        let user = self
            .users
            .create_user(&CreateUser {
                email,
                password_hash,
            })
            .await?;
        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue an access/refresh token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, CoreError> {
        let email = normalize_email(email);
        let user = self.users.find_by_email(&email).await?;

        let valid = run_blocking({
            let password = password.to_string();
            let hash = user.as_ref().map(|u| u.password_hash.clone());
            move || match hash {
                Some(hash) => verify_password(&password, &hash),
                None => {
                    let _ = verify_password(&password, dummy_hash());
                    Ok(false)
                }
            }
        })
        .await?
        .map_err(|e| CoreError::Internal(format!("Password verification error: {e}")))?;

        let user = match user {
            Some(user) if valid => user,
            Some(user) => {
                tracing::debug!(user_id = user.id, "Login with wrong password");
                return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
            None => {
                tracing::debug!("Login for unknown email");
                return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        let now = Utc::now();
        let access_token = self.sign(user.id, TokenKind::Access, now)?;
        let refresh_token = self.sign(user.id, TokenKind::Refresh, now)?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.lifetime_secs(TokenKind::Access),
            user,
        })
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, CoreError> {
        let now = Utc::now();
        let user_id = self.verify_at(refresh_token, TokenKind::Refresh, now)?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(CoreError::Unauthorized("User no longer exists".into()));
        }

        Ok(AccessGrant {
            access_token: self.sign(user_id, TokenKind::Access, now)?,
            expires_in: self.jwt.lifetime_secs(TokenKind::Access),
        })
    }

    /// Verify an access token against the wall clock.
    pub fn verify(&self, token: &str) -> Result<DbId, CoreError> {
        self.verify_at(token, TokenKind::Access, Utc::now())
    }

    /// Verify a token of `kind` as seen at `now`; returns the subject.
    pub fn verify_at(&self, token: &str, kind: TokenKind, now: Timestamp) -> Result<DbId, CoreError> {
        validate_token(token, kind, &self.jwt, now)
            .map(|claims| claims.sub)
            .map_err(|e| match e {
                TokenError::Expired => CoreError::Unauthorized("Token expired".into()),
                TokenError::WrongKind { expected, .. } => {
                    CoreError::Unauthorized(format!("Expected {expected} token"))
                }
                _ => CoreError::Unauthorized("Invalid or expired token".into()),
            })
    }

    pub async fn current_user(&self, user_id: DbId) -> Result<User, CoreError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: user_id,
            })
    }

    fn sign(&self, user_id: DbId, kind: TokenKind, now: Timestamp) -> Result<String, CoreError> {
        generate_token(user_id, kind, &self.jwt, now)
            .map_err(|e| CoreError::Internal(format!("Token generation error: {e}")))
    }
}

/// Run CPU-heavy password work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, CoreError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Internal(format!("Blocking task failed: {e}")))
}
