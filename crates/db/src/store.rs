//! Capability traits for the User Directory and History Store.
//!
//! Handlers and the prediction pipeline depend on these traits, never on a
//! concrete database, so tests can substitute in-memory doubles.

use async_trait::async_trait;
use banamon_core::error::CoreError;
use banamon_core::types::DbId;

use crate::models::prediction::{CreatePrediction, PredictionRecord};
use crate::models::user::{CreateUser, User};

/// Errors raised by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (e.g. duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing database could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    /// - Unique violations (SQLSTATE 23505) on `uq_` constraints map to `Conflict`.
    /// - Connection, pool and I/O failures map to `Unavailable`.
    /// - Everything else maps to `Internal`.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    StoreError::Conflict(format!(
                        "Duplicate value violates unique constraint: {constraint}"
                    ))
                } else {
                    StoreError::Internal(err.to_string())
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            StoreError::Unavailable(msg) => CoreError::ServiceUnavailable(msg),
            StoreError::Internal(msg) => CoreError::Internal(msg),
        }
    }
}

/// Registered users, keyed by id and by unique email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a user. Fails with [`StoreError::Conflict`] if the email exists.
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Append-only prediction history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one record and return it with its assigned id and timestamp.
    async fn append(&self, input: &CreatePrediction) -> Result<PredictionRecord, StoreError>;

    /// Records owned by `user_id`, newest first, optionally truncated.
    async fn list_for_user(
        &self,
        user_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<PredictionRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pool_timeout_is_unavailable() {
        assert_matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        );
    }

    #[test]
    fn row_not_found_is_internal() {
        assert_matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Internal(_)
        );
    }

    #[test]
    fn maps_into_core_taxonomy() {
        assert_matches!(
            CoreError::from(StoreError::Conflict("dup".into())),
            CoreError::Conflict(_)
        );
        assert_matches!(
            CoreError::from(StoreError::Unavailable("down".into())),
            CoreError::ServiceUnavailable(_)
        );
    }
}
