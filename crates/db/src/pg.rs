//! PostgreSQL-backed store implementations over the repositories.

use async_trait::async_trait;
use banamon_core::types::DbId;

use crate::models::prediction::{CreatePrediction, PredictionRecord};
use crate::models::user::{CreateUser, User};
use crate::repositories::{PredictionRepo, UserRepo};
use crate::store::{HistoryStore, StoreError, UserDirectory};
use crate::DbPool;

/// [`UserDirectory`] backed by the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

/// [`HistoryStore`] backed by the `predictions` table.
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: DbPool,
}

impl PgHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, input: &CreatePrediction) -> Result<PredictionRecord, StoreError> {
        Ok(PredictionRepo::create(&self.pool, input).await?)
    }

    async fn list_for_user(
        &self,
        user_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(PredictionRepo::list_by_user(&self.pool, user_id, limit).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
