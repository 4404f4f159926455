//! In-process store implementations.
//!
//! Used by tests and by local runs without PostgreSQL. Ordering and
//! uniqueness rules match the PostgreSQL implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use banamon_core::types::DbId;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::prediction::{CreatePrediction, PredictionRecord};
use crate::models::user::{CreateUser, User};
use crate::store::{HistoryStore, StoreError, UserDirectory};

#[derive(Default)]
struct UserTable {
    last_id: DbId,
    rows: HashMap<DbId, User>,
}

/// [`UserDirectory`] held in memory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    table: RwLock<UserTable>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict(
                "Duplicate value violates unique constraint: uq_users_email".into(),
            ));
        }
        table.last_id += 1;
        let user = User {
            id: table.last_id,
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            created_at: Utc::now(),
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
struct PredictionTable {
    last_id: DbId,
    rows: Vec<PredictionRecord>,
}

/// [`HistoryStore`] held in memory.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    table: RwLock<PredictionTable>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all users.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, input: &CreatePrediction) -> Result<PredictionRecord, StoreError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let record = PredictionRecord {
            id: table.last_id,
            user_id: input.user_id,
            image_key: input.image_key.clone(),
            label: input.label.clone(),
            confidence: input.confidence,
            model_version: input.model_version.clone(),
            created_at: Utc::now(),
        };
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn list_for_user(
        &self,
        user_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<PredictionRecord>, StoreError> {
        let table = self.table.read().await;
        let mut records: Vec<PredictionRecord> = table
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        if let Some(limit) = limit {
            records.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
