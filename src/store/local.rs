//! Local blob cache: one serialized state snapshot per storage key.

use crate::entities::{LocalState, local_state};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::trace;

/// String-keyed blob storage used as the offline cache.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Reads the blob stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous blob.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// [`LocalStore`] on the `local_state` table
#[derive(Debug, Clone)]
pub struct SqlLocalStore {
    db: DatabaseConnection,
}

impl SqlLocalStore {
    /// Wraps a connection whose tables were already created
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocalStore for SqlLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(LocalState::find_by_id(key.to_string())
            .one(&self.db)
            .await?
            .map(|row| row.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now();
        let existing = LocalState::find_by_id(key.to_string())
            .one(&self.db)
            .await?;

        if let Some(row) = existing {
            let mut active_model: local_state::ActiveModel = row.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_state = local_state::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
            };
            new_state.insert(&self.db).await?;
        }

        trace!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }
}
