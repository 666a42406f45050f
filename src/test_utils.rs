//! Shared test utilities for `LoveVerse`.
//!
//! Database setup, tracing, and remote stores that fail on purpose.

use crate::config::AppSettings;
use crate::errors::{Error, Result};
use crate::store::{BatchOp, Collection, Document, RemoteStore, SqlDocumentStore, WriteMode};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all store and session tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes tracing output through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Settings with short timeouts so failure paths finish quickly.
pub fn test_settings() -> AppSettings {
    AppSettings {
        remote_timeout: Duration::from_millis(500),
        mirror_max_attempts: 2,
        mirror_retry_delay: Duration::from_millis(1),
        ..AppSettings::default()
    }
}

fn unavailable() -> Error {
    Error::RemoteUnavailable {
        reason: "network unreachable".to_string(),
    }
}

/// Remote store that fails every call, like a device with no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableRemote;

#[async_trait]
impl RemoteStore for UnreachableRemote {
    async fn get_document(&self, _collection: Collection, _id: &str) -> Result<Option<Document>> {
        Err(unavailable())
    }

    async fn query_by_field(
        &self,
        _collection: Collection,
        _field: &str,
        _value: &str,
    ) -> Result<Vec<Document>> {
        Err(unavailable())
    }

    async fn set_document(
        &self,
        _collection: Collection,
        _id: &str,
        _fields: Document,
        _mode: WriteMode,
    ) -> Result<()> {
        Err(unavailable())
    }

    async fn delete_document(&self, _collection: Collection, _id: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn atomic_batch(&self, _ops: Vec<BatchOp>) -> Result<()> {
        Err(unavailable())
    }
}

/// Working remote store whose reads of one collection fail.
#[derive(Debug, Clone)]
pub struct FailingCollection {
    pub inner: SqlDocumentStore,
    pub broken: Collection,
}

#[async_trait]
impl RemoteStore for FailingCollection {
    async fn get_document(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        if collection == self.broken {
            return Err(unavailable());
        }
        self.inner.get_document(collection, id).await
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        if collection == self.broken {
            return Err(unavailable());
        }
        self.inner.query_by_field(collection, field, value).await
    }

    async fn set_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
        mode: WriteMode,
    ) -> Result<()> {
        self.inner.set_document(collection, id, fields, mode).await
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<()> {
        self.inner.delete_document(collection, id).await
    }

    async fn atomic_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        self.inner.atomic_batch(ops).await
    }
}

/// Remote store that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HangingRemote;

impl HangingRemote {
    async fn hang<T>() -> Result<T> {
        std::future::pending::<()>().await;
        Err(unavailable())
    }
}

#[async_trait]
impl RemoteStore for HangingRemote {
    async fn get_document(&self, _collection: Collection, _id: &str) -> Result<Option<Document>> {
        Self::hang().await
    }

    async fn query_by_field(
        &self,
        _collection: Collection,
        _field: &str,
        _value: &str,
    ) -> Result<Vec<Document>> {
        Self::hang().await
    }

    async fn set_document(
        &self,
        _collection: Collection,
        _id: &str,
        _fields: Document,
        _mode: WriteMode,
    ) -> Result<()> {
        Self::hang().await
    }

    async fn delete_document(&self, _collection: Collection, _id: &str) -> Result<()> {
        Self::hang().await
    }

    async fn atomic_batch(&self, _ops: Vec<BatchOp>) -> Result<()> {
        Self::hang().await
    }
}
