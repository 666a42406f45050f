//! Database configuration module for `LoveVerse`.
//!
//! The SQL database backs both the document store and the local state cache.
//! Tables are generated from the entity definitions with SeaORM's
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.

use crate::entities::{Document, LocalState};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default database location when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/loveverse.sqlite?mode=rwc";

/// Establishes a connection to the given database URL.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    if let Some(parent) = sqlite_file_parent(database_url) {
        std::fs::create_dir_all(parent)?;
    }
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_file_parent(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Creates the `documents` and `local_state` tables and their indexes if missing.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut document_table = schema.create_table_from_entity(Document);
    let mut local_state_table = schema.create_table_from_entity(LocalState);
    document_table.if_not_exists();
    local_state_table.if_not_exists();

    db.execute(builder.build(&document_table)).await?;
    db.execute(builder.build(&local_state_table)).await?;

    for mut index in schema.create_index_from_entity(Document) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables are ready");
    Ok(())
}
