//! SQL-backed document store.
//!
//! Every collection lives in the `documents` table. Batches run inside one
//! database transaction, so a failing op or precondition rolls back every
//! earlier op of the same batch.

use super::{BatchOp, Collection, Document, OWNER_FIELD, RemoteStore, WriteMode};
use crate::entities::{Document as DocumentEntity, document};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde_json::Value;
use tracing::{debug, trace};

/// [`RemoteStore`] on a SeaORM connection
#[derive(Debug, Clone)]
pub struct SqlDocumentStore {
    db: DatabaseConnection,
}

impl SqlDocumentStore {
    /// Wraps a connection whose tables were created with
    /// [`crate::config::database::create_tables`].
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn decode_body(row: &document::Model) -> Result<Document> {
    match serde_json::from_str::<Value>(&row.body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::MalformedDocument {
            collection: row.collection.clone(),
            id: row.doc_id.clone(),
            message: "body is not a JSON object".to_string(),
        }),
        Err(e) => Err(Error::MalformedDocument {
            collection: row.collection.clone(),
            id: row.doc_id.clone(),
            message: e.to_string(),
        }),
    }
}

fn owner_of(fields: &Document) -> Option<String> {
    fields
        .get(OWNER_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn write_document<C>(
    db: &C,
    collection: Collection,
    id: &str,
    fields: Document,
    mode: WriteMode,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let existing = DocumentEntity::find_by_id((collection.as_str().to_string(), id.to_string()))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let body = match mode {
            WriteMode::Replace => fields,
            WriteMode::Merge => {
                let mut current = decode_body(&row)?;
                current.extend(fields);
                current
            }
        };
        let mut active_model: document::ActiveModel = row.into();
        active_model.owner_id = Set(owner_of(&body));
        active_model.body = Set(Value::Object(body).to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_document = document::ActiveModel {
            collection: Set(collection.as_str().to_string()),
            doc_id: Set(id.to_string()),
            owner_id: Set(owner_of(&fields)),
            body: Set(Value::Object(fields).to_string()),
            updated_at: Set(now),
        };
        new_document.insert(db).await?;
    }

    trace!("Wrote {}/{} ({:?})", collection, id, mode);
    Ok(())
}

async fn check_field<C>(
    db: &C,
    collection: Collection,
    id: &str,
    field: &str,
    expected: &Value,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = DocumentEntity::find_by_id((collection.as_str().to_string(), id.to_string()))
        .one(db)
        .await?;
    let body = row.as_ref().map(decode_body).transpose()?;

    if body.as_ref().and_then(|b| b.get(field)) == Some(expected) {
        Ok(())
    } else {
        debug!("Precondition {}/{}.{} failed", collection, id, field);
        Err(Error::PreconditionFailed {
            collection: collection.as_str().to_string(),
            id: id.to_string(),
            field: field.to_string(),
        })
    }
}

async fn remove_document<C>(db: &C, collection: Collection, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    DocumentEntity::delete_by_id((collection.as_str().to_string(), id.to_string()))
        .exec(db)
        .await?;
    Ok(())
}

#[async_trait]
impl RemoteStore for SqlDocumentStore {
    async fn get_document(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        DocumentEntity::find_by_id((collection.as_str().to_string(), id.to_string()))
            .one(&self.db)
            .await?
            .map(|row| decode_body(&row))
            .transpose()
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        let mut query = DocumentEntity::find()
            .filter(document::Column::Collection.eq(collection.as_str()))
            .order_by_asc(document::Column::DocId);
        if field == OWNER_FIELD {
            query = query.filter(document::Column::OwnerId.eq(value));
        }

        let rows = query.all(&self.db).await?;
        let mut matches = Vec::with_capacity(rows.len());
        for row in &rows {
            let body = decode_body(row)?;
            if body.get(field).and_then(Value::as_str) == Some(value) {
                matches.push(body);
            }
        }
        debug!(
            "Query {}.{} = {} matched {} documents",
            collection,
            field,
            value,
            matches.len()
        );
        Ok(matches)
    }

    async fn set_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
        mode: WriteMode,
    ) -> Result<()> {
        write_document(&self.db, collection, id, fields, mode).await
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<()> {
        remove_document(&self.db, collection, id).await
    }

    async fn atomic_batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let op_count = ops.len();
        // Dropping the transaction without commit rolls it back
        let txn = self.db.begin().await?;

        for op in ops {
            match op {
                BatchOp::Expect {
                    collection,
                    id,
                    field,
                    value,
                } => check_field(&txn, collection, &id, &field, &value).await?,
                BatchOp::Set {
                    collection,
                    id,
                    fields,
                    mode,
                } => write_document(&txn, collection, &id, fields, mode).await?,
                BatchOp::Delete { collection, id } => {
                    remove_document(&txn, collection, &id).await?;
                }
            }
        }

        txn.commit().await?;
        debug!("Committed batch of {} ops", op_count);
        Ok(())
    }
}
