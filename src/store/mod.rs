//! Storage seams: the remote document service and the local blob cache.
//!
//! Both are traits so sessions can run against the SQL-backed implementations
//! shipped here, or against anything else that speaks the same contract.

/// Local blob cache
pub mod local;
/// Typed record operations on top of [`RemoteStore`]
pub mod records;
/// SQL implementation of [`RemoteStore`]
pub mod sql_remote;

pub use local::{LocalStore, SqlLocalStore};
pub use sql_remote::SqlDocumentStore;

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Fields of one document
pub type Document = Map<String, Value>;

/// Field every owner-scoped document carries
pub const OWNER_FIELD: &str = "ownerId";

/// Document collections of the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Keyed by owner id
    Profiles,
    /// Keyed by invite code
    PartnerInvites,
    /// Keyed by couple id
    Couples,
    /// Keyed by `<owner>_<id>`
    Notes,
    /// Keyed by `<owner>_<id>`
    Plans,
    /// Keyed by `<owner>_<challengeId>`
    Challenges,
    /// Keyed by `<owner>_<id>`
    Memories,
}

impl Collection {
    /// Collection name in the store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::PartnerInvites => "partnerInvites",
            Self::Couples => "couples",
            Self::Notes => "notes",
            Self::Plans => "plans",
            Self::Challenges => "challenges",
            Self::Memories => "memories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `set_document` treats an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop the old fields
    Replace,
    /// Keep old fields that the new write does not mention
    Merge,
}

/// One step of an all-or-nothing batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Require a document field to hold `value` when the batch runs.
    ///
    /// A missing document or field fails the check.
    Expect {
        /// Target collection
        collection: Collection,
        /// Target document
        id: String,
        /// Field to compare
        field: String,
        /// Required value
        value: Value,
    },
    /// Write fields to a document
    Set {
        /// Target collection
        collection: Collection,
        /// Target document
        id: String,
        /// Fields to write
        fields: Document,
        /// Replace or merge
        mode: WriteMode,
    },
    /// Remove a document
    Delete {
        /// Target collection
        collection: Collection,
        /// Target document
        id: String,
    },
}

/// Multi-tenant document service.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads one document.
    async fn get_document(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    /// Returns every document of `collection` whose `field` equals `value`.
    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>>;

    /// Writes one document.
    async fn set_document(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
        mode: WriteMode,
    ) -> Result<()>;

    /// Removes one document. Removing a missing document succeeds.
    async fn delete_document(&self, collection: Collection, id: &str) -> Result<()>;

    /// Applies every op, or none of them.
    ///
    /// [`BatchOp::Expect`] checks are evaluated inside the same transaction as
    /// the writes; a failed check returns [`Error::PreconditionFailed`].
    async fn atomic_batch(&self, ops: Vec<BatchOp>) -> Result<()>;
}

/// Serializes a record into document fields.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Config {
            message: format!("Expected a JSON object for a document, got {other}"),
        }),
    }
}

/// Decodes document fields into a record.
pub fn from_document<T: DeserializeOwned>(
    collection: Collection,
    id: &str,
    document: Document,
) -> Result<T> {
    serde_json::from_value(Value::Object(document)).map_err(|e| Error::MalformedDocument {
        collection: collection.to_string(),
        id: id.to_string(),
        message: e.to_string(),
    })
}

/// Runs a remote call under a deadline.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| Error::RemoteTimeout {
            elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        })?
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::Note;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_note_document_roundtrip_uses_camel_case_millis() {
        let note = Note {
            id: "n1".to_string(),
            text: "hello".to_string(),
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        };
        let doc = to_document(&note).unwrap();
        assert_eq!(doc["createdAt"], Value::from(1_700_000_000_000_i64));

        let back: Note = from_document(Collection::Notes, "alice_n1", doc).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_from_document_reports_malformed_documents() {
        let mut doc = Document::new();
        doc.insert("createdAt".to_string(), Value::from("yesterday"));
        let result: Result<Note> = from_document(Collection::Notes, "alice_n1", doc);
        assert!(matches!(
            result,
            Err(Error::MalformedDocument { collection, .. }) if collection == "notes"
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_reports_elapsed_limit() {
        let result: Result<()> = with_timeout(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::RemoteTimeout { elapsed_ms: 5 })));
    }
}
