//! Document entity - One JSON document of the remote document service.
//!
//! Documents are addressed by `(collection, doc_id)`. Owner-scoped collections
//! copy the document's `ownerId` field into `owner_id` so they can be queried
//! without decoding every body.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Collection name (e.g., `"profiles"`, `"memories"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    /// Document id within the collection
    #[sea_orm(primary_key, auto_increment = false)]
    pub doc_id: String,
    /// Copy of the body's `ownerId` field, if it has one
    #[sea_orm(indexed)]
    pub owner_id: Option<String>,
    /// JSON object holding the document fields
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// When the document was last written
    pub updated_at: DateTimeUtc,
}

/// Documents have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
