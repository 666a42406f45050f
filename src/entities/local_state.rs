//! Local state entity - Stores the cached application state blob per owner.
//! Keys look like `loveverse_state_<owner>`; values are the serialized snapshot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Local state database model - one blob per storage key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "local_state")]
pub struct Model {
    /// Storage key
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Serialized state
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this blob was last written
    pub updated_at: DateTimeUtc,
}

/// `LocalState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
