//! Entity module - Contains the SeaORM entity definitions backing the stores.
//! `document` holds the remote document service's collections and
//! `local_state` holds the per-owner offline cache.

pub mod document;
pub mod local_state;

pub use document::{Column as DocumentColumn, Entity as Document, Model as DocumentModel};
pub use local_state::{
    Column as LocalStateColumn, Entity as LocalState, Model as LocalStateModel,
};
