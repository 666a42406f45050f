//! Note actions.

use super::mirror::MirrorWrite;
use super::session::Session;
use crate::models::{ActionResult, Note, Rejection};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

impl Session {
    /// Adds a note to the front of the list.
    pub async fn add_note(&mut self, text: &str) -> ActionResult<Note> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::TextRequired);
        }

        let note = Note {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.state_mut().notes.insert(0, note.clone());
        debug!("Added note {}", note.id);

        self.commit(MirrorWrite::UpsertNote(note.clone())).await;
        Ok(note)
    }

    /// Removes a note by id.
    pub async fn delete_note(&mut self, id: &str) -> ActionResult<()> {
        let notes = &mut self.state_mut().notes;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        if notes.len() == before {
            return Err(Rejection::NotFound);
        }

        self.commit(MirrorWrite::DeleteNote(id.to_string())).await;
        Ok(())
    }
}
