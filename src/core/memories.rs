//! Memory timeline actions.
//!
//! Memories stay sorted newest first by their date. Submitting the same memory
//! twice (same title and details ignoring case, same date) keeps only one.

use super::mirror::MirrorWrite;
use super::session::Session;
use crate::models::records::{
    DEFAULT_MEMORY_CATEGORY, DEFAULT_MEMORY_MOOD, day_key, parse_date_text, sort_memories,
};
use crate::models::{ActionResult, Memory, MemoryInput, RawMemory, ReactionKind, Rejection};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Session {
    /// Adds a memory, or returns the existing one if it was already recorded.
    pub async fn add_memory(&mut self, input: MemoryInput) -> ActionResult<Memory> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(Rejection::TitleRequired);
        }

        let now = Utc::now();
        let date_text = non_blank(input.date_text).unwrap_or_else(|| day_key(now.date_naive()));
        if parse_date_text(&date_text).is_none() {
            return Err(Rejection::InvalidDate);
        }

        let memory = Memory::normalize(
            RawMemory {
                id: Some(Uuid::new_v4().to_string()),
                title: Some(title.to_string()),
                details: Some(input.details.unwrap_or_default().trim().to_string()),
                category: Some(
                    non_blank(input.category)
                        .unwrap_or_else(|| DEFAULT_MEMORY_CATEGORY.to_string()),
                ),
                mood: Some(
                    non_blank(input.mood).unwrap_or_else(|| DEFAULT_MEMORY_MOOD.to_string()),
                ),
                date_text: Some(date_text),
                created_at: Some(now),
                reactions: None,
            },
            now,
        );

        let memories = &mut self.state_mut().memories;
        if let Some(existing) = memories
            .iter()
            .find(|m| m.dedup_key() == memory.dedup_key())
        {
            debug!("Memory {:?} already recorded as {}", memory.title, existing.id);
            return Ok(existing.clone());
        }

        memories.push(memory.clone());
        sort_memories(memories);

        self.commit(MirrorWrite::UpsertMemory(memory.clone())).await;
        Ok(memory)
    }

    /// Adds one reaction of `kind` to a memory.
    pub async fn react_to_memory(&mut self, id: &str, kind: &str) -> ActionResult<Memory> {
        let kind: ReactionKind = kind.parse()?;
        let memory = self
            .state_mut()
            .memories
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(Rejection::NotFound)?;
        memory.reactions.bump(kind);
        let updated = memory.clone();

        self.commit(MirrorWrite::UpsertMemory(updated.clone())).await;
        Ok(updated)
    }

    /// Removes a memory by id.
    pub async fn delete_memory(&mut self, id: &str) -> ActionResult<()> {
        let memories = &mut self.state_mut().memories;
        let before = memories.len();
        memories.retain(|m| m.id != id);
        if memories.len() == before {
            return Err(Rejection::NotFound);
        }

        self.commit(MirrorWrite::DeleteMemory(id.to_string())).await;
        Ok(())
    }
}
