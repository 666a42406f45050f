//! Owner-scoped records: profile, notes, memories, plans and challenges.
//!
//! Field names are camelCase on the wire so cached blobs and remote documents
//! written by older clients still decode. Instants travel as epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default memory category when none was given
pub const DEFAULT_MEMORY_CATEGORY: &str = "Special";
/// Default memory mood when none was given
pub const DEFAULT_MEMORY_MOOD: &str = "Happy";
/// Title used for memories that lost theirs
pub const UNTITLED_MEMORY: &str = "Untitled Memory";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date (`YYYY-MM-DD`) or an RFC 3339 timestamp into an instant.
///
/// Bare dates resolve to midnight UTC.
#[must_use]
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a calendar day the way day keys and `dateText` are stored.
#[must_use]
pub fn day_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Per-owner profile document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    /// Display name of the owner
    pub your_name: String,
    /// Display name the owner uses for their partner
    pub partner_name: String,
    /// Anniversary as `YYYY-MM-DD`
    pub anniversary: String,
    /// Day key (`YYYY-MM-DD`) to mood label
    pub mood_log: BTreeMap<String, String>,
    /// Couple this owner belongs to, once paired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couple_id: Option<String>,
    /// Linked partner's owner id, once paired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_user_id: Option<String>,
    /// Whether the partner onboarding prompt was dismissed
    pub onboarding_seen: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            your_name: "Ali".to_string(),
            partner_name: "My Love".to_string(),
            anniversary: "2022-01-15".to_string(),
            mood_log: BTreeMap::new(),
            couple_id: None,
            partner_user_id: None,
            onboarding_seen: false,
        }
    }
}

impl Profile {
    /// Shallow-merges a patch: every field present in the patch replaces ours.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(v) = patch.your_name {
            self.your_name = v;
        }
        if let Some(v) = patch.partner_name {
            self.partner_name = v;
        }
        if let Some(v) = patch.anniversary {
            self.anniversary = v;
        }
        if let Some(v) = patch.mood_log {
            self.mood_log = v;
        }
        if let Some(v) = patch.couple_id {
            self.couple_id = Some(v);
        }
        if let Some(v) = patch.partner_user_id {
            self.partner_user_id = Some(v);
        }
        if let Some(v) = patch.onboarding_seen {
            self.onboarding_seen = v;
        }
    }

    /// Returns a copy with `patch` applied.
    #[must_use]
    pub fn merged(&self, patch: ProfilePatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// Partial profile. Used for user edits and for profile documents read back
/// from the remote store, where only present fields override local ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anniversary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_log: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couple_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_seen: Option<bool>,
}

/// Name fields of another owner's profile, as shown for a linked partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user_id: String,
    pub your_name: String,
    pub partner_name: String,
    pub anniversary: String,
}

/// Short free-text note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Reaction kinds a memory can collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    /// ❤️
    Heart,
    /// 😂
    Laugh,
    /// 😮
    Wow,
}

impl ReactionKind {
    /// Wire name of the reaction
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Laugh => "laugh",
            Self::Wow => "wow",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = super::Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart" => Ok(Self::Heart),
            "laugh" => Ok(Self::Laugh),
            "wow" => Ok(Self::Wow),
            _ => Err(super::Rejection::UnknownReaction),
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction counters of a memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reactions {
    pub heart: u32,
    pub laugh: u32,
    pub wow: u32,
}

impl Reactions {
    /// Increments the counter for `kind` by one.
    pub const fn bump(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Heart => self.heart = self.heart.saturating_add(1),
            ReactionKind::Laugh => self.laugh = self.laugh.saturating_add(1),
            ReactionKind::Wow => self.wow = self.wow.saturating_add(1),
        }
    }

    /// Current count for `kind`
    #[must_use]
    pub const fn count(&self, kind: ReactionKind) -> u32 {
        match kind {
            ReactionKind::Heart => self.heart,
            ReactionKind::Laugh => self.laugh,
            ReactionKind::Wow => self.wow,
        }
    }
}

/// A normalized memory. Every field is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub title: String,
    pub details: String,
    pub category: String,
    pub mood: String,
    pub date_text: String,
    /// Sort key derived from `date_text`
    pub date_ms: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub reactions: Reactions,
}

/// A memory as found in a cached blob or a remote document; anything may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMemory {
    pub id: Option<String>,
    pub title: Option<String>,
    pub details: Option<String>,
    pub category: Option<String>,
    pub mood: Option<String>,
    pub date_text: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    pub reactions: Option<Reactions>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Memory {
    /// Fills missing fields with defaults and recomputes the date sort key.
    ///
    /// An unparseable `date_text` is kept as-is and sorts at `now`.
    #[must_use]
    pub fn normalize(raw: RawMemory, now: DateTime<Utc>) -> Self {
        let created_at = raw.created_at.unwrap_or(now);
        let date_text = non_empty(raw.date_text)
            .unwrap_or_else(|| day_key(created_at.date_naive()));
        let date_ms = parse_date_text(&date_text)
            .unwrap_or(now)
            .timestamp_millis();

        Self {
            id: non_empty(raw.id).unwrap_or_else(|| now.timestamp_millis().to_string()),
            title: non_empty(raw.title).unwrap_or_else(|| UNTITLED_MEMORY.to_string()),
            details: raw.details.unwrap_or_default(),
            category: non_empty(raw.category)
                .unwrap_or_else(|| DEFAULT_MEMORY_CATEGORY.to_string()),
            mood: non_empty(raw.mood).unwrap_or_else(|| DEFAULT_MEMORY_MOOD.to_string()),
            date_text,
            date_ms,
            created_at,
            reactions: raw.reactions.unwrap_or_default(),
        }
    }

    /// Key used to reject duplicate submissions.
    #[must_use]
    pub fn dedup_key(&self) -> (String, &str, String) {
        (
            self.title.trim().to_lowercase(),
            self.date_text.as_str(),
            self.details.trim().to_lowercase(),
        )
    }

    /// Sort instant: the derived date, falling back to creation.
    #[must_use]
    pub fn sort_ms(&self) -> i64 {
        if self.date_ms != 0 {
            self.date_ms
        } else {
            self.created_at.timestamp_millis()
        }
    }
}

impl From<Memory> for RawMemory {
    fn from(m: Memory) -> Self {
        Self {
            id: Some(m.id),
            title: Some(m.title),
            details: Some(m.details),
            category: Some(m.category),
            mood: Some(m.mood),
            date_text: Some(m.date_text),
            created_at: Some(m.created_at),
            reactions: Some(m.reactions),
        }
    }
}

/// Sorts memories newest first by their date sort key.
pub fn sort_memories(memories: &mut [Memory]) {
    memories.sort_by_key(|m| std::cmp::Reverse(m.sort_ms()));
}

/// A date plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Target day as `YYYY-MM-DD`
    pub planned_for: Option<String>,
    /// Midnight UTC of `planned_for`
    pub planned_for_ms: Option<i64>,
}

/// A couple challenge. Definitions come from the seed set; only completion changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: u32,
    pub done: bool,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Flips `done`, setting `completed_at` on completion and clearing it otherwise.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.done = !self.done;
        self.completed_at = self.done.then_some(now);
    }
}

/// Completion state of a challenge as mirrored remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChallengeRecord {
    pub challenge_id: String,
    pub done: bool,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input of `add_memory`
#[derive(Debug, Clone, Default)]
pub struct MemoryInput {
    pub title: String,
    pub details: Option<String>,
    pub category: Option<String>,
    pub mood: Option<String>,
    /// Defaults to today when absent
    pub date_text: Option<String>,
}

impl MemoryInput {
    /// Memory with just a title
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the details
    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Sets the calendar date
    #[must_use]
    pub fn on(mut self, date_text: impl Into<String>) -> Self {
        self.date_text = Some(date_text.into());
        self
    }
}

/// Input of `add_plan`: a bare title or a title with a target day.
#[derive(Debug, Clone, Default)]
pub struct PlanInput {
    pub title: String,
    pub planned_for: Option<String>,
}

impl From<&str> for PlanInput {
    fn from(title: &str) -> Self {
        Self {
            title: title.to_string(),
            planned_for: None,
        }
    }
}

impl From<String> for PlanInput {
    fn from(title: String) -> Self {
        Self {
            title,
            planned_for: None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_text_accepts_days_and_timestamps() {
        let day = parse_date_text("2024-02-14").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap());

        let ts = parse_date_text("2024-02-14T18:30:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 2, 14, 16, 30, 0).unwrap());

        assert!(parse_date_text("14/02/2024").is_none());
        assert!(parse_date_text("").is_none());
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let memory = Memory::normalize(RawMemory::default(), now);

        assert_eq!(memory.title, UNTITLED_MEMORY);
        assert_eq!(memory.category, DEFAULT_MEMORY_CATEGORY);
        assert_eq!(memory.mood, DEFAULT_MEMORY_MOOD);
        assert_eq!(memory.date_text, "2024-05-01");
        assert_eq!(
            memory.date_ms,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(memory.created_at, now);
        assert_eq!(memory.reactions, Reactions::default());
    }

    #[test]
    fn test_normalize_keeps_bad_date_but_sorts_at_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let raw = RawMemory {
            title: Some("Trip".to_string()),
            date_text: Some("someday".to_string()),
            ..RawMemory::default()
        };
        let memory = Memory::normalize(raw, now);
        assert_eq!(memory.date_text, "someday");
        assert_eq!(memory.date_ms, now.timestamp_millis());
    }

    #[test]
    fn test_raw_memory_decodes_partial_reactions() {
        let raw: RawMemory =
            serde_json::from_str(r#"{"id":"m9","title":"Beach","reactions":{"heart":2}}"#)
                .unwrap();
        let memory = Memory::normalize(raw, Utc::now());
        assert_eq!(memory.reactions.heart, 2);
        assert_eq!(memory.reactions.laugh, 0);
        assert_eq!(memory.reactions.wow, 0);
    }

    #[test]
    fn test_challenge_toggle_sets_and_clears_completion() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut challenge = Challenge {
            id: "c1".to_string(),
            points: 20,
            ..Challenge::default()
        };

        challenge.toggle(now);
        assert!(challenge.done);
        assert_eq!(challenge.completed_at, Some(now));

        challenge.toggle(now);
        assert!(!challenge.done);
        assert_eq!(challenge.completed_at, None);
        assert_eq!(challenge.points, 20);
    }

    #[test]
    fn test_profile_patch_only_overrides_present_fields() {
        let mut profile = Profile::default();
        profile.apply(ProfilePatch {
            partner_name: Some("Sunshine".to_string()),
            onboarding_seen: Some(true),
            ..ProfilePatch::default()
        });

        assert_eq!(profile.your_name, "Ali");
        assert_eq!(profile.partner_name, "Sunshine");
        assert!(profile.onboarding_seen);
    }

    #[test]
    fn test_profile_patch_serializes_only_present_fields() {
        let patch = ProfilePatch {
            couple_id: Some("a_b".to_string()),
            ..ProfilePatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "coupleId": "a_b" }));
    }

    #[test]
    fn test_reaction_kind_parsing() {
        assert_eq!("heart".parse::<ReactionKind>(), Ok(ReactionKind::Heart));
        assert_eq!("wow".parse::<ReactionKind>(), Ok(ReactionKind::Wow));
        assert!("love".parse::<ReactionKind>().is_err());
        assert!("Heart".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn test_reaction_bump_saturates() {
        let mut reactions = Reactions {
            heart: u32::MAX,
            ..Reactions::default()
        };
        reactions.bump(ReactionKind::Heart);
        reactions.bump(ReactionKind::Wow);
        assert_eq!(reactions.count(ReactionKind::Heart), u32::MAX);
        assert_eq!(reactions.count(ReactionKind::Wow), 1);
        assert_eq!(reactions.count(ReactionKind::Laugh), 0);
    }
}
