//! Versioned local snapshot format and the default state.
//!
//! Snapshots are written as `{"schemaVersion": 2, "state": {...}}`. Version 1
//! blobs are bare state objects without an envelope, as written by the first
//! clients. Both are decoded into a lenient stored form, migrated once, and
//! defaulted in one place so the rest of the crate only sees complete records.

use crate::config::SeedConfig;
use crate::errors::{Error, Result};
use crate::models::{
    AppState, Challenge, Memory, Note, Plan, Profile, PublicProfile, RawMemory,
    records::sort_memories,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Version written by this crate
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

const VERSION_FIELD: &str = "schemaVersion";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    schema_version: u32,
    state: &'a AppState,
}

/// State as found in a cached blob; any field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredState {
    profile: Option<Profile>,
    notes: Vec<Note>,
    memories: Vec<RawMemory>,
    plans: Vec<Plan>,
    challenges: Vec<Challenge>,
    partner: Option<PublicProfile>,
}

/// Builds the state a brand-new owner starts with.
#[must_use]
pub fn default_state(seeds: &SeedConfig, now: DateTime<Utc>) -> AppState {
    let mut memories: Vec<Memory> = seeds
        .seed_memories()
        .into_iter()
        .map(|raw| Memory::normalize(raw, now))
        .collect();
    sort_memories(&mut memories);

    AppState {
        profile: seeds.profile.clone(),
        notes: Vec::new(),
        memories,
        plans: Vec::new(),
        challenges: seeds.seed_challenges(),
        partner: None,
    }
}

/// Serializes a state into the current snapshot format.
pub fn encode(state: &AppState) -> Result<String> {
    serde_json::to_string(&SnapshotRef {
        schema_version: CURRENT_SCHEMA_VERSION,
        state,
    })
    .map_err(Into::into)
}

/// Decodes a snapshot of any known version.
///
/// Missing fields take their defaults, memories are normalized and an empty
/// challenge list is replaced by the seed set.
pub fn decode(raw: &str, seeds: &SeedConfig, now: DateTime<Utc>) -> Result<AppState> {
    let value: Value = serde_json::from_str(raw)?;
    let stored = migrate(value)?;

    let mut memories: Vec<Memory> = stored
        .memories
        .into_iter()
        .map(|raw| Memory::normalize(raw, now))
        .collect();
    sort_memories(&mut memories);

    let challenges = if stored.challenges.is_empty() {
        seeds.seed_challenges()
    } else {
        stored.challenges
    };

    Ok(AppState {
        profile: stored.profile.unwrap_or_else(|| seeds.profile.clone()),
        notes: stored.notes,
        memories,
        plans: stored.plans,
        challenges,
        partner: stored.partner,
    })
}

fn migrate(value: Value) -> Result<StoredState> {
    let Value::Object(mut map) = value else {
        return Err(Error::Config {
            message: "Snapshot is not a JSON object".to_string(),
        });
    };

    let version = map
        .get(VERSION_FIELD)
        .and_then(Value::as_u64)
        .unwrap_or(1);

    match version {
        1 => {
            debug!("Migrating unversioned snapshot");
            serde_json::from_value(Value::Object(map)).map_err(Into::into)
        }
        2 => {
            let state = map.remove("state").unwrap_or(Value::Null);
            if state.is_null() {
                return Ok(StoredState::default());
            }
            serde_json::from_value(state).map_err(Into::into)
        }
        other => Err(Error::Config {
            message: format!("Unsupported snapshot version {other}"),
        }),
    }
}
