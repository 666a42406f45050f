//! Hydration: merging the local cache and the remote records into one state.
//!
//! Collections (notes, plans, memories) are taken wholesale from the remote
//! store whenever it has any, while challenges are merged per item: their
//! definitions are local and only completion comes from the remote record.
//! Hydration never fails. Every remote problem degrades to local data.

use super::snapshot;
use crate::config::SeedConfig;
use crate::errors::Result;
use crate::models::records::sort_memories;
use crate::models::{
    AppState, Challenge, ChallengeRecord, Memory, Note, OwnerId, Plan, ProfilePatch,
    PublicProfile, RawMemory,
};
use crate::store::{LocalStore, RemoteStore, records, with_timeout};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Everything the remote store holds for one owner
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    /// Stored profile fields, if a profile document exists
    pub profile: Option<ProfilePatch>,
    pub notes: Vec<Note>,
    pub plans: Vec<Plan>,
    pub challenges: Vec<ChallengeRecord>,
    pub memories: Vec<RawMemory>,
}

/// Reads the owner's cached state, falling back to the default state when the
/// blob is missing, unreadable or cannot be decoded.
pub async fn load_local(
    local: &dyn LocalStore,
    owner: &OwnerId,
    seeds: &SeedConfig,
    now: DateTime<Utc>,
) -> AppState {
    let raw = match local.get(&owner.storage_key()).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No cached state for {}", owner);
            return snapshot::default_state(seeds, now);
        }
        Err(e) => {
            warn!("Could not read cached state for {}: {}", owner, e);
            return snapshot::default_state(seeds, now);
        }
    };

    snapshot::decode(&raw, seeds, now).unwrap_or_else(|e| {
        warn!("Discarding corrupt cached state for {}: {}", owner, e);
        snapshot::default_state(seeds, now)
    })
}

/// Fetches all five remote record sets in parallel.
///
/// Returns `None` if any fetch fails or times out; partial results are never
/// handed to the merge.
pub async fn fetch_remote(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
    timeout: Duration,
) -> Option<RemoteSnapshot> {
    let fetched: Result<_> = tokio::try_join!(
        with_timeout(timeout, records::fetch_profile(remote, owner)),
        with_timeout(timeout, records::fetch_notes(remote, owner)),
        with_timeout(timeout, records::fetch_plans(remote, owner)),
        with_timeout(timeout, records::fetch_challenges(remote, owner)),
        with_timeout(timeout, records::fetch_memories(remote, owner)),
    );

    match fetched {
        Ok((profile, notes, plans, challenges, memories)) => Some(RemoteSnapshot {
            profile,
            notes,
            plans,
            challenges,
            memories,
        }),
        Err(e) => {
            warn!("Remote records unavailable for {}, using local state: {}", owner, e);
            None
        }
    }
}

/// Overlays remote completion onto the local challenge definitions.
#[must_use]
pub fn merge_challenges(local: Vec<Challenge>, remote: &[ChallengeRecord]) -> Vec<Challenge> {
    local
        .into_iter()
        .map(|mut challenge| {
            if let Some(record) = remote.iter().find(|r| r.challenge_id == challenge.id) {
                challenge.done = record.done;
                challenge.completed_at = record.completed_at;
            }
            challenge
        })
        .collect()
}

/// Combines the local state with a remote snapshot.
#[must_use]
pub fn merge(
    mut local: AppState,
    remote: Option<RemoteSnapshot>,
    seeds: &SeedConfig,
    now: DateTime<Utc>,
) -> AppState {
    if local.challenges.is_empty() {
        local.challenges = seeds.seed_challenges();
    }
    let Some(remote) = remote else {
        return local;
    };

    if let Some(patch) = remote.profile {
        local.profile.apply(patch);
    }

    if remote.notes.is_empty() {
        debug!("Keeping {} local notes", local.notes.len());
    } else {
        local.notes = remote.notes;
    }

    if remote.plans.is_empty() {
        debug!("Keeping {} local plans", local.plans.len());
    } else {
        local.plans = remote.plans;
    }

    if remote.memories.is_empty() {
        debug!("Keeping {} local memories", local.memories.len());
    } else {
        local.memories = remote
            .memories
            .into_iter()
            .map(|raw| Memory::normalize(raw, now))
            .collect();
        sort_memories(&mut local.memories);
    }

    local.challenges = merge_challenges(local.challenges, &remote.challenges);
    local
}

/// Looks up the linked partner's public profile; any failure yields `None`.
pub async fn fetch_partner(
    remote: &dyn RemoteStore,
    partner_user_id: &str,
    timeout: Duration,
) -> Option<PublicProfile> {
    match with_timeout(timeout, records::fetch_public_profile(remote, partner_user_id)).await {
        Ok(partner) => partner,
        Err(e) => {
            warn!("Partner profile {} unavailable: {}", partner_user_id, e);
            None
        }
    }
}

/// Builds the canonical state of `owner` from the local cache and the remote store.
#[instrument(skip(remote, local, seeds))]
pub async fn hydrate(
    owner: &OwnerId,
    remote: &dyn RemoteStore,
    local: &dyn LocalStore,
    seeds: &SeedConfig,
    timeout: Duration,
) -> AppState {
    let now = Utc::now();
    let cached = load_local(local, owner, seeds, now).await;
    let fetched = fetch_remote(remote, owner, timeout).await;
    let from_remote = fetched.is_some();

    let mut state = merge(cached, fetched, seeds, now);

    state.partner = match state.profile.partner_user_id.as_deref() {
        Some(partner_id) => fetch_partner(remote, partner_id, timeout).await,
        None => None,
    };

    info!(
        "Hydrated {} ({} notes, {} plans, {} memories, remote: {})",
        owner,
        state.notes.len(),
        state.plans.len(),
        state.memories.len(),
        from_remote
    );
    state
}
