//! Typed record operations against the remote store.
//!
//! Owner-scoped records are stored under `<owner>_<localId>` with an `ownerId`
//! field so they can be listed per owner. Malformed documents are skipped with a
//! warning rather than failing the whole listing.

use super::{
    Collection, Document, OWNER_FIELD, RemoteStore, WriteMode, from_document, to_document,
};
use crate::errors::Result;
use crate::models::{
    Challenge, ChallengeRecord, Memory, Note, OwnerId, Plan, Profile, ProfilePatch,
    PublicProfile, RawMemory,
};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{instrument, warn};

const PARTNER_FALLBACK_NAME: &str = "Partner";

fn stamp_owner(mut fields: Document, owner: &OwnerId) -> Document {
    fields.insert(OWNER_FIELD.to_string(), Value::from(owner.as_str()));
    fields
}

fn stamp_updated_at(mut fields: Document) -> Document {
    fields.insert(
        "updatedAt".to_string(),
        Value::from(Utc::now().timestamp_millis()),
    );
    fields
}

async fn upsert_scoped<T: Serialize + Sync>(
    remote: &dyn RemoteStore,
    collection: Collection,
    owner: &OwnerId,
    local_id: &str,
    record: &T,
) -> Result<()> {
    let fields = stamp_owner(to_document(record)?, owner);
    remote
        .set_document(
            collection,
            &owner.scoped_id(local_id),
            fields,
            WriteMode::Replace,
        )
        .await
}

async fn fetch_scoped<T: DeserializeOwned>(
    remote: &dyn RemoteStore,
    collection: Collection,
    owner: &OwnerId,
) -> Result<Vec<T>> {
    let documents = remote
        .query_by_field(collection, OWNER_FIELD, owner.as_str())
        .await?;

    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        match from_document::<T>(collection, owner.as_str(), document) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable {} record: {}", collection, e),
        }
    }
    Ok(records)
}

/// Merge-writes the full profile.
pub async fn save_profile(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
    profile: &Profile,
) -> Result<()> {
    let fields = stamp_updated_at(stamp_owner(to_document(profile)?, owner));
    remote
        .set_document(
            Collection::Profiles,
            owner.as_str(),
            fields,
            WriteMode::Merge,
        )
        .await
}

/// Reads the owner's profile as a patch: only stored fields are present.
#[instrument(skip(remote))]
pub async fn fetch_profile(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
) -> Result<Option<ProfilePatch>> {
    remote
        .get_document(Collection::Profiles, owner.as_str())
        .await?
        .map(|document| from_document(Collection::Profiles, owner.as_str(), document))
        .transpose()
}

/// Reads another owner's name fields.
#[instrument(skip(remote))]
pub async fn fetch_public_profile(
    remote: &dyn RemoteStore,
    user_id: &str,
) -> Result<Option<PublicProfile>> {
    let Some(document) = remote.get_document(Collection::Profiles, user_id).await? else {
        return Ok(None);
    };
    let patch: ProfilePatch = from_document(Collection::Profiles, user_id, document)?;

    Ok(Some(PublicProfile {
        user_id: user_id.to_string(),
        your_name: patch
            .your_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| PARTNER_FALLBACK_NAME.to_string()),
        partner_name: patch.partner_name.unwrap_or_default(),
        anniversary: patch.anniversary.unwrap_or_default(),
    }))
}

/// Writes a note.
pub async fn upsert_note(remote: &dyn RemoteStore, owner: &OwnerId, note: &Note) -> Result<()> {
    upsert_scoped(remote, Collection::Notes, owner, &note.id, note).await
}

/// Removes a note.
pub async fn delete_note(remote: &dyn RemoteStore, owner: &OwnerId, note_id: &str) -> Result<()> {
    remote
        .delete_document(Collection::Notes, &owner.scoped_id(note_id))
        .await
}

/// Lists the owner's notes, newest first.
pub async fn fetch_notes(remote: &dyn RemoteStore, owner: &OwnerId) -> Result<Vec<Note>> {
    let mut notes: Vec<Note> = fetch_scoped(remote, Collection::Notes, owner).await?;
    notes.sort_by_key(|note| std::cmp::Reverse(note.created_at));
    Ok(notes)
}

/// Writes a plan.
pub async fn upsert_plan(remote: &dyn RemoteStore, owner: &OwnerId, plan: &Plan) -> Result<()> {
    upsert_scoped(remote, Collection::Plans, owner, &plan.id, plan).await
}

/// Removes a plan.
pub async fn delete_plan(remote: &dyn RemoteStore, owner: &OwnerId, plan_id: &str) -> Result<()> {
    remote
        .delete_document(Collection::Plans, &owner.scoped_id(plan_id))
        .await
}

/// Lists the owner's plans, newest first.
pub async fn fetch_plans(remote: &dyn RemoteStore, owner: &OwnerId) -> Result<Vec<Plan>> {
    let mut plans: Vec<Plan> = fetch_scoped(remote, Collection::Plans, owner).await?;
    plans.sort_by_key(|plan| std::cmp::Reverse(plan.created_at));
    Ok(plans)
}

/// Writes a memory.
pub async fn upsert_memory(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
    memory: &Memory,
) -> Result<()> {
    upsert_scoped(remote, Collection::Memories, owner, &memory.id, memory).await
}

/// Removes a memory.
pub async fn delete_memory(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
    memory_id: &str,
) -> Result<()> {
    remote
        .delete_document(Collection::Memories, &owner.scoped_id(memory_id))
        .await
}

/// Lists the owner's memories as stored; callers normalize them.
pub async fn fetch_memories(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
) -> Result<Vec<RawMemory>> {
    fetch_scoped(remote, Collection::Memories, owner).await
}

/// Writes the full challenge record, keyed by owner and challenge id.
pub async fn upsert_challenge(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
    challenge: &Challenge,
) -> Result<()> {
    let mut fields = to_document(challenge)?;
    // The challenge id travels as `challengeId`; `id` is the scoped document id
    if let Some(id) = fields.remove("id") {
        fields.insert("challengeId".to_string(), id);
    }
    let fields = stamp_updated_at(stamp_owner(fields, owner));
    remote
        .set_document(
            Collection::Challenges,
            &owner.scoped_id(&challenge.id),
            fields,
            WriteMode::Replace,
        )
        .await
}

/// Lists the owner's challenge completion records.
pub async fn fetch_challenges(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
) -> Result<Vec<ChallengeRecord>> {
    fetch_scoped(remote, Collection::Challenges, owner).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::SqlDocumentStore;
    use crate::test_utils::setup_test_db;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    async fn store() -> SqlDocumentStore {
        SqlDocumentStore::new(setup_test_db().await.unwrap())
    }

    #[tokio::test]
    async fn test_challenge_is_keyed_by_owner_and_challenge_id() -> Result<()> {
        let remote = store().await;
        let completed = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let challenge = Challenge {
            id: "c1".to_string(),
            title: "Compliment Blitz".to_string(),
            description: "Give 8 real compliments in 1 minute.".to_string(),
            points: 20,
            done: true,
            completed_at: Some(completed),
        };

        upsert_challenge(&remote, &OwnerId::from("alice"), &challenge).await?;
        upsert_challenge(&remote, &OwnerId::from("bob"), &challenge).await?;

        let doc = remote
            .get_document(Collection::Challenges, "alice_c1")
            .await?
            .unwrap();
        assert_eq!(doc["challengeId"], json!("c1"));
        assert_eq!(doc["ownerId"], json!("alice"));
        assert_eq!(doc["completedAt"], json!(1_700_000_000_000_i64));

        let records = fetch_challenges(&remote, &OwnerId::from("alice")).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].challenge_id, "c1");
        assert!(records[0].done);
        assert_eq!(records[0].completed_at, Some(completed));
        Ok(())
    }

    #[tokio::test]
    async fn test_notes_are_listed_newest_first_per_owner() -> Result<()> {
        let remote = store().await;
        let alice = OwnerId::from("alice");
        let base = Utc::now();

        for (id, offset) in [("n1", 0), ("n2", 5), ("n3", 2)] {
            let note = Note {
                id: id.to_string(),
                text: format!("note {id}"),
                created_at: base + Duration::seconds(offset),
            };
            upsert_note(&remote, &alice, &note).await?;
        }
        upsert_note(
            &remote,
            &OwnerId::from("bob"),
            &Note {
                id: "n9".to_string(),
                text: "bob's".to_string(),
                created_at: base,
            },
        )
        .await?;

        let notes = fetch_notes(&remote, &alice).await?;
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n3", "n1"]);

        delete_note(&remote, &alice, "n2").await?;
        assert_eq!(fetch_notes(&remote, &alice).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_profile_merges_and_fetch_returns_patch() -> Result<()> {
        let remote = store().await;
        let alice = OwnerId::from("alice");

        remote
            .set_document(
                Collection::Profiles,
                "alice",
                to_document(&json!({ "coupleId": "alice_bob" })).unwrap(),
                WriteMode::Replace,
            )
            .await?;

        let profile = Profile {
            your_name: "Alice".to_string(),
            ..Profile::default()
        };
        save_profile(&remote, &alice, &profile).await?;

        let patch = fetch_profile(&remote, &alice).await?.unwrap();
        assert_eq!(patch.your_name.as_deref(), Some("Alice"));
        // An unpaired local profile must not unlink a couple written by the other member
        assert_eq!(patch.couple_id.as_deref(), Some("alice_bob"));
        assert!(fetch_profile(&remote, &OwnerId::from("carol")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_public_profile_defaults_name() -> Result<()> {
        let remote = store().await;
        remote
            .set_document(
                Collection::Profiles,
                "bob",
                to_document(&json!({ "partnerName": "Alice" })).unwrap(),
                WriteMode::Replace,
            )
            .await?;

        let public = fetch_public_profile(&remote, "bob").await?.unwrap();
        assert_eq!(public.user_id, "bob");
        assert_eq!(public.your_name, "Partner");
        assert_eq!(public.partner_name, "Alice");
        assert_eq!(public.anniversary, "");
        assert!(fetch_public_profile(&remote, "nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_records_are_skipped() -> Result<()> {
        let remote = store().await;
        remote
            .set_document(
                Collection::Plans,
                "alice_bad",
                to_document(&json!({ "ownerId": "alice", "createdAt": "never" })).unwrap(),
                WriteMode::Replace,
            )
            .await?;
        upsert_plan(
            &remote,
            &OwnerId::from("alice"),
            &Plan {
                id: "p1".to_string(),
                title: "Picnic".to_string(),
                created_at: Utc::now(),
                planned_for: None,
                planned_for_ms: None,
            },
        )
        .await?;

        let plans = fetch_plans(&remote, &OwnerId::from("alice")).await?;
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Picnic");
        Ok(())
    }
}
