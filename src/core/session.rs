//! The state container of one signed-in owner.
//!
//! A session is created per owner, hydrated once, then mutated by the actions
//! in the sibling modules. After every change the whole state is written to
//! the local store and a mirror write is queued for the remote store. Local
//! writes only start once hydration has finished, so the cache is never
//! overwritten with the pre-hydration default state.

use super::merge;
use super::mirror::{MirrorPolicy, MirrorQueue, MirrorStats, MirrorWrite};
use super::snapshot;
use crate::config::{AppSettings, SeedConfig};
use crate::models::{AppState, OwnerId};
use crate::store::{LocalStore, RemoteStore};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// One owner's live application state
pub struct Session {
    owner: OwnerId,
    state: AppState,
    hydrated: bool,
    remote: Arc<dyn RemoteStore>,
    local: Arc<dyn LocalStore>,
    seeds: SeedConfig,
    settings: AppSettings,
    mirror: MirrorQueue,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("owner", &self.owner)
            .field("hydrated", &self.hydrated)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an unhydrated session holding the default state.
    ///
    /// `user_id` falls back to the guest owner when absent. Must be called
    /// inside a Tokio runtime because it starts the mirror worker.
    #[must_use]
    pub fn new(
        user_id: Option<&str>,
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        seeds: SeedConfig,
        settings: AppSettings,
    ) -> Self {
        let owner = OwnerId::resolve(user_id);
        let mirror = MirrorQueue::spawn(
            owner.clone(),
            Arc::clone(&remote),
            MirrorPolicy::from(&settings),
        );
        Self {
            state: snapshot::default_state(&seeds, Utc::now()),
            owner,
            hydrated: false,
            remote,
            local,
            seeds,
            settings,
            mirror,
        }
    }

    /// Creates and hydrates a session.
    pub async fn open(
        user_id: Option<&str>,
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        seeds: SeedConfig,
        settings: AppSettings,
    ) -> Self {
        let mut session = Self::new(user_id, remote, local, seeds, settings);
        session.hydrate().await;
        session
    }

    /// Rebuilds the state from the local cache and the remote store.
    pub async fn hydrate(&mut self) {
        self.hydrated = false;
        self.state = merge::hydrate(
            &self.owner,
            self.remote.as_ref(),
            self.local.as_ref(),
            &self.seeds,
            self.settings.remote_timeout,
        )
        .await;
        self.hydrated = true;
        self.persist_local().await;
    }

    /// Owner this session belongs to
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Whether hydration has finished
    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Settings the session was opened with
    #[must_use]
    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Counters of the mirror worker
    pub async fn mirror_stats(&self) -> MirrorStats {
        self.mirror.stats().await
    }

    /// Waits for every queued mirror write to finish.
    pub async fn flush_mirror(&self) {
        self.mirror.flush().await;
    }

    /// Ends the session, draining pending mirror writes first.
    pub async fn sign_out(self) -> MirrorStats {
        info!("Signing out {}", self.owner);
        self.mirror.shutdown().await
    }

    pub(super) const fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub(super) fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }

    /// Persists the new state and queues its remote counterpart.
    pub(super) async fn commit(&mut self, write: MirrorWrite) {
        self.persist_local().await;
        self.mirror.enqueue(write);
    }

    /// Writes the whole state to the local store. Failures are logged only.
    pub(super) async fn persist_local(&self) {
        if !self.hydrated {
            trace!("Skipping local write for {} before hydration", self.owner);
            return;
        }

        let blob = match snapshot::encode(&self.state) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Could not encode state for {}: {}", self.owner, e);
                return;
            }
        };
        if let Err(e) = self.local.set(&self.owner.storage_key(), &blob).await {
            warn!("Could not cache state for {}: {}", self.owner, e);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::Note;
    use crate::store::{SqlDocumentStore, SqlLocalStore};
    use crate::test_utils::{UnreachableRemote, init_test_tracing, setup_test_db, test_settings};

    #[tokio::test]
    async fn test_guest_session_when_signed_out() {
        let db = setup_test_db().await.unwrap();
        let session = Session::open(
            None,
            Arc::new(UnreachableRemote),
            Arc::new(SqlLocalStore::new(db)),
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        assert!(session.owner().is_guest());
        assert!(session.is_hydrated());
    }

    #[tokio::test]
    async fn test_no_local_write_before_hydration() {
        init_test_tracing();
        let db = setup_test_db().await.unwrap();
        let local = Arc::new(SqlLocalStore::new(db));
        let session = Session::new(
            Some("alice"),
            Arc::new(UnreachableRemote),
            local.clone(),
            SeedConfig::default(),
            test_settings(),
        );

        session.persist_local().await;
        assert!(local.get("loveverse_state_alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_survives_reopening() {
        init_test_tracing();
        let db = setup_test_db().await.unwrap();
        let local = Arc::new(SqlLocalStore::new(db));

        let mut session = Session::open(
            Some("alice"),
            Arc::new(UnreachableRemote),
            local.clone(),
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        session.state_mut().notes.push(Note {
            id: "n1".to_string(),
            text: "kept offline".to_string(),
            created_at: Utc::now(),
        });
        session.persist_local().await;
        session.sign_out().await;

        let reopened = Session::open(
            Some("alice"),
            Arc::new(UnreachableRemote),
            local,
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        assert_eq!(reopened.state().notes.len(), 1);
        assert_eq!(reopened.state().notes[0].text, "kept offline");
    }

    #[tokio::test]
    async fn test_owners_do_not_share_state() {
        let db = setup_test_db().await.unwrap();
        let remote: Arc<dyn RemoteStore> = Arc::new(SqlDocumentStore::new(db.clone()));
        let local: Arc<dyn LocalStore> = Arc::new(SqlLocalStore::new(db));

        let mut alice = Session::open(
            Some("alice"),
            Arc::clone(&remote),
            Arc::clone(&local),
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        alice.state_mut().profile.your_name = "Alice".to_string();
        alice.persist_local().await;

        let bob = Session::open(
            Some("bob"),
            remote,
            local,
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        assert_eq!(bob.state().profile.your_name, "Ali");
    }
}
