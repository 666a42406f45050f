//! Challenge completion.

use super::mirror::MirrorWrite;
use super::session::Session;
use crate::models::{ActionResult, Challenge, Rejection};
use chrono::Utc;
use tracing::debug;

impl Session {
    /// Flips a challenge between done and not done.
    pub async fn toggle_challenge(&mut self, id: &str) -> ActionResult<Challenge> {
        let challenge = self
            .state_mut()
            .challenges
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Rejection::NotFound)?;
        challenge.toggle(Utc::now());
        let updated = challenge.clone();
        debug!("Challenge {} is now done={}", updated.id, updated.done);

        self.commit(MirrorWrite::UpsertChallenge(updated.clone())).await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::config::SeedConfig;
    use crate::core::Session;
    use crate::models::Rejection;
    use crate::store::{Collection, RemoteStore, SqlDocumentStore, SqlLocalStore};
    use crate::test_utils::{setup_test_db, test_settings};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let db = setup_test_db().await.unwrap();
        let remote = Arc::new(SqlDocumentStore::new(db.clone()));
        let mut session = Session::open(
            Some("alice"),
            remote.clone(),
            Arc::new(SqlLocalStore::new(db)),
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        let original = session.state().challenges[0].clone();

        let done = session.toggle_challenge(&original.id).await.unwrap();
        assert!(done.done);
        assert!(done.completed_at.is_some());

        session.flush_mirror().await;
        let doc = remote
            .get_document(Collection::Challenges, &format!("alice_{}", original.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["challengeId"], json!(original.id));
        assert_eq!(doc["done"], json!(true));
        assert_eq!(doc["points"], json!(original.points));

        let undone = session.toggle_challenge(&original.id).await.unwrap();
        assert!(!undone.done);
        assert!(undone.completed_at.is_none());
        assert_eq!(undone, original);
        assert_eq!(session.state().challenges[0], original);
    }

    #[tokio::test]
    async fn test_unknown_challenge() {
        let db = setup_test_db().await.unwrap();
        let mut session = Session::open(
            Some("alice"),
            Arc::new(SqlDocumentStore::new(db.clone())),
            Arc::new(SqlLocalStore::new(db)),
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        assert_eq!(
            session.toggle_challenge("c99").await,
            Err(Rejection::NotFound)
        );
    }
}
