//! Date plan actions.

use super::mirror::MirrorWrite;
use super::session::Session;
use crate::models::records::day_key;
use crate::models::{ActionResult, Plan, PlanInput, Rejection};
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Parses a plan's target day, returning the normalized day and its UTC midnight.
fn parse_planned_for(text: &str) -> Option<(String, i64)> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()?;
    let midnight = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    Some((day_key(date), midnight))
}

impl Session {
    /// Adds a plan to the front of the list. Titles are unique ignoring case.
    pub async fn add_plan(&mut self, input: impl Into<PlanInput>) -> ActionResult<Plan> {
        let input = input.into();
        let title = input.title.trim();
        if title.is_empty() {
            return Err(Rejection::TitleRequired);
        }

        let folded = title.to_lowercase();
        if self
            .state()
            .plans
            .iter()
            .any(|p| p.title.trim().to_lowercase() == folded)
        {
            debug!("Plan {:?} already exists", title);
            return Err(Rejection::DuplicateTitle);
        }

        let (planned_for, planned_for_ms) = match input.planned_for.as_deref().map(str::trim) {
            None | Some("") => (None, None),
            Some(text) => {
                let (day, ms) = parse_planned_for(text).ok_or(Rejection::InvalidDate)?;
                (Some(day), Some(ms))
            }
        };

        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
            planned_for,
            planned_for_ms,
        };
        self.state_mut().plans.insert(0, plan.clone());

        self.commit(MirrorWrite::UpsertPlan(plan.clone())).await;
        Ok(plan)
    }

    /// Removes a plan by id.
    pub async fn delete_plan(&mut self, id: &str) -> ActionResult<()> {
        let plans = &mut self.state_mut().plans;
        let before = plans.len();
        plans.retain(|p| p.id != id);
        if plans.len() == before {
            return Err(Rejection::NotFound);
        }

        self.commit(MirrorWrite::DeletePlan(id.to_string())).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::SeedConfig;
    use crate::store::{Collection, RemoteStore, SqlDocumentStore, SqlLocalStore};
    use crate::test_utils::{setup_test_db, test_settings};
    use std::sync::Arc;

    async fn session() -> (Session, Arc<SqlDocumentStore>) {
        let db = setup_test_db().await.unwrap();
        let remote = Arc::new(SqlDocumentStore::new(db.clone()));
        let session = Session::open(
            Some("alice"),
            remote.clone(),
            Arc::new(SqlLocalStore::new(db)),
            SeedConfig::default(),
            test_settings(),
        )
        .await;
        (session, remote)
    }

    #[test]
    fn test_planned_for_is_utc_midnight() {
        let (day, ms) = parse_planned_for("2023-11-14").unwrap();
        assert_eq!(day, "2023-11-14");
        assert_eq!(ms, 1_699_920_000_000);
        assert!(parse_planned_for("next friday").is_none());
    }

    #[tokio::test]
    async fn test_add_plan_from_title_or_input() {
        let (mut session, remote) = session().await;
        let bare = session.add_plan("  Picnic ").await.unwrap();
        assert_eq!(bare.title, "Picnic");
        assert!(bare.planned_for.is_none());
        assert!(bare.planned_for_ms.is_none());

        let dated = session
            .add_plan(PlanInput {
                title: "Museum".to_string(),
                planned_for: Some("2023-11-14".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(dated.planned_for.as_deref(), Some("2023-11-14"));
        assert_eq!(dated.planned_for_ms, Some(1_699_920_000_000));
        assert_eq!(session.state().plans[0].id, dated.id);

        session.flush_mirror().await;
        let doc = remote
            .get_document(Collection::Plans, &format!("alice_{}", dated.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["plannedForMs"], 1_699_920_000_000_i64);
    }

    #[tokio::test]
    async fn test_add_plan_rejections() {
        let (mut session, _) = session().await;
        session.add_plan("Picnic").await.unwrap();

        assert_eq!(session.add_plan("   ").await, Err(Rejection::TitleRequired));
        assert_eq!(
            session.add_plan(" PICNIC ").await,
            Err(Rejection::DuplicateTitle)
        );
        let bad_date = session
            .add_plan(PlanInput {
                title: "Dinner".to_string(),
                planned_for: Some("soon".to_string()),
            })
            .await;
        assert_eq!(bad_date, Err(Rejection::InvalidDate));
        assert_eq!(session.state().plans.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_plan() {
        let (mut session, remote) = session().await;
        let plan = session.add_plan("Hike").await.unwrap();
        session.delete_plan(&plan.id).await.unwrap();
        assert!(session.state().plans.is_empty());
        assert_eq!(session.delete_plan(&plan.id).await, Err(Rejection::NotFound));

        session.flush_mirror().await;
        assert!(
            remote
                .get_document(Collection::Plans, &format!("alice_{}", plan.id))
                .await
                .unwrap()
                .is_none()
        );
    }
}
