//! Profile edits and the session side of partner pairing.

use super::merge::fetch_partner;
use super::mirror::MirrorWrite;
use super::pairing;
use super::session::Session;
use crate::errors::Result;
use crate::models::records::day_key;
use crate::models::{ActionResult, InviteLinks, PairingResult, Profile, ProfilePatch, Rejection};
use crate::store::with_timeout;
use chrono::NaiveDate;
use tracing::{info, instrument};

impl Session {
    /// Shallow-merges `patch` into the profile and mirrors the result.
    ///
    /// Fields absent from the patch are kept, here and remotely.
    pub async fn update_profile(&mut self, patch: ProfilePatch) -> Profile {
        let profile = &mut self.state_mut().profile;
        profile.apply(patch);
        let updated = profile.clone();

        self.commit(MirrorWrite::SaveProfile(updated.clone())).await;
        updated
    }

    /// Records that the partner onboarding prompt was dismissed.
    pub async fn mark_partner_onboarding_seen(&mut self) -> Profile {
        self.update_profile(ProfilePatch {
            onboarding_seen: Some(true),
            ..ProfilePatch::default()
        })
        .await
    }

    /// Sets the mood of `day`, replacing any earlier entry for that day.
    pub async fn log_mood(&mut self, day: NaiveDate, mood: &str) -> ActionResult<Profile> {
        let mood = mood.trim();
        if mood.is_empty() {
            return Err(Rejection::TextRequired);
        }

        let mut mood_log = self.state().profile.mood_log.clone();
        mood_log.insert(day_key(day), mood.to_string());
        Ok(self
            .update_profile(ProfilePatch {
                mood_log: Some(mood_log),
                ..ProfilePatch::default()
            })
            .await)
    }

    /// Creates an invite for this owner and returns its shareable forms.
    #[instrument(skip(self), fields(owner = %self.owner()))]
    pub async fn create_invite_code(&self) -> Result<InviteLinks> {
        let code = with_timeout(
            self.settings().remote_timeout,
            pairing::create_invite(self.remote(), self.owner()),
        )
        .await?;
        Ok(pairing::build_invite_links(
            &code,
            &self.settings().invite_web_base_url,
        ))
    }

    /// Redeems a partner's invite, given as a code or a link.
    ///
    /// On success the profile is linked to the partner and the partner's
    /// public profile is loaded. Pairing errors leave the state untouched.
    #[instrument(skip(self), fields(owner = %self.owner()))]
    pub async fn join_by_invite_code(&mut self, input: &str) -> Result<PairingResult> {
        let code = pairing::parse_invite_code(input).unwrap_or_else(|| input.trim().to_string());
        let timeout = self.settings().remote_timeout;

        let result = with_timeout(
            timeout,
            pairing::accept_invite(self.remote(), &code, self.owner()),
        )
        .await?;
        let partner = fetch_partner(self.remote(), &result.partner_user_id, timeout).await;

        let state = self.state_mut();
        state.profile.couple_id = Some(result.couple_id.clone());
        state.profile.partner_user_id = Some(result.partner_user_id.clone());
        state.profile.onboarding_seen = true;
        state.partner = partner;
        self.persist_local().await;

        info!("Joined couple {}", result.couple_id);
        Ok(result)
    }
}
