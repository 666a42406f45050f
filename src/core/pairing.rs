//! Partner pairing - one-time invite codes that link two owners into a couple.
//!
//! An invite is created `active` by one owner and redeemed at most once by a
//! different owner. Redemption writes the couple, both profiles and the invite
//! in a single atomic batch guarded by a check that the invite is still
//! `active`, so a code can never be redeemed twice, even by racing clients.

use crate::errors::{Error, Result};
use crate::models::{Couple, Invite, InviteLinks, InviteStatus, OwnerId, PairingResult};
use crate::store::{
    BatchOp, Collection, Document, RemoteStore, WriteMode, from_document, to_document,
};
use chrono::Utc;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Symbols invite codes are drawn from; 0/O and 1/I are left out
pub const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Length of generated invite codes
pub const INVITE_CODE_LENGTH: usize = 7;
/// Collision retries before giving up
pub const MAX_INVITE_ATTEMPTS: u32 = 5;
/// URI scheme of app deep links
pub const APP_SCHEME: &str = "loveverse";

/// Draws a fresh random invite code.
#[must_use]
pub fn random_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| char::from(INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())]))
        .collect()
}

/// Trims and uppercases a user-entered code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Couple id of two owners: both ids sorted and joined, whoever invited whom.
#[must_use]
pub fn couple_id_for(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{first}_{second}")
}

/// Creates an invite with a random code.
pub async fn create_invite(remote: &dyn RemoteStore, owner: &OwnerId) -> Result<String> {
    create_invite_with(remote, owner, random_invite_code).await
}

/// Creates an invite, drawing candidate codes from `next_code` until one is free.
#[instrument(skip(remote, next_code))]
pub async fn create_invite_with<F>(
    remote: &dyn RemoteStore,
    owner: &OwnerId,
    mut next_code: F,
) -> Result<String>
where
    F: FnMut() -> String + Send,
{
    for attempt in 1..=MAX_INVITE_ATTEMPTS {
        let code = next_code();
        if remote
            .get_document(Collection::PartnerInvites, &code)
            .await?
            .is_some()
        {
            debug!("Invite code collision on attempt {}", attempt);
            continue;
        }

        let invite = Invite::new(code.clone(), owner.as_str().to_string(), Utc::now());
        remote
            .set_document(
                Collection::PartnerInvites,
                &code,
                to_document(&invite)?,
                WriteMode::Replace,
            )
            .await?;
        info!("Created invite {} for {}", code, owner);
        return Ok(code);
    }

    warn!("Could not find a free invite code for {}", owner);
    Err(Error::InviteGenerationExhausted {
        attempts: MAX_INVITE_ATTEMPTS,
    })
}

/// Redeems `code` for `joining`, linking both owners into one couple.
///
/// Returns the couple id and the invite creator's id.
#[instrument(skip(remote))]
pub async fn accept_invite(
    remote: &dyn RemoteStore,
    code: &str,
    joining: &OwnerId,
) -> Result<PairingResult> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(Error::InviteNotFound { code });
    }

    let document = remote
        .get_document(Collection::PartnerInvites, &code)
        .await?
        .ok_or_else(|| Error::InviteNotFound { code: code.clone() })?;
    let invite: Invite = from_document(Collection::PartnerInvites, &code, document)?;

    if invite.status != InviteStatus::Active {
        return Err(Error::InviteNotActive { code });
    }
    if invite.owner_id == joining.as_str() {
        return Err(Error::SelfJoinRejected);
    }

    let creator = invite.owner_id;
    let joiner = joining.as_str().to_string();
    let couple_id = couple_id_for(&creator, &joiner);
    let now = Utc::now();

    let members = if creator <= joiner {
        [creator.clone(), joiner.clone()]
    } else {
        [joiner.clone(), creator.clone()]
    };
    let couple = Couple {
        couple_id: couple_id.clone(),
        members,
        created_at: now,
        invite_code: code.clone(),
    };

    let link = |partner: &str| -> Document {
        let mut fields = Document::new();
        fields.insert("coupleId".to_string(), Value::from(couple_id.as_str()));
        fields.insert("partnerUserId".to_string(), Value::from(partner));
        fields.insert("onboardingSeen".to_string(), Value::from(true));
        fields.insert("updatedAt".to_string(), Value::from(now.timestamp_millis()));
        fields
    };

    let mut redeemed = Document::new();
    redeemed.insert("status".to_string(), serde_json::to_value(InviteStatus::Accepted)?);
    redeemed.insert("usedBy".to_string(), Value::from(joiner.as_str()));
    redeemed.insert("acceptedAt".to_string(), Value::from(now.timestamp_millis()));

    // Racing redemptions can both pass the status read above; only this
    // check runs inside the batch transaction.
    let still_active = BatchOp::Expect {
        collection: Collection::PartnerInvites,
        id: code.clone(),
        field: "status".to_string(),
        value: serde_json::to_value(InviteStatus::Active)?,
    };

    remote
        .atomic_batch(vec![
            still_active,
            BatchOp::Set {
                collection: Collection::Couples,
                id: couple_id.clone(),
                fields: to_document(&couple)?,
                mode: WriteMode::Merge,
            },
            BatchOp::Set {
                collection: Collection::Profiles,
                id: creator.clone(),
                fields: link(&joiner),
                mode: WriteMode::Merge,
            },
            BatchOp::Set {
                collection: Collection::Profiles,
                id: joiner.clone(),
                fields: link(&creator),
                mode: WriteMode::Merge,
            },
            BatchOp::Set {
                collection: Collection::PartnerInvites,
                id: code.clone(),
                fields: redeemed,
                mode: WriteMode::Merge,
            },
        ])
        .await
        .map_err(|e| match e {
            Error::PreconditionFailed { .. } => {
                warn!("Invite {} was redeemed concurrently", code);
                Error::InviteNotActive { code: code.clone() }
            }
            other => other,
        })?;

    info!("Invite {} linked {} and {} as {}", code, creator, joiner, couple_id);
    Ok(PairingResult {
        couple_id,
        partner_user_id: creator,
    })
}

/// Builds the shareable links for a code.
#[must_use]
pub fn build_invite_links(code: &str, web_base_url: &str) -> InviteLinks {
    let code = normalize_code(code);
    let web_invite_link = match Url::parse(web_base_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("code", &code);
            url.to_string()
        }
        Err(_) => format!("{web_base_url}?code={code}"),
    };

    InviteLinks {
        app_deep_link: format!("{APP_SCHEME}://invite/{code}"),
        web_invite_link,
        code,
    }
}

/// Extracts an invite code from a raw code, an app deep link or a web link.
#[must_use]
pub fn parse_invite_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Ok(url) = Url::parse(input) else {
        return is_plausible_code(input).then(|| normalize_code(input));
    };

    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned());

    let from_deep_link = (url.scheme() == APP_SCHEME && url.host_str() == Some("invite"))
        .then(|| {
            url.path_segments()
                .and_then(|mut segments| segments.find(|s| !s.is_empty()))
                .map(str::to_string)
        })
        .flatten();

    from_query
        .or(from_deep_link)
        .map(|code| normalize_code(&code))
        .filter(|code| is_plausible_code(code))
}

fn is_plausible_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}
