//! Invite and couple documents used by the pairing protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an invite code. An invite moves `Active -> Accepted` once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    /// Waiting to be redeemed
    Active,
    /// Redeemed by another owner
    Accepted,
}

/// One-time partner invite, stored under its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub code: String,
    /// Owner that created the invite
    pub owner_id: String,
    pub status: InviteStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Owner that redeemed the invite
    pub used_by: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// A fresh, unredeemed invite
    #[must_use]
    pub fn new(code: String, owner_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            code,
            owner_id,
            status: InviteStatus::Active,
            created_at,
            used_by: None,
            accepted_at: None,
        }
    }
}

/// Two linked owners. Membership never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Couple {
    pub couple_id: String,
    /// Both member ids, sorted
    pub members: [String; 2],
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub invite_code: String,
}

/// Outcome of redeeming an invite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingResult {
    pub couple_id: String,
    /// The other party: the invite's creator, from the joiner's point of view
    pub partner_user_id: String,
}

/// Shareable forms of an invite code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteLinks {
    pub code: String,
    /// `loveverse://invite/<CODE>`
    pub app_deep_link: String,
    /// `<web base>?code=<CODE>`
    pub web_invite_link: String,
}
