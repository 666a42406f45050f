//! The in-memory application state of one owner session.

use super::{Challenge, Memory, Note, Plan, Profile, PublicProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

const GUEST_OWNER: &str = "guest";
const STORAGE_KEY_PREFIX: &str = "loveverse_state_";

/// Identity that scopes every personal record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wraps an authenticated id, falling back to the guest owner when absent or blank.
    #[must_use]
    pub fn resolve(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::guest(),
        }
    }

    /// The shared guest owner
    #[must_use]
    pub fn guest() -> Self {
        Self(GUEST_OWNER.to_string())
    }

    /// Whether this is the guest owner
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_OWNER
    }

    /// Local store key holding this owner's cached state
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.0)
    }

    /// Remote document id of an owner-scoped record
    #[must_use]
    pub fn scoped_id(&self, local_id: &str) -> String {
        format!("{}_{local_id}", self.0)
    }

    /// Raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::resolve(Some(value))
    }
}

/// Canonical state of a session: what screens read and actions mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub profile: Profile,
    pub notes: Vec<Note>,
    pub memories: Vec<Memory>,
    pub plans: Vec<Plan>,
    pub challenges: Vec<Challenge>,
    /// Linked partner's public profile, when known
    pub partner: Option<PublicProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_resolution_falls_back_to_guest() {
        assert_eq!(OwnerId::resolve(None), OwnerId::guest());
        assert_eq!(OwnerId::resolve(Some("   ")), OwnerId::guest());
        assert_eq!(OwnerId::resolve(Some("alice")).as_str(), "alice");
        assert!(OwnerId::guest().is_guest());
    }

    #[test]
    fn test_storage_key_and_scoped_ids() {
        let owner = OwnerId::from("alice");
        assert_eq!(owner.storage_key(), "loveverse_state_alice");
        assert_eq!(owner.scoped_id("c1"), "alice_c1");
        assert_eq!(OwnerId::guest().storage_key(), "loveverse_state_guest");
    }
}
