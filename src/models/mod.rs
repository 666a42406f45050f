//! Domain types shared by the stores, the merge engine and the action surface.

/// Invite and couple documents
pub mod pairing;
/// Owner-scoped records
pub mod records;
/// Session state and owner identity
pub mod state;

pub use pairing::{Couple, Invite, InviteLinks, InviteStatus, PairingResult};
pub use records::{
    Challenge, ChallengeRecord, Memory, MemoryInput, Note, Plan, PlanInput, Profile,
    ProfilePatch, PublicProfile, RawMemory, ReactionKind, Reactions,
};
pub use state::{AppState, OwnerId};

use thiserror::Error;

/// Why an action refused its input. Returned to the caller, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Title was empty or whitespace
    #[error("title_required")]
    TitleRequired,
    /// Note text was empty or whitespace
    #[error("text_required")]
    TextRequired,
    /// Date text could not be parsed
    #[error("invalid_date")]
    InvalidDate,
    /// A plan with the same title already exists
    #[error("duplicate_title")]
    DuplicateTitle,
    /// Reaction kind is not one of heart, laugh, wow
    #[error("unknown_reaction")]
    UnknownReaction,
    /// No record with the given id
    #[error("not_found")]
    NotFound,
}

impl Rejection {
    /// Stable reason tag for UI messaging
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::TitleRequired => "title_required",
            Self::TextRequired => "text_required",
            Self::InvalidDate => "invalid_date",
            Self::DuplicateTitle => "duplicate_title",
            Self::UnknownReaction => "unknown_reaction",
            Self::NotFound => "not_found",
        }
    }
}

/// Result of a validated action
pub type ActionResult<T> = std::result::Result<T, Rejection>;
