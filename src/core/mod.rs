//! Session state, hydration, pairing and the actions that mutate state.

/// Challenge completion
pub mod challenges;
/// Local cache and remote records merged into one state
pub mod merge;
/// Memory timeline actions
pub mod memories;
/// Background remote mirroring
pub mod mirror;
/// Note actions
pub mod notes;
/// Invite codes and couple linking
pub mod pairing;
/// Date plan actions
pub mod plans;
/// Profile edits and session-level pairing
pub mod profile;
/// Per-owner state container
pub mod session;
/// Versioned local snapshots
pub mod snapshot;
/// Dashboard figures
pub mod stats;

pub use mirror::{MirrorStats, MirrorWrite};
pub use session::Session;
