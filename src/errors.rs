//! Unified error types for `LoveVerse`.
//!
//! Pairing failures and store failures share one enum so they can be propagated
//! with `?`. Validation failures of the action surface are not errors: they are
//! returned as [`crate::models::Rejection`] values.

use thiserror::Error;

/// Errors raised by the stores, the pairing protocol and configuration loading.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying SQL store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote document service could not be reached
    #[error("Remote store unavailable: {reason}")]
    RemoteUnavailable {
        /// Transport or permission failure description
        reason: String,
    },

    /// A remote call did not finish within the configured timeout
    #[error("Remote call timed out after {elapsed_ms} ms")]
    RemoteTimeout {
        /// The timeout that elapsed
        elapsed_ms: u64,
    },

    /// A stored document did not have the expected shape
    #[error("Malformed document {collection}/{id}: {message}")]
    MalformedDocument {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
        /// Decoder message
        message: String,
    },

    /// A batch precondition did not hold, so nothing was written
    #[error("Precondition on {collection}/{id}.{field} failed")]
    PreconditionFailed {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
        /// Field that held another value
        field: String,
    },

    /// No invite exists for the given code
    #[error("Invalid invite code: {code}")]
    InviteNotFound {
        /// Normalized code that was looked up
        code: String,
    },

    /// The invite was already redeemed
    #[error("Invite code {code} is no longer active")]
    InviteNotActive {
        /// Normalized code that was looked up
        code: String,
    },

    /// The creator of an invite tried to redeem it
    #[error("You cannot join your own invite")]
    SelfJoinRejected,

    /// Every generated invite code collided with an existing one
    #[error("Could not generate invite code after {attempts} attempts")]
    InviteGenerationExhausted {
        /// Number of attempts made
        attempts: u32,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
