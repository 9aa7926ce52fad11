//! Error taxonomy for the analysis pipeline.
//!
//! Sanity findings are deliberately *not* errors — they are advisory
//! data attached to a successful result (see [`crate::sanity`]).

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed input, rejected before any job is created.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A job or result that the caller referenced does not exist.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A matching source timed out or errored. Recovered locally by
    /// falling through the cascade; only surfaced when every source
    /// (including the vision fallback) is exhausted.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A snapshot or status write failed. Fatal for the current
    /// operation; the job is marked FAILED.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
