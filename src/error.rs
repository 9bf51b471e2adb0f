//! Error types for the typerank engine

use thiserror::Error;

use crate::validator::RejectReason;

/// Errors surfaced by the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The aggregate changed between read and write; the caller may re-read
    /// and reapply its mutation.
    #[error("version conflict on concurrent update")]
    VersionConflict,

    /// The backing store could not be reached. Transient; the engine does
    /// not retry this internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while processing a submission.
///
/// Nothing here is fatal to the process; every failure is scoped to a
/// single submission.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The claim failed validation. Expected and user-attributable; no
    /// statistics mutation has occurred. The reason is for diagnostics —
    /// callers should surface a generic rejection to the end user.
    #[error("submission rejected: {0}")]
    Rejected(RejectReason),

    /// The user does not exist. Callers must verify existence before
    /// submitting results.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Per-user aggregation kept losing the optimistic-concurrency race.
    /// Transient; the caller may retry the whole submission.
    #[error("aggregation for user {user_id} conflicted {attempts} times")]
    ConflictRetriesExhausted { user_id: String, attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}
