//! Submission orchestration
//!
//! This module ties the stages together: validate a claim against its own
//! trace, account it in the global counters, then fold it into the user's
//! aggregate under a per-user optimistic-concurrency discipline.
//!
//! Two concurrent submissions for the same user never interleave their
//! read-modify-write: a stale write fails the store's version check and the
//! aggregation is re-read and reapplied, a bounded number of times. Global
//! counters carry no derived invariant and are applied as plain increments;
//! they may transiently disagree with any single user's counters.

use uuid::Uuid;

use crate::aggregate::UserStatistics;
use crate::error::{EngineError, StoreError};
use crate::leaderboard;
use crate::store::StatsStore;
use crate::types::{GlobalIncrement, GlobalStatistics, LeaderboardEntry, StatsView, SubmissionClaim};
use crate::validator;

/// Default number of re-reads after a version conflict before the
/// submission is surfaced as a transient failure.
pub const DEFAULT_CONFLICT_RETRIES: usize = 3;

/// Engine for validating typing-test submissions and aggregating statistics.
///
/// All operations are bounded by a small constant number of store
/// round-trips; nothing here is long-running or needs cancellation.
pub struct SubmissionEngine<S: StatsStore> {
    store: S,
    conflict_retries: usize,
}

impl<S: StatsStore> SubmissionEngine<S> {
    /// Create an engine with the default conflict-retry budget.
    pub fn new(store: S) -> Self {
        Self::with_conflict_retries(store, DEFAULT_CONFLICT_RETRIES)
    }

    /// Create an engine with a specific conflict-retry budget.
    pub fn with_conflict_retries(store: S, conflict_retries: usize) -> Self {
        Self {
            store,
            conflict_retries,
        }
    }

    /// Create a zeroed statistics aggregate for a new user. Idempotent.
    pub fn register_user(&self, user_id: &str) -> Result<(), EngineError> {
        self.store.create_user(user_id)?;
        Ok(())
    }

    /// Submit a typing-test result.
    ///
    /// The claim is validated before any store write; on rejection no
    /// statistics mutation occurs. On acceptance the global counters are
    /// incremented and the result is folded into the user's aggregate,
    /// retrying on write conflicts. Returns the fresh statistics view so
    /// callers can report derived stats without a second read.
    pub fn submit_result(&self, claim: &SubmissionClaim) -> Result<StatsView, EngineError> {
        let submission_id = Uuid::new_v4();

        let accepted = match validator::validate(claim) {
            Ok(accepted) => accepted,
            Err(reason) => {
                log::debug!(
                    "submission {} for user {} rejected: {}",
                    submission_id,
                    claim.user_id,
                    reason
                );
                return Err(EngineError::Rejected(reason));
            }
        };

        self.store
            .apply_global(GlobalIncrement::test_taken(accepted.time_spent_seconds))?;

        let completed_at = chrono::Utc::now();
        let stats = self.mutate_user(&claim.user_id, |stats| {
            stats.apply_result(&accepted, accepted.time_spent_seconds, completed_at);
        })?;

        log::debug!(
            "submission {} accepted for user {}: {} wpm ({} raw)",
            submission_id,
            claim.user_id,
            accepted.wpm,
            accepted.raw_wpm
        );
        Ok(stats.view())
    }

    /// Record a test-start notification for a user.
    ///
    /// A separate, unvalidated event: it increments the global and per-user
    /// started counters and nothing else.
    pub fn record_test_started(&self, user_id: &str) -> Result<(), EngineError> {
        self.store.apply_global(GlobalIncrement::test_started())?;
        self.mutate_user(user_id, UserStatistics::record_test_started)?;
        Ok(())
    }

    /// Read a user's statistics view (profile read path).
    pub fn user_stats(&self, user_id: &str) -> Result<StatsView, EngineError> {
        let entry = self
            .store
            .load_user(user_id)?
            .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))?;
        Ok(entry.stats.view())
    }

    /// Read the process-wide counters.
    pub fn global_stats(&self) -> Result<GlobalStatistics, EngineError> {
        Ok(self.store.load_global()?)
    }

    /// Top `limit` users by personal-best net WPM. Read-only.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let ranked = self.store.top_users_by_best_wpm(limit)?;
        Ok(leaderboard::project(&ranked))
    }

    /// Read-modify-write a user's aggregate under the store's version
    /// check, re-reading on conflict up to the retry budget.
    fn mutate_user<F>(&self, user_id: &str, mutate: F) -> Result<UserStatistics, EngineError>
    where
        F: Fn(&mut UserStatistics),
    {
        let attempts = self.conflict_retries + 1;
        for attempt in 0..attempts {
            let entry = self
                .store
                .load_user(user_id)?
                .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))?;

            let mut stats = entry.stats;
            mutate(&mut stats);

            match self.store.store_user(user_id, entry.version, stats.clone()) {
                Ok(()) => return Ok(stats),
                Err(StoreError::VersionConflict) => {
                    log::debug!(
                        "version conflict for user {} (attempt {}/{})",
                        user_id,
                        attempt + 1,
                        attempts
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        log::warn!(
            "aggregation for user {} exhausted {} attempts",
            user_id,
            attempts
        );
        Err(EngineError::ConflictRetriesExhausted {
            user_id: user_id.to_string(),
            attempts,
        })
    }
}
