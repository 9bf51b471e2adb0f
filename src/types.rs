//! Core types for the typerank engine
//!
//! This module defines the data structures that flow through each stage of a
//! submission: the raw keystroke trace, the client claim, the validated
//! result, the persisted records, and the read-side views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single keystroke sample from the client-side trace.
///
/// Samples are ordered; insertion order is temporal order. Duplicate samples
/// (double key events) are legal and counted individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystrokeSample {
    /// Milliseconds since test start (monotonic per the client's clock)
    pub timestamp_ms: u64,
    /// Whether the keystroke matched the expected character
    pub correct: bool,
}

/// A client-submitted performance claim.
///
/// Transient: exists only for the duration of one validation call and is
/// never persisted as-is. The claimed figures are treated as assertions to
/// be corroborated against the keystroke trace, never as ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionClaim {
    /// Already-authenticated user identifier
    pub user_id: String,
    /// Test variant identifier (e.g. "words-50", "time-30")
    pub test_type: String,
    /// Elapsed test duration in seconds, as used for scoring
    pub elapsed_seconds: f64,
    /// Wall-clock time the user spent on the test, for accounting.
    /// Usually equal to `elapsed_seconds` but threaded separately.
    pub time_spent_seconds: f64,
    /// Client-computed net words per minute
    pub claimed_wpm: f64,
    /// Client-computed raw words per minute
    pub claimed_raw_wpm: f64,
    /// Client-computed accuracy percentage (0-100)
    pub accuracy: f64,
    /// Raw keystroke trace the claim is judged against
    pub keystrokes: Vec<KeystrokeSample>,
}

/// Server-recomputed scores for a keystroke trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    /// Net words per minute (correct keystrokes only)
    pub wpm: u32,
    /// Raw words per minute (every keystroke, correct or not)
    pub raw_wpm: u32,
}

/// A claim that passed validation.
///
/// Carries the server-recomputed scores, not the client's claimed figures;
/// only the recomputed values are ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedResult {
    /// Recomputed net words per minute
    pub wpm: u32,
    /// Recomputed raw words per minute
    pub raw_wpm: u32,
    /// Accuracy percentage (0-100)
    pub accuracy: f64,
    /// Test variant identifier
    pub test_type: String,
    /// Elapsed test duration in seconds
    pub elapsed_seconds: f64,
    /// Time spent on the test in seconds (accounting figure)
    pub time_spent_seconds: f64,
}

/// One accepted result as retained in a user's rolling window.
///
/// Immutable once created; owned by exactly one user's statistics aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRecord {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: f64,
    pub test_type: String,
    pub elapsed_seconds: f64,
    /// When the result was accepted by the server
    pub completed_at: DateTime<Utc>,
}

/// A user's personal-best record: the highest net-WPM result ever accepted.
///
/// Monotonic non-decreasing in `wpm`; ties keep the earlier record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestRecord {
    pub wpm: u32,
    pub accuracy: f64,
    pub elapsed_seconds: f64,
}

/// Process-wide counters across all users.
///
/// Each field is individually monotonic; no consistency is guaranteed
/// between these and any single user's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub total_tests_started: u64,
    pub total_tests_taken: u64,
    pub total_typing_time_seconds: f64,
}

/// An increment to apply to the global counters (upsert semantics).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalIncrement {
    pub tests_started: u64,
    pub tests_taken: u64,
    pub typing_time_seconds: f64,
}

impl GlobalIncrement {
    /// Increment for a test-start notification.
    pub fn test_started() -> Self {
        Self {
            tests_started: 1,
            ..Default::default()
        }
    }

    /// Increment for an accepted test, accounting the time spent.
    pub fn test_taken(time_spent_seconds: f64) -> Self {
        Self {
            tests_taken: 1,
            typing_time_seconds: time_spent_seconds,
            ..Default::default()
        }
    }
}

impl GlobalStatistics {
    /// Apply an increment in place.
    pub fn apply(&mut self, inc: GlobalIncrement) {
        self.total_tests_started += inc.tests_started;
        self.total_tests_taken += inc.tests_taken;
        self.total_typing_time_seconds += inc.typing_time_seconds;
    }
}

/// Public-facing snapshot of a user's statistics.
///
/// Counters are stored values; the averages, recent window and completed
/// test types are derived on read from the retained results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsView {
    pub tests_started: u64,
    pub tests_completed: u64,
    pub total_time_typing_seconds: f64,
    /// Personal best, if any result has been accepted
    pub highest_wpm_record: Option<BestRecord>,
    /// Mean net WPM over the last 10 retained results, rounded
    pub average_wpm: u32,
    /// Mean accuracy over all retained results, rounded to 2 decimals
    pub average_accuracy: f64,
    /// Last 20 retained results, oldest first
    pub recent_tests: Vec<TestResultRecord>,
    /// Distinct test types present in the retained results
    pub completed_test_types: Vec<String>,
}

/// One row of the leaderboard projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position within the returned page
    pub rank: usize,
    /// Truncated form of the user identifier (first 5 characters)
    pub display_name: String,
    /// Personal-best net WPM
    pub wpm: u32,
    /// Accuracy of the personal-best result
    pub accuracy: f64,
}
