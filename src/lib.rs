//! Typerank - result-validation and statistics-aggregation engine for
//! typing-speed tests
//!
//! A client measures keystrokes and reports a performance claim (net WPM,
//! raw WPM, accuracy). Typerank never trusts the claim: it recomputes the
//! score from the raw keystroke trace, cross-checks the reported duration
//! against the trace's own span, and only then folds the result into the
//! user's rolling statistics — lifetime counters, a bounded window of recent
//! results, and the personal-best record that feeds the leaderboard.
//!
//! ## Modules
//!
//! - **scoring**: pure WPM recomputation from a keystroke trace
//! - **validator**: claim acceptance/rejection with diagnosable reasons
//! - **aggregate**: per-user rolling statistics with bounded retention
//! - **store**: abstract storage boundary with optimistic concurrency
//! - **engine**: submission orchestration and read paths
//! - **leaderboard**: read-only top-N projection

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod scoring;
pub mod store;
pub mod types;
pub mod validator;

pub use aggregate::UserStatistics;
pub use engine::SubmissionEngine;
pub use error::{EngineError, StoreError};
pub use store::{MemoryStore, StatsStore};
pub use types::{
    GlobalStatistics, KeystrokeSample, LeaderboardEntry, StatsView, SubmissionClaim,
};
pub use validator::RejectReason;

/// Engine version reported in diagnostics
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
