//! Leaderboard projection
//!
//! Read-only view over the store's ranked-user query. Ranks are 1-based
//! positions within the returned page, not global ranks, and display names
//! are truncated user identifiers — a privacy measure, not a uniqueness
//! guarantee.

use crate::store::RankedUser;
use crate::types::LeaderboardEntry;

/// Characters of the user id exposed on the leaderboard.
pub const DISPLAY_NAME_LEN: usize = 5;

/// Project ranked users into leaderboard rows.
///
/// The input is assumed already ordered and limited by the store query
/// (descending best WPM, ties by ascending user id).
pub fn project(ranked: &[RankedUser]) -> Vec<LeaderboardEntry> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, user)| LeaderboardEntry {
            rank: i + 1,
            display_name: truncate_name(&user.user_id),
            wpm: user.best.wpm,
            accuracy: user.best.accuracy,
        })
        .collect()
}

/// First [`DISPLAY_NAME_LEN`] characters of an identifier, respecting char
/// boundaries.
fn truncate_name(user_id: &str) -> String {
    user_id.chars().take(DISPLAY_NAME_LEN).collect()
}
