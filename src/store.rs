//! Storage boundary
//!
//! The engine depends only on an abstract per-user record store, not on any
//! particular storage technology. Any store offering
//! atomic per-document update (or an equivalent transactional
//! read-modify-write) can implement [`StatsStore`].
//!
//! Per-user writes use optimistic concurrency: every aggregate carries a
//! version, and [`StatsStore::store_user`] only succeeds when the caller
//! read the version it is replacing. Global counters need only atomic
//! increment semantics, expressed here as an upsert of a delta.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::aggregate::UserStatistics;
use crate::error::StoreError;
use crate::types::{BestRecord, GlobalIncrement, GlobalStatistics};

/// A user aggregate together with its storage version.
#[derive(Debug, Clone)]
pub struct VersionedStats {
    /// Incremented by the store on every successful write
    pub version: u64,
    pub stats: UserStatistics,
}

/// A user's id and personal best, as returned by the leaderboard query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedUser {
    pub user_id: String,
    pub best: BestRecord,
}

/// Abstract per-user record store consumed by the engine.
pub trait StatsStore: Send + Sync {
    /// Load a user's aggregate, or `None` if the user does not exist.
    fn load_user(&self, user_id: &str) -> Result<Option<VersionedStats>, StoreError>;

    /// Create a zeroed aggregate for a new user. Idempotent: an existing
    /// aggregate is left untouched.
    fn create_user(&self, user_id: &str) -> Result<(), StoreError>;

    /// Replace a user's aggregate, conditional on `expected_version` still
    /// being current. Fails with [`StoreError::VersionConflict`] when a
    /// concurrent writer got there first (or the user vanished since the
    /// read) — the caller re-reads and reapplies its mutation.
    fn store_user(
        &self,
        user_id: &str,
        expected_version: u64,
        stats: UserStatistics,
    ) -> Result<(), StoreError>;

    /// Apply an increment to the global counters, creating the singleton
    /// record on first use.
    fn apply_global(&self, inc: GlobalIncrement) -> Result<(), StoreError>;

    /// Read the global counters.
    fn load_global(&self) -> Result<GlobalStatistics, StoreError>;

    /// Up to `limit` users holding a personal best, ranked by descending
    /// best net WPM with ties broken by ascending user id. Only users with
    /// a non-empty result window qualify.
    fn top_users_by_best_wpm(&self, limit: usize) -> Result<Vec<RankedUser>, StoreError>;
}

/// In-memory [`StatsStore`] used as the reference implementation and test
/// harness. Versions are enforced under a single writer lock, which makes
/// the compare-and-swap trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, VersionedStats>>,
    global: Mutex<GlobalStatistics>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl std::fmt::Debug) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

impl StatsStore for MemoryStore {
    fn load_user(&self, user_id: &str) -> Result<Option<VersionedStats>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(user_id).cloned())
    }

    fn create_user(&self, user_id: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        users.entry(user_id.to_string()).or_insert(VersionedStats {
            version: 0,
            stats: UserStatistics::default(),
        });
        Ok(())
    }

    fn store_user(
        &self,
        user_id: &str,
        expected_version: u64,
        stats: UserStatistics,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        match users.get_mut(user_id) {
            Some(entry) if entry.version == expected_version => {
                entry.version += 1;
                entry.stats = stats;
                Ok(())
            }
            _ => Err(StoreError::VersionConflict),
        }
    }

    fn apply_global(&self, inc: GlobalIncrement) -> Result<(), StoreError> {
        let mut global = self.global.lock().map_err(poisoned)?;
        global.apply(inc);
        Ok(())
    }

    fn load_global(&self) -> Result<GlobalStatistics, StoreError> {
        let global = self.global.lock().map_err(poisoned)?;
        Ok(*global)
    }

    fn top_users_by_best_wpm(&self, limit: usize) -> Result<Vec<RankedUser>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;

        let mut ranked: Vec<RankedUser> = users
            .iter()
            .filter(|(_, entry)| !entry.stats.results.is_empty())
            .filter_map(|(user_id, entry)| {
                entry.stats.best.map(|best| RankedUser {
                    user_id: user_id.clone(),
                    best,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.best
                .wpm
                .cmp(&a.best.wpm)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AcceptedResult;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn result(wpm: u32) -> AcceptedResult {
        AcceptedResult {
            wpm,
            raw_wpm: wpm + 1,
            accuracy: 95.0,
            test_type: "time-30".to_string(),
            elapsed_seconds: 30.0,
            time_spent_seconds: 30.0,
        }
    }

    fn seed_user(store: &MemoryStore, user_id: &str, wpm: u32) {
        store.create_user(user_id).unwrap();
        let entry = store.load_user(user_id).unwrap().unwrap();
        let mut stats = entry.stats;
        stats.apply_result(&result(wpm), 30.0, Utc::now());
        store.store_user(user_id, entry.version, stats).unwrap();
    }

    #[test]
    fn create_user_is_idempotent() {
        let store = MemoryStore::new();
        seed_user(&store, "alice", 60);
        store.create_user("alice").unwrap();

        let entry = store.load_user("alice").unwrap().unwrap();
        assert_eq!(entry.stats.tests_completed, 1);
    }

    #[test]
    fn missing_user_loads_as_none() {
        let store = MemoryStore::new();
        assert!(store.load_user("nobody").unwrap().is_none());
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let store = MemoryStore::new();
        store.create_user("alice").unwrap();

        let first = store.load_user("alice").unwrap().unwrap();
        let second = store.load_user("alice").unwrap().unwrap();

        let mut stats = first.stats;
        stats.apply_result(&result(50), 30.0, Utc::now());
        store.store_user("alice", first.version, stats).unwrap();

        let mut stats = second.stats;
        stats.apply_result(&result(55), 30.0, Utc::now());
        let err = store
            .store_user("alice", second.version, stats)
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));
    }

    #[test]
    fn storing_to_a_missing_user_is_a_conflict() {
        let store = MemoryStore::new();
        let err = store
            .store_user("ghost", 0, UserStatistics::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));
    }

    #[test]
    fn global_upsert_accumulates() {
        let store = MemoryStore::new();
        assert_eq!(store.load_global().unwrap(), GlobalStatistics::default());

        store.apply_global(GlobalIncrement::test_started()).unwrap();
        store.apply_global(GlobalIncrement::test_taken(30.0)).unwrap();
        store.apply_global(GlobalIncrement::test_taken(45.0)).unwrap();

        let global = store.load_global().unwrap();
        assert_eq!(global.total_tests_started, 1);
        assert_eq!(global.total_tests_taken, 2);
        assert_eq!(global.total_typing_time_seconds, 75.0);
    }

    #[test]
    fn top_query_ranks_by_best_wpm_then_user_id() {
        let store = MemoryStore::new();
        seed_user(&store, "carol", 80);
        seed_user(&store, "alice", 95);
        seed_user(&store, "bob", 80);
        store.create_user("dave").unwrap(); // no results, excluded

        let ranked = store.top_users_by_best_wpm(10).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn top_query_honors_the_limit() {
        let store = MemoryStore::new();
        for (i, wpm) in [60, 70, 80, 90].iter().enumerate() {
            seed_user(&store, &format!("user-{i}"), *wpm);
        }
        let ranked = store.top_users_by_best_wpm(2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].best.wpm, 90);
        assert_eq!(ranked[1].best.wpm, 80);
    }
}
