//! Per-user statistics aggregation
//!
//! This module maintains a user's rolling performance record: lifetime
//! counters, a bounded window of recent results, and the personal-best
//! record. All derived figures (averages, recency slices) are computed on
//! read from the retained window.

use crate::types::{AcceptedResult, BestRecord, StatsView, TestResultRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum retained results per user. Older results are evicted first;
/// counters and the best record still reflect the full history.
pub const RESULT_WINDOW_CAPACITY: usize = 100;

/// Window used for the rolling average WPM figure.
pub const AVERAGE_WPM_WINDOW: usize = 10;

/// Number of results exposed as "recent tests".
pub const RECENT_TESTS_WINDOW: usize = 20;

/// Bounded window of accepted results, oldest evicted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultWindow {
    results: VecDeque<TestResultRecord>,
    capacity: usize,
}

impl Default for ResultWindow {
    fn default() -> Self {
        Self::new(RESULT_WINDOW_CAPACITY)
    }
}

impl ResultWindow {
    /// Create a window with the given capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            results: VecDeque::with_capacity(capacity.min(RESULT_WINDOW_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Append a record, evicting from the front while over capacity.
    pub fn push(&mut self, record: TestResultRecord) {
        self.results.push_back(record);
        while self.results.len() > self.capacity {
            self.results.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TestResultRecord> {
        self.results.iter()
    }

    /// The last `n` records, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<TestResultRecord> {
        let skip = self.results.len().saturating_sub(n);
        self.results.iter().skip(skip).cloned().collect()
    }
}

/// A user's persisted statistics aggregate.
///
/// Created zeroed when the account is created and mutated only through
/// [`UserStatistics::apply_result`] and [`UserStatistics::record_test_started`],
/// which preserve the invariants: counters never decrease, the window never
/// exceeds its capacity, and the best record dominates every retained WPM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStatistics {
    /// Test-start notifications received (unvalidated events)
    pub tests_started: u64,
    /// Accepted submissions folded in
    pub tests_completed: u64,
    /// Accumulated time spent typing, in seconds
    pub total_time_typing_seconds: f64,
    /// Bounded window of recent accepted results
    pub results: ResultWindow,
    /// Personal best, if any result has been accepted
    pub best: Option<BestRecord>,
}

impl UserStatistics {
    /// Fold an accepted result into the aggregate.
    ///
    /// `time_spent_seconds` is the accounting figure, distinct from the
    /// `elapsed_seconds` used for scoring; callers thread both through.
    /// The best record is replaced only on a strictly greater WPM, so ties
    /// keep the earlier record.
    pub fn apply_result(
        &mut self,
        accepted: &AcceptedResult,
        time_spent_seconds: f64,
        completed_at: DateTime<Utc>,
    ) {
        self.tests_completed += 1;
        self.total_time_typing_seconds += time_spent_seconds;

        self.results.push(TestResultRecord {
            wpm: accepted.wpm,
            raw_wpm: accepted.raw_wpm,
            accuracy: accepted.accuracy,
            test_type: accepted.test_type.clone(),
            elapsed_seconds: accepted.elapsed_seconds,
            completed_at,
        });

        let beats_best = self.best.map_or(true, |best| accepted.wpm > best.wpm);
        if beats_best {
            self.best = Some(BestRecord {
                wpm: accepted.wpm,
                accuracy: accepted.accuracy,
                elapsed_seconds: accepted.elapsed_seconds,
            });
        }
    }

    /// Record a test-start notification. Unvalidated; no trace accompanies it.
    pub fn record_test_started(&mut self) {
        self.tests_started += 1;
    }

    /// Mean net WPM over the last [`AVERAGE_WPM_WINDOW`] results, rounded.
    /// Zero when no results are retained.
    pub fn average_wpm(&self) -> u32 {
        let recent = self.results.last_n(AVERAGE_WPM_WINDOW);
        if recent.is_empty() {
            return 0;
        }
        let sum: u64 = recent.iter().map(|r| r.wpm as u64).sum();
        ((sum as f64) / (recent.len() as f64)).round() as u32
    }

    /// Mean accuracy over all retained results, rounded to 2 decimals.
    /// Zero when no results are retained.
    pub fn average_accuracy(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.results.iter().map(|r| r.accuracy).sum();
        let mean = sum / self.results.len() as f64;
        (mean * 100.0).round() / 100.0
    }

    /// The last [`RECENT_TESTS_WINDOW`] results, oldest first.
    pub fn recent_tests(&self) -> Vec<TestResultRecord> {
        self.results.last_n(RECENT_TESTS_WINDOW)
    }

    /// Distinct test types present in the retained results, in first-seen
    /// order.
    pub fn completed_test_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for record in self.results.iter() {
            if !types.iter().any(|t| t == &record.test_type) {
                types.push(record.test_type.clone());
            }
        }
        types
    }

    /// Snapshot the aggregate as a public-facing view.
    pub fn view(&self) -> StatsView {
        StatsView {
            tests_started: self.tests_started,
            tests_completed: self.tests_completed,
            total_time_typing_seconds: self.total_time_typing_seconds,
            highest_wpm_record: self.best,
            average_wpm: self.average_wpm(),
            average_accuracy: self.average_accuracy(),
            recent_tests: self.recent_tests(),
            completed_test_types: self.completed_test_types(),
        }
    }

    /// Load an aggregate from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the aggregate to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn accepted(wpm: u32, accuracy: f64) -> AcceptedResult {
        AcceptedResult {
            wpm,
            raw_wpm: wpm + 2,
            accuracy,
            test_type: "time-30".to_string(),
            elapsed_seconds: 30.0,
            time_spent_seconds: 30.0,
        }
    }

    fn apply(stats: &mut UserStatistics, result: &AcceptedResult) {
        stats.apply_result(result, result.time_spent_seconds, Utc::now());
    }

    #[test]
    fn counters_increase_by_exactly_one_per_result() {
        let mut stats = UserStatistics::default();
        for i in 0..25 {
            apply(&mut stats, &accepted(40 + i, 95.0));
            assert_eq!(stats.tests_completed, (i + 1) as u64);
        }
        assert_eq!(stats.total_time_typing_seconds, 25.0 * 30.0);
    }

    #[test]
    fn window_retains_exactly_the_last_hundred() {
        let mut stats = UserStatistics::default();
        for i in 0..150u32 {
            apply(&mut stats, &accepted(i, 95.0));
        }
        assert_eq!(stats.results.len(), RESULT_WINDOW_CAPACITY);
        assert_eq!(stats.tests_completed, 150);

        // Contents are the last 100 results in submission order.
        let wpms: Vec<u32> = stats.results.iter().map(|r| r.wpm).collect();
        let expected: Vec<u32> = (50..150).collect();
        assert_eq!(wpms, expected);
    }

    #[test]
    fn best_record_tracks_the_maximum() {
        let mut stats = UserStatistics::default();
        apply(&mut stats, &accepted(50, 97.0));
        assert_eq!(stats.best.unwrap().wpm, 50);

        // Lower result leaves the record unchanged.
        apply(&mut stats, &accepted(40, 99.0));
        let best = stats.best.unwrap();
        assert_eq!(best.wpm, 50);
        assert_eq!(best.accuracy, 97.0);

        // Higher result replaces it.
        apply(&mut stats, &accepted(60, 92.0));
        let best = stats.best.unwrap();
        assert_eq!(best.wpm, 60);
        assert_eq!(best.accuracy, 92.0);
    }

    #[test]
    fn best_record_tie_keeps_the_earlier_result() {
        let mut stats = UserStatistics::default();
        apply(&mut stats, &accepted(55, 90.0));
        apply(&mut stats, &accepted(55, 99.0));
        assert_eq!(stats.best.unwrap().accuracy, 90.0);
    }

    #[test]
    fn best_dominates_every_retained_wpm() {
        let mut stats = UserStatistics::default();
        for wpm in [30, 80, 45, 80, 12, 79] {
            apply(&mut stats, &accepted(wpm, 95.0));
            let best = stats.best.unwrap().wpm;
            assert!(stats.results.iter().all(|r| r.wpm <= best));
        }
    }

    #[test]
    fn average_wpm_uses_the_last_ten() {
        let mut stats = UserStatistics::default();
        assert_eq!(stats.average_wpm(), 0);

        for wpm in 1..=15u32 {
            apply(&mut stats, &accepted(wpm, 95.0));
        }
        // Mean of 6..=15 is 10.5, rounded to 11.
        assert_eq!(stats.average_wpm(), 11);
    }

    #[test]
    fn average_accuracy_spans_all_retained_and_rounds() {
        let mut stats = UserStatistics::default();
        assert_eq!(stats.average_accuracy(), 0.0);

        apply(&mut stats, &accepted(40, 90.0));
        apply(&mut stats, &accepted(40, 95.0));
        apply(&mut stats, &accepted(40, 97.0));
        // (90 + 95 + 97) / 3 = 94.0, exact after rounding
        assert_eq!(stats.average_accuracy(), 94.0);

        apply(&mut stats, &accepted(40, 92.0));
        // 374 / 4 = 93.5
        assert_eq!(stats.average_accuracy(), 93.5);
    }

    #[test]
    fn recent_tests_exposes_the_last_twenty_in_order() {
        let mut stats = UserStatistics::default();
        for wpm in 0..30u32 {
            apply(&mut stats, &accepted(wpm, 95.0));
        }
        let recent = stats.recent_tests();
        assert_eq!(recent.len(), RECENT_TESTS_WINDOW);
        assert_eq!(recent.first().unwrap().wpm, 10);
        assert_eq!(recent.last().unwrap().wpm, 29);
    }

    #[test]
    fn completed_test_types_are_distinct_in_first_seen_order() {
        let mut stats = UserStatistics::default();
        for test_type in ["time-30", "words-50", "time-30", "quote"] {
            let mut result = accepted(40, 95.0);
            result.test_type = test_type.to_string();
            apply(&mut stats, &result);
        }
        assert_eq!(
            stats.completed_test_types(),
            vec!["time-30", "words-50", "quote"]
        );
    }

    #[test]
    fn test_started_counter_is_independent() {
        let mut stats = UserStatistics::default();
        stats.record_test_started();
        stats.record_test_started();
        assert_eq!(stats.tests_started, 2);
        assert_eq!(stats.tests_completed, 0);
    }

    #[test]
    fn json_round_trip_preserves_the_window() {
        let mut stats = UserStatistics::default();
        for wpm in 0..5u32 {
            apply(&mut stats, &accepted(wpm, 95.0));
        }

        let json = stats.to_json().unwrap();
        let loaded = UserStatistics::from_json(&json).unwrap();

        assert_eq!(loaded.tests_completed, stats.tests_completed);
        assert_eq!(loaded.results.len(), stats.results.len());
        assert_eq!(loaded.best, stats.best);
        assert_eq!(loaded.average_wpm(), stats.average_wpm());
    }
}
