//! Score recomputation
//!
//! This module independently recomputes typing scores from a raw keystroke
//! trace. It is the server's ground truth: client-claimed figures are only
//! ever compared against the output of [`recompute`], never trusted.

use crate::types::{KeystrokeSample, Scores};

/// Characters per word for WPM arithmetic. The "one word is five
/// characters" convention is a fixed domain constant, not configurable.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Recompute net and raw WPM from a keystroke trace.
///
/// Returns `None` when the trace is empty or `elapsed_seconds` is not a
/// positive finite number — a zero-keystroke or zero-length test never
/// scores.
///
/// Net WPM counts only correct keystrokes; raw WPM counts every keystroke,
/// correct or not. Both are rounded to the nearest integer.
pub fn recompute(keystrokes: &[KeystrokeSample], elapsed_seconds: f64) -> Option<Scores> {
    if keystrokes.is_empty() || !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return None;
    }

    let elapsed_minutes = elapsed_seconds / 60.0;

    let total = keystrokes.len() as f64;
    let raw_wpm = ((total / CHARS_PER_WORD) / elapsed_minutes).round() as u32;

    let correct = keystrokes.iter().filter(|k| k.correct).count() as f64;
    let wpm = ((correct / CHARS_PER_WORD) / elapsed_minutes).round() as u32;

    Some(Scores { wpm, raw_wpm })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trace(total: usize, correct: usize) -> Vec<KeystrokeSample> {
        (0..total)
            .map(|i| KeystrokeSample {
                timestamp_ms: (i as u64 + 1) * 100,
                correct: i < correct,
            })
            .collect()
    }

    #[test]
    fn fifty_keystrokes_forty_five_correct_over_thirty_seconds() {
        let scores = recompute(&trace(50, 45), 30.0).unwrap();
        // (50/5)/0.5 = 20, (45/5)/0.5 = 18
        assert_eq!(scores.raw_wpm, 20);
        assert_eq!(scores.wpm, 18);
    }

    #[test]
    fn raw_wpm_never_below_net_wpm() {
        for correct in 0..=40 {
            let scores = recompute(&trace(40, correct), 17.0).unwrap();
            assert!(scores.raw_wpm >= scores.wpm);
        }
    }

    #[test]
    fn all_correct_means_raw_equals_net() {
        let scores = recompute(&trace(60, 60), 45.0).unwrap();
        assert_eq!(scores.raw_wpm, scores.wpm);
    }

    #[test]
    fn empty_trace_never_scores() {
        assert_eq!(recompute(&[], 30.0), None);
        assert_eq!(recompute(&[], 0.001), None);
    }

    #[test]
    fn non_positive_or_non_finite_elapsed_never_scores() {
        let t = trace(10, 10);
        assert_eq!(recompute(&t, 0.0), None);
        assert_eq!(recompute(&t, -5.0), None);
        assert_eq!(recompute(&t, f64::NAN), None);
        assert_eq!(recompute(&t, f64::INFINITY), None);
    }

    #[test]
    fn duplicate_samples_count_individually() {
        let mut t = trace(10, 10);
        let dup = t[9];
        t.push(dup);
        let scores = recompute(&t, 60.0).unwrap();
        assert_eq!(scores.raw_wpm, 2); // 11/5 rounded over one minute
    }
}
