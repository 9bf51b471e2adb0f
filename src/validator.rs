//! Submission validation
//!
//! This module decides whether a client's performance claim is trustworthy.
//! Two independent checks must both pass: the claimed scores must agree with
//! the server's recomputation within a small tolerance, and the claimed
//! elapsed time must agree with the span of the keystroke trace itself.
//!
//! Validation is a pure function of the claim: the same invalid claim
//! always yields the same rejection reason.

use serde::Serialize;
use thiserror::Error;

use crate::scoring;
use crate::types::{AcceptedResult, SubmissionClaim};

/// Allowed divergence between claimed and recomputed WPM figures.
///
/// Absorbs integer-rounding drift between client and server timing, not
/// gross manipulation.
pub const WPM_TOLERANCE: f64 = 2.0;

/// Allowed divergence between the claimed elapsed time and the elapsed time
/// implied by the final keystroke sample, in seconds.
pub const ELAPSED_TOLERANCE_SECONDS: f64 = 2.0;

/// Why a claim was rejected.
///
/// Distinguishable internally for diagnostics and telemetry; end users see
/// only a generic rejection.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// A claimed score is negative, non-finite, or non-integer.
    #[error("claimed {field} is not a non-negative integer: {value}")]
    MalformedClaim { field: &'static str, value: f64 },

    /// A zero-keystroke submission is never valid.
    #[error("keystroke trace is empty")]
    EmptyTrace,

    /// Elapsed time must be a positive finite number to score.
    #[error("elapsed time is not a positive number: {elapsed_seconds}")]
    InvalidElapsed { elapsed_seconds: f64 },

    /// Claimed scores diverge from the recomputation beyond tolerance.
    #[error(
        "claimed {claimed_wpm}/{claimed_raw_wpm} wpm diverges from recomputed {wpm}/{raw_wpm}"
    )]
    ScoreMismatch {
        claimed_wpm: f64,
        claimed_raw_wpm: f64,
        wpm: u32,
        raw_wpm: u32,
    },

    /// Claimed duration is inconsistent with the trace's own final sample.
    #[error("claimed elapsed {claimed_seconds}s but trace spans {trace_seconds}s")]
    ElapsedMismatch {
        claimed_seconds: f64,
        trace_seconds: f64,
    },
}

/// Validate a submission claim against its own keystroke trace.
///
/// On acceptance the returned result carries the server-recomputed WPM
/// figures together with the claim's accuracy, test type and timing fields.
/// Callers must not apply any statistics mutation on rejection.
pub fn validate(claim: &SubmissionClaim) -> Result<AcceptedResult, RejectReason> {
    check_claimed_figure("wpm", claim.claimed_wpm)?;
    check_claimed_figure("raw wpm", claim.claimed_raw_wpm)?;

    let last = match claim.keystrokes.last() {
        Some(sample) => sample,
        None => return Err(RejectReason::EmptyTrace),
    };

    let scores = scoring::recompute(&claim.keystrokes, claim.elapsed_seconds).ok_or(
        RejectReason::InvalidElapsed {
            elapsed_seconds: claim.elapsed_seconds,
        },
    )?;

    if (scores.wpm as f64 - claim.claimed_wpm).abs() > WPM_TOLERANCE
        || (scores.raw_wpm as f64 - claim.claimed_raw_wpm).abs() > WPM_TOLERANCE
    {
        return Err(RejectReason::ScoreMismatch {
            claimed_wpm: claim.claimed_wpm,
            claimed_raw_wpm: claim.claimed_raw_wpm,
            wpm: scores.wpm,
            raw_wpm: scores.raw_wpm,
        });
    }

    // The cross-check reads only the final sample; full monotonicity is not
    // enforced, matching the upstream behavior. Flag it for telemetry as a
    // hardening extension point.
    if !is_monotonic(&claim.keystrokes) {
        log::debug!(
            "non-monotonic keystroke trace for user {} ({} samples)",
            claim.user_id,
            claim.keystrokes.len()
        );
    }

    let trace_seconds = (last.timestamp_ms as f64 / 1000.0).round();
    if (claim.elapsed_seconds - trace_seconds).abs() > ELAPSED_TOLERANCE_SECONDS {
        return Err(RejectReason::ElapsedMismatch {
            claimed_seconds: claim.elapsed_seconds,
            trace_seconds,
        });
    }

    Ok(AcceptedResult {
        wpm: scores.wpm,
        raw_wpm: scores.raw_wpm,
        accuracy: claim.accuracy,
        test_type: claim.test_type.clone(),
        elapsed_seconds: claim.elapsed_seconds,
        time_spent_seconds: claim.time_spent_seconds,
    })
}

fn check_claimed_figure(field: &'static str, value: f64) -> Result<(), RejectReason> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(RejectReason::MalformedClaim { field, value });
    }
    Ok(())
}

fn is_monotonic(keystrokes: &[crate::types::KeystrokeSample]) -> bool {
    keystrokes
        .windows(2)
        .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms)
}
