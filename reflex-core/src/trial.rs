use serde::{Deserialize, Serialize};

/// How a trial concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialOutcome {
    Hit,
    Miss,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    /// 1-based position in the session.
    pub trial_number: usize,
    pub outcome: TrialOutcome,
    /// Elapsed time from stimulus to response. A miss carries the response timeout.
    pub reaction_time_ms: u64,
    /// Session clock time of the response or timeout.
    pub recorded_at_ms: u64,
}

impl TrialResult {
    pub fn hit(trial_number: usize, reaction_time_ms: u64, recorded_at_ms: u64) -> Self {
        Self {
            trial_number,
            outcome: TrialOutcome::Hit,
            reaction_time_ms,
            recorded_at_ms,
        }
    }

    pub fn miss(trial_number: usize, timeout_ms: u64, recorded_at_ms: u64) -> Self {
        Self {
            trial_number,
            outcome: TrialOutcome::Miss,
            reaction_time_ms: timeout_ms,
            recorded_at_ms,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.outcome == TrialOutcome::Hit
    }
}

/// Coach-facing band for a single reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionRating {
    Excellent,
    Good,
    Slow,
    Missed,
}

impl ReactionRating {
    /// Bands are half-open: `rt < excellent_below_ms` is excellent,
    /// `rt < good_below_ms` is good, anything else is slow.
    pub fn classify(result: &TrialResult, excellent_below_ms: u64, good_below_ms: u64) -> Self {
        match result.outcome {
            TrialOutcome::Miss => ReactionRating::Missed,
            TrialOutcome::Hit if result.reaction_time_ms < excellent_below_ms => {
                ReactionRating::Excellent
            }
            TrialOutcome::Hit if result.reaction_time_ms < good_below_ms => ReactionRating::Good,
            TrialOutcome::Hit => ReactionRating::Slow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionRating::Excellent => "Excellent",
            ReactionRating::Good => "Good",
            ReactionRating::Slow => "Slow",
            ReactionRating::Missed => "Missed",
        }
    }
}
