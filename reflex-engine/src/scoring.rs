use reflex_core::{ReactionRating, TrialResult};
use serde::{Deserialize, Serialize};

/// Named reaction-time cutoffs. Overridable per sport or drill.
///
/// The defaults reproduce the bands the assessment dashboard has always
/// shown; their competitive basis is undocumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    pub excellent_below_ms: u64,
    pub good_below_ms: u64,
    /// Results strictly faster than this count toward the success rate.
    pub success_below_ms: u64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            excellent_below_ms: 500,
            good_below_ms: 1000,
            success_below_ms: 1000,
        }
    }
}

impl ScoringThresholds {
    pub fn rate(&self, result: &TrialResult) -> ReactionRating {
        ReactionRating::classify(result, self.excellent_below_ms, self.good_below_ms)
    }

    /// Applies to every result, misses included: a miss counts at its
    /// timeout value like any other reaction time.
    pub fn is_success(&self, result: &TrialResult) -> bool {
        result.reaction_time_ms < self.success_below_ms
    }
}
