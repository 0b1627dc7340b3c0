use reflex_core::{ReactionRating, TrialResult};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoringThresholds;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts {
    pub excellent: usize,
    pub good: usize,
    pub slow: usize,
    pub missed: usize,
}

/// Aggregate view over a session's results, recomputed on demand.
///
/// Reaction-time statistics cover hits only. Values that have no meaning
/// without hits are `None`; percentages over an empty session are `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trials_completed: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub average_reaction_time_ms: Option<f64>,
    pub best_reaction_time_ms: Option<u64>,
    pub worst_reaction_time_ms: Option<u64>,
    pub hit_rate_percent: f64,
    pub success_rate_percent: f64,
    pub ratings: RatingCounts,
}

impl SessionSummary {
    pub fn from_results(results: &[TrialResult], thresholds: &ScoringThresholds) -> Self {
        let hits: Vec<u64> = results
            .iter()
            .filter(|r| r.is_hit())
            .map(|r| r.reaction_time_ms)
            .collect();
        let successes = results.iter().filter(|r| thresholds.is_success(r)).count();

        let mut ratings = RatingCounts::default();
        for result in results {
            match thresholds.rate(result) {
                ReactionRating::Excellent => ratings.excellent += 1,
                ReactionRating::Good => ratings.good += 1,
                ReactionRating::Slow => ratings.slow += 1,
                ReactionRating::Missed => ratings.missed += 1,
            }
        }

        let average = (!hits.is_empty())
            .then(|| hits.iter().sum::<u64>() as f64 / hits.len() as f64);

        Self {
            trials_completed: results.len(),
            hit_count: hits.len(),
            miss_count: results.len() - hits.len(),
            average_reaction_time_ms: average,
            best_reaction_time_ms: hits.iter().min().copied(),
            worst_reaction_time_ms: hits.iter().max().copied(),
            hit_rate_percent: percent(hits.len(), results.len()),
            success_rate_percent: percent(successes, results.len()),
            ratings,
        }
    }

    pub fn has_data(&self) -> bool {
        self.trials_completed > 0
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}
