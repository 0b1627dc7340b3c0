use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Stand-in for the person tapping the pad: answers each stimulus after a
/// jittered reaction time, or lets it lapse.
#[derive(Debug, Clone)]
pub struct SimulatedAthlete {
    rng: StdRng,
    pub mean_ms: u64,
    pub jitter_ms: u64,
    pub lapse_rate: f64,
}

const FASTEST_HUMAN_MS: u64 = 80;

impl SimulatedAthlete {
    pub fn new(seed: u64, mean_ms: u64, jitter_ms: u64, lapse_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            mean_ms,
            jitter_ms,
            lapse_rate: lapse_rate.clamp(0.0, 1.0),
        }
    }

    /// Delay before responding to the next stimulus, or `None` for a lapse.
    pub fn plan_reaction(&mut self) -> Option<u64> {
        if self.rng.random_bool(self.lapse_rate) {
            return None;
        }
        let jitter = self.jitter_ms as i64;
        let offset = if jitter == 0 {
            0
        } else {
            self.rng.random_range(-jitter..=jitter)
        };
        let reaction = (self.mean_ms as i64 + offset).max(FASTEST_HUMAN_MS as i64);
        Some(reaction as u64)
    }
}
