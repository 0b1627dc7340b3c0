use reflex_core::Difficulty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::ScoringThresholds;

/// Per-session drill settings, validated when handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Hard ceiling on session length.
    pub total_duration_seconds: u32,
    pub trial_count: usize,
    /// Gap after each trial before the next stimulus delay starts counting.
    pub inter_trial_rest_seconds: u32,
    pub difficulty: Difficulty,
    /// An unanswered stimulus becomes a miss after this long.
    pub response_timeout_ms: u64,
    pub audio_enabled: bool,
    pub visual_enabled: bool,
    /// Half-open `[min, max)` window the stimulus delay is drawn from.
    /// Equal bounds give a fixed delay.
    pub stimulus_delay_ms: (u64, u64),
    pub scoring: ScoringThresholds,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            total_duration_seconds: 60,
            trial_count: 10,
            inter_trial_rest_seconds: 0,
            difficulty: Difficulty::Medium,
            response_timeout_ms: 2000,
            audio_enabled: true,
            visual_enabled: true,
            stimulus_delay_ms: (2000, 5000),
            scoring: ScoringThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("trial count must be greater than zero")]
    ZeroTrialCount,
    #[error("total duration must be greater than zero seconds")]
    ZeroDuration,
    #[error("response timeout must be greater than zero milliseconds")]
    ZeroResponseTimeout,
    #[error("stimulus delay window is inverted: min {min} ms > max {max} ms")]
    InvertedDelayWindow { min: u64, max: u64 },
}

impl TrialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trial_count == 0 {
            return Err(ConfigError::ZeroTrialCount);
        }
        if self.total_duration_seconds == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.response_timeout_ms == 0 {
            return Err(ConfigError::ZeroResponseTimeout);
        }
        let (min, max) = self.stimulus_delay_ms;
        if min > max {
            return Err(ConfigError::InvertedDelayWindow { min, max });
        }
        Ok(())
    }

    pub fn inter_trial_rest_ms(&self) -> u64 {
        u64::from(self.inter_trial_rest_seconds) * 1000
    }

    /// Fixed stimulus delay, convenient for drills and tests that need determinism
    pub fn with_fixed_delay(mut self, delay_ms: u64) -> Self {
        self.stimulus_delay_ms = (delay_ms, delay_ms);
        self
    }
}
