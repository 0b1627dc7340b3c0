use reflex_core::{DrillInfo, SessionPhase, TrialResult};
use serde::{Deserialize, Serialize};

use crate::config::TrialConfig;
use crate::summary::SessionSummary;

/// Snapshot of a session for export: to be saved or handed to a results view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill: Option<DrillInfo>,
    pub config: Option<TrialConfig>,
    pub phase: SessionPhase,
    pub results: Vec<TrialResult>,
    pub summary: SessionSummary,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
}

impl SessionReport {
    pub fn duration_ms(&self) -> Option<u64> {
        Some(self.ended_at_ms?.saturating_sub(self.started_at_ms?))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
