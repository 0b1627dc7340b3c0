use serde::{Deserialize, Serialize};

/// Defines session phases and which transitions between them are legal
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn can_transition_to(&self, to: Self) -> bool;
    fn accepts_responses(&self) -> bool;
    fn is_terminal(&self) -> bool;

    /// Running or paused: the session owns timers that must be released on exit.
    fn is_live(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Setup,
    Ready,
    Running,
    Paused,
    Completed,
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Setup => "setup",
            SessionPhase::Ready => "ready",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Phase for SessionPhase {
    fn can_transition_to(&self, to: Self) -> bool {
        use SessionPhase::*;
        matches!(
            (self, to),
            (Setup, Ready)
                | (Ready, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Completed)
                | (Paused, Completed)
                | (Completed, Setup)
        )
    }

    fn accepts_responses(&self) -> bool {
        matches!(self, SessionPhase::Running)
    }

    fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completed)
    }

    fn is_live(&self) -> bool {
        matches!(self, SessionPhase::Running | SessionPhase::Paused)
    }
}
