use reflex_core::{SessionPhase, TrialResult};

/// Payload the engine schedules on its [`reflex_timing::Scheduler`].
///
/// Stimulus and timeout timers carry the trial index they were armed for so
/// a fire that outlived its trial is recognisable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTimer {
    ArmStimulus { trial_index: usize },
    ResponseTimeout { trial_index: usize },
    CountdownTick,
}

/// Notifications delivered to observers after the engine state has changed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    StimulusArmed {
        trial_number: usize,
        at_ms: u64,
    },
    StimulusCleared {
        trial_number: usize,
    },
    TrialRecorded(TrialResult),
    CountdownTick {
        remaining_seconds: u32,
    },
}

pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionEvent),
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}
