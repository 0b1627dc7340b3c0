use rand::Rng;
use reflex_core::{DrillInfo, Phase, SessionPhase, TrialOutcome, TrialResult};
use reflex_timing::{Fired, ManualTime, Scheduler, TimerHandle};
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, TrialConfig};
use crate::events::{EngineTimer, SessionEvent, SessionObserver};
use crate::report::SessionReport;
use crate::summary::SessionSummary;

const TICK_MS: u64 = 1000;

/// Live record of one session. Only the engine mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub current_trial_index: usize,
    pub remaining_seconds: u32,
    /// Set while a stimulus awaits a response. Kept (frozen) across a pause.
    pub stimulus_armed_at_ms: Option<u64>,
    pub results: Vec<TrialResult>,
    pub session_started_at_ms: Option<u64>,
    pub session_ended_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Arm,
    Timeout,
    Tick,
}

impl TimerKind {
    const ALL: [TimerKind; 3] = [TimerKind::Arm, TimerKind::Timeout, TimerKind::Tick];

    fn of(event: &EngineTimer) -> Self {
        match event {
            EngineTimer::ArmStimulus { .. } => TimerKind::Arm,
            EngineTimer::ResponseTimeout { .. } => TimerKind::Timeout,
            EngineTimer::CountdownTick => TimerKind::Tick,
        }
    }
}

/// At most one outstanding value per timer kind
#[derive(Debug)]
struct Slots<T> {
    arm: Option<T>,
    timeout: Option<T>,
    tick: Option<T>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            arm: None,
            timeout: None,
            tick: None,
        }
    }
}

impl<T> Slots<T> {
    fn get_mut(&mut self, kind: TimerKind) -> &mut Option<T> {
        match kind {
            TimerKind::Arm => &mut self.arm,
            TimerKind::Timeout => &mut self.timeout,
            TimerKind::Tick => &mut self.tick,
        }
    }
}

/// Stimulus-response drill state machine.
///
/// `Setup -> Ready -> Running <-> Paused -> Completed -> Setup`. Operations
/// that are not valid in the current phase return `false` and change
/// nothing. Every path into `Completed` or back to `Setup` cancels all
/// timers the engine holds.
pub struct TrialEngine<S, R>
where
    S: Scheduler<EngineTimer>,
    R: Rng,
{
    scheduler: S,
    rng: R,
    config: Option<TrialConfig>,
    drill: Option<DrillInfo>,
    state: SessionState,
    timers: Slots<TimerHandle>,
    suspended: Slots<u64>,
    paused_at_ms: Option<u64>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl<S, R> TrialEngine<S, R>
where
    S: Scheduler<EngineTimer>,
    R: Rng,
{
    pub fn new(scheduler: S, rng: R) -> Self {
        Self {
            scheduler,
            rng,
            config: None,
            drill: None,
            state: SessionState::default(),
            timers: Slots::default(),
            suspended: Slots::default(),
            paused_at_ms: None,
            observers: Vec::new(),
        }
    }

    pub fn with_drill(mut self, drill: DrillInfo) -> Self {
        self.drill = Some(drill);
        self
    }

    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: SessionObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Stores a validated config. Only accepted in `Setup`.
    pub fn configure(&mut self, config: TrialConfig) -> Result<bool, ConfigError> {
        if self.state.phase != SessionPhase::Setup {
            return Ok(self.ignored("configure"));
        }
        config.validate()?;
        info!(
            trials = config.trial_count,
            duration_s = config.total_duration_seconds,
            timeout_ms = config.response_timeout_ms,
            "drill configured"
        );
        self.config = Some(config);
        Ok(true)
    }

    pub fn confirm_ready(&mut self) -> bool {
        if self.config.is_none() {
            return self.ignored("confirm_ready");
        }
        self.transition(SessionPhase::Ready)
    }

    pub fn start(&mut self) -> bool {
        let config = match self.config {
            Some(config) if self.state.phase == SessionPhase::Ready => config,
            _ => return self.ignored("start"),
        };
        let now = self.scheduler.now_ms();
        self.state = SessionState {
            phase: self.state.phase,
            remaining_seconds: config.total_duration_seconds,
            session_started_at_ms: Some(now),
            ..SessionState::default()
        };
        self.transition(SessionPhase::Running);
        self.schedule(TimerKind::Tick, TICK_MS);
        let delay = self.stimulus_delay(&config);
        self.schedule(TimerKind::Arm, delay);
        true
    }

    /// Freezes every outstanding timer, keeping the time each had left.
    pub fn pause(&mut self) -> bool {
        if self.state.phase != SessionPhase::Running {
            return self.ignored("pause");
        }
        for kind in TimerKind::ALL {
            if let Some(handle) = self.timers.get_mut(kind).take() {
                let remaining = self.scheduler.remaining_ms(handle).unwrap_or(0);
                self.scheduler.cancel(handle);
                *self.suspended.get_mut(kind) = Some(remaining);
            }
        }
        self.paused_at_ms = Some(self.scheduler.now_ms());
        self.transition(SessionPhase::Paused)
    }

    /// Re-arms frozen timers with the delay they had left, not a fresh one.
    /// An armed stimulus does not count paused time toward the reaction.
    pub fn resume(&mut self) -> bool {
        if self.state.phase != SessionPhase::Paused {
            return self.ignored("resume");
        }
        let now = self.scheduler.now_ms();
        if let (Some(paused_at), Some(armed_at)) =
            (self.paused_at_ms.take(), self.state.stimulus_armed_at_ms)
        {
            self.state.stimulus_armed_at_ms = Some(armed_at + now.saturating_sub(paused_at));
        }
        self.transition(SessionPhase::Running);
        for kind in TimerKind::ALL {
            if let Some(remaining) = self.suspended.get_mut(kind).take() {
                self.schedule(kind, remaining);
            }
        }
        true
    }

    pub fn stop(&mut self) -> bool {
        if !self.state.phase.is_live() {
            return self.ignored("stop");
        }
        self.complete("stopped");
        true
    }

    /// Discards the session and its config.
    pub fn reset(&mut self) -> bool {
        if self.state.phase != SessionPhase::Completed {
            return self.ignored("reset");
        }
        self.cancel_all();
        self.config = None;
        self.state = SessionState {
            phase: self.state.phase,
            ..SessionState::default()
        };
        self.transition(SessionPhase::Setup)
    }

    /// Records a response observed at `now_ms` on the scheduler clock.
    ///
    /// Dropped unless a stimulus is armed and the session is running. A
    /// response stamped at or past the timeout deadline lost the race and is
    /// recorded as the miss the pending timeout would have produced. A
    /// response stamped before the stimulus appeared is dropped.
    pub fn record_response(&mut self, now_ms: u64) -> bool {
        let Some(armed_at) = self.armed_stimulus("response") else {
            return false;
        };
        let Some(config) = self.config else {
            return false;
        };
        if now_ms < armed_at {
            trace!(now_ms, armed_at, "response dropped: stamped before stimulus");
            return false;
        }
        self.cancel(TimerKind::Timeout);
        let reaction_ms = now_ms - armed_at;
        if reaction_ms >= config.response_timeout_ms {
            self.conclude_trial(
                TrialOutcome::Miss,
                config.response_timeout_ms,
                armed_at + config.response_timeout_ms,
            );
        } else {
            self.conclude_trial(TrialOutcome::Hit, reaction_ms, now_ms);
        }
        true
    }

    /// [`record_response`](Self::record_response) stamped with the scheduler's current time.
    pub fn respond(&mut self) -> bool {
        let now = self.scheduler.now_ms();
        self.record_response(now)
    }

    /// Dispatches every timer that is currently due. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due() {
            self.dispatch(timer);
            fired += 1;
        }
        fired
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> Option<&TrialConfig> {
        self.config.as_ref()
    }

    pub fn drill(&self) -> Option<&DrillInfo> {
        self.drill.as_ref()
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.state.results
    }

    pub fn is_stimulus_armed(&self) -> bool {
        self.state.stimulus_armed_at_ms.is_some()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    /// Completed trials against the configured total
    pub fn trial_progress(&self) -> (usize, usize) {
        let total = self.config.map_or(0, |c| c.trial_count);
        (self.state.results.len(), total)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn summary(&self) -> SessionSummary {
        let thresholds = self.config.map(|c| c.scoring).unwrap_or_default();
        SessionSummary::from_results(&self.state.results, &thresholds)
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            drill: self.drill.clone(),
            config: self.config,
            phase: self.state.phase,
            results: self.state.results.clone(),
            summary: self.summary(),
            started_at_ms: self.state.session_started_at_ms,
            ended_at_ms: self.state.session_ended_at_ms,
        }
    }

    fn dispatch(&mut self, fired: Fired<EngineTimer>) {
        let kind = TimerKind::of(&fired.event);
        let slot = self.timers.get_mut(kind);
        if *slot != Some(fired.handle) {
            trace!(handle = fired.handle.id(), event = ?fired.event, "orphan timer dropped");
            return;
        }
        *slot = None;

        let now = self.scheduler.now_ms();
        match fired.event {
            EngineTimer::ArmStimulus { trial_index } => self.arm_stimulus(trial_index, now),
            EngineTimer::ResponseTimeout { trial_index } => {
                if trial_index == self.state.current_trial_index {
                    self.record_miss(now);
                } else {
                    trace!(trial_index, "timeout for concluded trial dropped");
                }
            }
            EngineTimer::CountdownTick => self.tick(),
        }
    }

    fn arm_stimulus(&mut self, trial_index: usize, now_ms: u64) {
        let Some(config) = self.config else {
            return;
        };
        if !self.state.phase.accepts_responses()
            || self.state.stimulus_armed_at_ms.is_some()
            || trial_index != self.state.current_trial_index
            || trial_index >= config.trial_count
        {
            trace!(trial_index, "stale stimulus arm dropped");
            return;
        }
        self.state.stimulus_armed_at_ms = Some(now_ms);
        self.schedule(TimerKind::Timeout, config.response_timeout_ms);
        let trial_number = trial_index + 1;
        debug!(trial_number, at_ms = now_ms, "stimulus armed");
        self.emit(SessionEvent::StimulusArmed {
            trial_number,
            at_ms: now_ms,
        });
    }

    fn record_miss(&mut self, now_ms: u64) -> bool {
        if self.armed_stimulus("timeout").is_none() {
            return false;
        }
        let Some(config) = self.config else {
            return false;
        };
        self.cancel(TimerKind::Timeout);
        self.conclude_trial(TrialOutcome::Miss, config.response_timeout_ms, now_ms);
        true
    }

    fn armed_stimulus(&self, source: &'static str) -> Option<u64> {
        if !self.state.phase.accepts_responses() {
            trace!(source, phase = %self.state.phase, "event dropped: session not running");
            return None;
        }
        let armed = self.state.stimulus_armed_at_ms;
        if armed.is_none() {
            trace!(source, "event dropped: no stimulus armed");
        }
        armed
    }

    fn conclude_trial(&mut self, outcome: TrialOutcome, reaction_time_ms: u64, recorded_at_ms: u64) {
        let Some(config) = self.config else {
            return;
        };
        let trial_number = self.state.current_trial_index + 1;
        let result = TrialResult {
            trial_number,
            outcome,
            reaction_time_ms,
            recorded_at_ms,
        };
        self.state.stimulus_armed_at_ms = None;
        self.state.results.push(result.clone());
        self.state.current_trial_index += 1;
        debug!(trial_number, ?outcome, reaction_time_ms, "trial recorded");
        self.emit(SessionEvent::StimulusCleared { trial_number });
        self.emit(SessionEvent::TrialRecorded(result));

        if self.state.current_trial_index >= config.trial_count {
            self.complete("trial budget exhausted");
        } else {
            let delay = config.inter_trial_rest_ms() + self.stimulus_delay(&config);
            self.schedule(TimerKind::Arm, delay);
        }
    }

    fn tick(&mut self) {
        if self.state.phase != SessionPhase::Running {
            return;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        let remaining_seconds = self.state.remaining_seconds;
        self.emit(SessionEvent::CountdownTick { remaining_seconds });
        if remaining_seconds == 0 {
            self.complete("time expired");
        } else {
            self.schedule(TimerKind::Tick, TICK_MS);
        }
    }

    fn complete(&mut self, reason: &'static str) {
        if self.state.phase.is_terminal() {
            return;
        }
        self.cancel_all();
        self.paused_at_ms = None;
        if self.state.stimulus_armed_at_ms.take().is_some() {
            let trial_number = self.state.current_trial_index + 1;
            self.emit(SessionEvent::StimulusCleared { trial_number });
        }
        self.state.session_ended_at_ms = Some(self.scheduler.now_ms());
        if self.transition(SessionPhase::Completed) {
            info!(reason, trials = self.state.results.len(), "session completed");
        }
    }

    fn transition(&mut self, to: SessionPhase) -> bool {
        let from = self.state.phase;
        if !from.can_transition_to(to) {
            return self.ignored("transition");
        }
        self.state.phase = to;
        info!(%from, %to, "phase changed");
        self.emit(SessionEvent::PhaseChanged { from, to });
        true
    }

    fn ignored(&self, operation: &'static str) -> bool {
        warn!(operation, phase = %self.state.phase, "operation not valid in current phase; ignored");
        false
    }

    fn schedule(&mut self, kind: TimerKind, delay_ms: u64) {
        let event = match kind {
            TimerKind::Arm => EngineTimer::ArmStimulus {
                trial_index: self.state.current_trial_index,
            },
            TimerKind::Timeout => EngineTimer::ResponseTimeout {
                trial_index: self.state.current_trial_index,
            },
            TimerKind::Tick => EngineTimer::CountdownTick,
        };
        let handle = self.scheduler.schedule_after(delay_ms, event);
        if let Some(stale) = self.timers.get_mut(kind).replace(handle) {
            self.scheduler.cancel(stale);
        }
    }

    fn cancel(&mut self, kind: TimerKind) {
        if let Some(handle) = self.timers.get_mut(kind).take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_all(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
        self.suspended = Slots::default();
    }

    fn stimulus_delay(&mut self, config: &TrialConfig) -> u64 {
        let (min, max) = config.stimulus_delay_ms;
        if min >= max {
            min
        } else {
            self.rng.random_range(min..max)
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

impl<S, R> TrialEngine<S, R>
where
    S: Scheduler<EngineTimer> + ManualTime,
    R: Rng,
{
    /// Steps a manual clock to `target_ms`, stopping at each deadline on
    /// the way so every timer observes its own due time.
    pub fn run_until(&mut self, target_ms: u64) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.scheduler.next_deadline() {
            if deadline > target_ms {
                break;
            }
            self.scheduler.set_now_ms(deadline);
            fired += self.poll();
        }
        self.scheduler.set_now_ms(target_ms);
        fired
    }

    pub fn run_for(&mut self, delta_ms: u64) -> usize {
        let target = self.scheduler.now_ms().saturating_add(delta_ms);
        self.run_until(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use reflex_timing::{Clock, VirtualScheduler};

    type Engine = TrialEngine<VirtualScheduler<EngineTimer>, StdRng>;

    fn engine() -> Engine {
        TrialEngine::new(VirtualScheduler::new(), StdRng::seed_from_u64(1))
    }

    fn ready(config: TrialConfig) -> Engine {
        let mut e = engine();
        assert_eq!(e.configure(config), Ok(true));
        assert!(e.confirm_ready());
        e
    }

    #[test]
    fn confirm_ready_requires_config() {
        let mut e = engine();
        assert!(!e.confirm_ready());
        assert_eq!(e.phase(), SessionPhase::Setup);
    }

    #[test]
    fn configure_outside_setup_is_ignored() {
        let mut e = ready(TrialConfig::default());
        let other = TrialConfig {
            trial_count: 99,
            ..Default::default()
        };
        assert_eq!(e.configure(other), Ok(false));
        assert_eq!(e.config().map(|c| c.trial_count), Some(10));
    }

    #[test]
    fn start_arms_countdown_and_first_stimulus() {
        let mut e = ready(TrialConfig::default().with_fixed_delay(2000));
        assert!(e.start());
        assert_eq!(e.scheduler().pending(), 2);
        assert_eq!(e.remaining_seconds(), 60);
        assert_eq!(e.state().session_started_at_ms, Some(0));

        e.run_until(2000);
        assert_eq!(e.state().stimulus_armed_at_ms, Some(2000));
        assert_eq!(e.remaining_seconds(), 58);
    }

    #[test]
    fn pause_holds_no_live_timers() {
        let mut e = ready(TrialConfig::default());
        e.start();
        e.run_for(500);
        assert!(e.pause());
        assert_eq!(e.scheduler().pending(), 0);
        assert!(e.resume());
        assert_eq!(e.scheduler().pending(), 2);
    }

    #[test]
    fn reset_only_from_completed() {
        let mut e = ready(TrialConfig::default());
        assert!(!e.reset());
        e.start();
        assert!(!e.reset());
        e.stop();
        assert!(e.reset());
        assert_eq!(e.phase(), SessionPhase::Setup);
        assert!(e.config().is_none());
        assert!(e.results().is_empty());
        assert_eq!(e.state().session_ended_at_ms, None);
    }

    #[test]
    fn respond_before_any_stimulus_is_dropped() {
        let mut e = ready(TrialConfig::default());
        e.start();
        e.run_for(100);
        assert!(!e.respond());
        assert!(e.results().is_empty());
    }

    #[test]
    fn random_delay_stays_inside_window() {
        for seed in 0..20 {
            let mut e = TrialEngine::new(VirtualScheduler::new(), StdRng::seed_from_u64(seed));
            e.configure(TrialConfig::default()).unwrap();
            e.confirm_ready();
            e.start();
            e.run_until(5000);
            let armed = e.state().stimulus_armed_at_ms.expect("armed within window");
            assert!((2000..5000).contains(&armed), "seed {seed}: {armed}");
        }
    }

    #[test]
    fn run_until_lands_on_target() {
        let mut e = ready(TrialConfig::default());
        e.start();
        e.run_until(1234);
        assert_eq!(e.scheduler().now_ms(), 1234);
    }
}
