use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use reflex_core::{SessionPhase, TrialOutcome};
use reflex_engine::{ConfigError, EngineTimer, SessionEvent, TrialConfig, TrialEngine};
use reflex_timing::{Clock, Scheduler, VirtualScheduler};

type Engine = TrialEngine<VirtualScheduler<EngineTimer>, StdRng>;

fn drill(trial_count: usize) -> TrialConfig {
    TrialConfig {
        trial_count,
        total_duration_seconds: 600,
        ..TrialConfig::default()
    }
    .with_fixed_delay(2000)
}

fn ready(config: TrialConfig) -> Engine {
    let mut engine = TrialEngine::new(VirtualScheduler::new(), StdRng::seed_from_u64(42));
    engine.configure(config).expect("valid config");
    assert!(engine.confirm_ready());
    engine
}

fn running(config: TrialConfig) -> Engine {
    let mut engine = ready(config);
    assert!(engine.start());
    engine
}

fn recorder(engine: &mut Engine) -> Rc<RefCell<Vec<SessionEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.subscribe(move |event: &SessionEvent| sink.borrow_mut().push(event.clone()));
    log
}

#[test]
fn response_before_timeout_is_a_hit_with_elapsed_time() {
    let mut engine = running(drill(3));
    engine.run_until(2000);
    assert!(engine.is_stimulus_armed());

    engine.run_for(300);
    assert!(engine.respond());

    let result = &engine.results()[0];
    assert_eq!(result.outcome, TrialOutcome::Hit);
    assert_eq!(result.reaction_time_ms, 300);
    assert_eq!(result.recorded_at_ms, 2300);
    assert!(!engine.is_stimulus_armed());
}

#[test]
fn timeout_first_is_a_miss_and_late_response_is_ignored() {
    let mut engine = running(drill(3));
    engine.run_until(2000);
    engine.run_for(2000);

    assert_eq!(engine.results().len(), 1);
    let miss = &engine.results()[0];
    assert_eq!(miss.outcome, TrialOutcome::Miss);
    assert_eq!(miss.reaction_time_ms, 2000);
    assert_eq!(miss.recorded_at_ms, 4000);

    assert!(!engine.respond());
    assert_eq!(engine.results().len(), 1);
}

#[test]
fn response_one_ms_before_deadline_still_wins() {
    let mut engine = running(drill(2));
    engine.run_until(2000);
    engine.run_for(1999);
    assert!(engine.respond());
    assert_eq!(engine.results()[0].outcome, TrialOutcome::Hit);
    assert_eq!(engine.results()[0].reaction_time_ms, 1999);
}

#[test]
fn response_stamped_before_the_stimulus_is_dropped() {
    let mut engine = running(drill(2));
    engine.run_until(2000);
    assert!(engine.is_stimulus_armed());

    assert!(!engine.record_response(1500));
    assert!(engine.results().is_empty());
    assert!(engine.is_stimulus_armed());

    engine.run_for(350);
    assert!(engine.respond());
    assert_eq!(engine.results()[0].outcome, TrialOutcome::Hit);
    assert_eq!(engine.results()[0].reaction_time_ms, 350);
}

#[test]
fn response_stamped_past_deadline_counts_as_the_timeout() {
    let mut engine = running(drill(2));
    engine.run_until(2000);
    assert!(engine.record_response(4500));

    let result = &engine.results()[0];
    assert_eq!(result.outcome, TrialOutcome::Miss);
    assert_eq!(result.reaction_time_ms, 2000);
    assert_eq!(result.recorded_at_ms, 4000);

    engine.run_for(10_000);
    assert_eq!(engine.results()[0].trial_number, 1);
    assert_eq!(engine.results()[1].trial_number, 2);
}

#[test]
fn trial_budget_completes_the_session_early() {
    let mut engine = running(drill(2));
    for _ in 0..2 {
        while !engine.is_stimulus_armed() {
            engine.run_for(100);
        }
        engine.run_for(250);
        assert!(engine.respond());
    }

    assert_eq!(engine.phase(), SessionPhase::Completed);
    assert!(engine.remaining_seconds() > 0);
    assert_eq!(engine.scheduler().pending(), 0);
    assert_eq!(engine.state().session_ended_at_ms, Some(engine.scheduler().now_ms()));

    engine.run_for(60_000);
    assert_eq!(engine.results().len(), 2);
    assert!(!engine.is_stimulus_armed());
}

#[test]
fn countdown_expiry_completes_with_partial_results() {
    let config = TrialConfig {
        total_duration_seconds: 5,
        trial_count: 10,
        ..TrialConfig::default()
    }
    .with_fixed_delay(2000);
    let mut engine = running(config);

    engine.run_until(2000);
    engine.run_for(100);
    engine.respond();
    engine.run_until(5000);

    assert_eq!(engine.phase(), SessionPhase::Completed);
    assert_eq!(engine.remaining_seconds(), 0);
    assert_eq!(engine.results().len(), 1);
    assert!(!engine.is_stimulus_armed());
    assert_eq!(engine.scheduler().pending(), 0);
}

#[test]
fn pause_resume_preserves_state_and_remaining_delay() {
    let mut engine = running(drill(3));
    engine.run_until(1500);
    let before = engine.state().clone();

    assert!(engine.pause());
    engine.run_for(10_000);
    assert!(engine.resume());

    let after = engine.state();
    assert_eq!(after.results, before.results);
    assert_eq!(after.current_trial_index, before.current_trial_index);
    assert_eq!(after.remaining_seconds, before.remaining_seconds);

    engine.run_for(499);
    assert!(!engine.is_stimulus_armed());
    engine.run_for(1);
    assert_eq!(engine.state().stimulus_armed_at_ms, Some(12_000));
}

#[test]
fn paused_time_is_not_part_of_the_reaction() {
    let mut engine = running(drill(3));
    engine.run_until(2000);
    engine.run_for(200);
    engine.pause();
    assert!(!engine.respond());

    engine.run_for(5_000);
    assert!(engine.results().is_empty());
    engine.resume();
    engine.run_for(100);
    assert!(engine.respond());
    assert_eq!(engine.results()[0].reaction_time_ms, 300);
}

#[test]
fn timeout_window_is_also_frozen_by_pause() {
    let mut engine = running(drill(3));
    engine.run_until(2000);
    engine.run_for(1500);
    engine.pause();
    engine.run_for(30_000);
    engine.resume();

    engine.run_for(499);
    assert!(engine.results().is_empty());
    engine.run_for(1);
    assert_eq!(engine.results()[0].outcome, TrialOutcome::Miss);
}

#[test]
fn repeated_operations_are_no_ops() {
    let mut engine = running(drill(3));
    assert!(!engine.start());

    engine.run_until(1200);
    assert!(engine.pause());
    let paused = engine.state().clone();
    assert!(!engine.pause());
    assert_eq!(engine.state(), &paused);

    assert!(engine.resume());
    assert!(!engine.resume());
    assert!(!engine.confirm_ready());
    assert_eq!(engine.phase(), SessionPhase::Running);
}

#[test]
fn stop_releases_every_timer() {
    let mut engine = running(drill(3));
    engine.run_until(2000);
    assert!(engine.is_stimulus_armed());

    assert!(engine.stop());
    assert_eq!(engine.phase(), SessionPhase::Completed);
    assert_eq!(engine.scheduler().pending(), 0);
    assert!(!engine.is_stimulus_armed());
    assert!(!engine.stop());

    assert_eq!(engine.run_for(60_000), 0);
    assert!(!engine.respond());
    assert!(engine.results().is_empty());
}

#[test]
fn stop_while_paused_discards_frozen_timers() {
    let mut engine = running(drill(3));
    engine.run_until(1000);
    engine.pause();
    assert!(engine.stop());
    assert!(!engine.resume());
    assert_eq!(engine.run_for(60_000), 0);
    assert_eq!(engine.phase(), SessionPhase::Completed);
}

#[test]
fn empty_session_summary_reports_no_data() {
    let mut engine = running(drill(3));
    engine.stop();
    let summary = engine.summary();
    assert!(!summary.has_data());
    assert_eq!(summary.hit_rate_percent, 0.0);
    assert!(summary.hit_rate_percent.is_finite());
    assert_eq!(summary.average_reaction_time_ms, None);
}

#[test]
fn invalid_config_leaves_engine_in_setup() {
    let mut engine: Engine = TrialEngine::new(VirtualScheduler::new(), StdRng::seed_from_u64(0));
    let result = engine.configure(TrialConfig {
        trial_count: 0,
        ..TrialConfig::default()
    });
    assert_eq!(result, Err(ConfigError::ZeroTrialCount));
    assert_eq!(engine.phase(), SessionPhase::Setup);
    assert!(engine.config().is_none());
    assert!(!engine.confirm_ready());
}

#[test]
fn rest_delays_the_next_stimulus() {
    let config = TrialConfig {
        inter_trial_rest_seconds: 3,
        ..drill(3)
    };
    let mut engine = running(config);
    engine.run_until(2000);
    engine.run_for(250);
    engine.respond();

    engine.run_until(7249);
    assert!(!engine.is_stimulus_armed());
    engine.run_for(1);
    assert_eq!(engine.state().stimulus_armed_at_ms, Some(7250));
}

#[test]
fn observers_see_the_trial_lifecycle_in_order() {
    let mut engine = ready(drill(1));
    let log = recorder(&mut engine);
    engine.start();
    engine.run_until(2000);
    engine.run_for(400);
    engine.respond();

    let events = log.borrow();
    let interesting: Vec<_> = events
        .iter()
        .filter(|e| !matches!(e, SessionEvent::CountdownTick { .. }))
        .cloned()
        .collect();
    assert_eq!(
        interesting,
        vec![
            SessionEvent::PhaseChanged {
                from: SessionPhase::Ready,
                to: SessionPhase::Running
            },
            SessionEvent::StimulusArmed {
                trial_number: 1,
                at_ms: 2000
            },
            SessionEvent::StimulusCleared { trial_number: 1 },
            SessionEvent::TrialRecorded(engine.results()[0].clone()),
            SessionEvent::PhaseChanged {
                from: SessionPhase::Running,
                to: SessionPhase::Completed
            },
        ]
    );
    let ticks = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::CountdownTick { .. }))
        .count();
    assert_eq!(ticks, 2);
}

#[test]
fn mixed_session_scores_like_the_dashboard() {
    let mut engine = running(drill(4));
    for reaction in [Some(300), Some(700), None, Some(450)] {
        while !engine.is_stimulus_armed() {
            engine.run_for(50);
        }
        match reaction {
            Some(ms) => {
                engine.run_for(ms);
                engine.respond();
            }
            None => {
                engine.run_for(2000);
            }
        }
    }

    assert_eq!(engine.phase(), SessionPhase::Completed);
    let summary = engine.summary();
    assert!((summary.average_reaction_time_ms.unwrap() - 483.33).abs() < 0.01);
    assert_eq!(summary.hit_rate_percent, 75.0);
    assert_eq!(summary.best_reaction_time_ms, Some(300));
    assert_eq!(summary.success_rate_percent, 75.0);

    let report = engine.report();
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.phase, SessionPhase::Completed);
}
