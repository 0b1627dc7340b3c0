use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reflex_core::{DrillInfo, Phase};
use reflex_engine::{
    EngineTimer, ScoringThresholds, SessionEvent, SessionReport, TrialConfig, TrialEngine,
};
use reflex_timing::{Clock, RealtimeScheduler, Scheduler, VirtualScheduler};
use tracing::info;

use crate::athlete::SimulatedAthlete;

#[derive(Debug, Clone, Parser)]
#[command(name = "reflex", about = "Run a reaction drill against a simulated athlete")]
pub struct Args {
    /// JSON file with drill settings; omitted fields keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the configured trial count
    #[arg(long)]
    pub trials: Option<usize>,
    /// Run on the wall clock instead of virtual time
    #[arg(long)]
    pub realtime: bool,
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
    #[arg(long, default_value_t = 420)]
    pub mean_ms: u64,
    #[arg(long, default_value_t = 150)]
    pub jitter_ms: u64,
    #[arg(long, default_value_t = 0.1)]
    pub lapse_rate: f64,
    #[arg(long, default_value = "Light reaction drill")]
    pub drill: String,
    #[arg(long, default_value = "Simple visual reaction time")]
    pub purpose: String,
    #[arg(long = "equipment")]
    pub equipment: Vec<String>,
    /// Write the session report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub struct App {
    config: TrialConfig,
    drill: DrillInfo,
    athlete: SimulatedAthlete,
    realtime: bool,
    seed: u64,
    report_path: Option<PathBuf>,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => load_config(path)?,
            None => TrialConfig::default(),
        };
        if let Some(trials) = args.trials {
            config.trial_count = trials;
        }
        if !args.lapse_rate.is_finite() {
            bail!("lapse rate must be a finite number, got {}", args.lapse_rate);
        }

        Ok(Self {
            config,
            drill: DrillInfo::new(args.drill, args.purpose).with_equipment(args.equipment),
            athlete: SimulatedAthlete::new(
                args.seed.wrapping_add(1),
                args.mean_ms,
                args.jitter_ms,
                args.lapse_rate,
            ),
            realtime: args.realtime,
            seed: args.seed,
            report_path: args.report,
        })
    }

    pub fn run(mut self) -> Result<()> {
        println!("=== REACTION DRILL ===");
        println!("Drill: {} ({})", self.drill.name, self.drill.purpose);
        if !self.drill.equipment.is_empty() {
            println!("Equipment: {}", self.drill.equipment.join(", "));
        }
        println!(
            "Trials: {}  Duration: {} s  Timeout: {} ms  Clock: {}\n",
            self.config.trial_count,
            self.config.total_duration_seconds,
            self.config.response_timeout_ms,
            if self.realtime { "real" } else { "virtual" },
        );

        let report = if self.realtime {
            self.run_realtime()?
        } else {
            self.run_virtual()?
        };
        print_summary(&report);

        if let Some(path) = &self.report_path {
            let json = report.to_json_pretty().context("failed to serialise report")?;
            fs::write(path, json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }

        Ok(())
    }

    fn build_engine<S>(&self, scheduler: S) -> Result<TrialEngine<S, StdRng>>
    where
        S: Scheduler<EngineTimer>,
    {
        let mut engine = TrialEngine::new(scheduler, StdRng::seed_from_u64(self.seed))
            .with_drill(self.drill.clone());
        engine
            .configure(self.config)
            .context("invalid drill configuration")?;
        engine.subscribe(progress_printer(self.config.scoring));
        if !engine.confirm_ready() || !engine.start() {
            bail!("engine refused to start the session");
        }
        Ok(engine)
    }

    /// Jumps straight from deadline to deadline; a full session takes milliseconds.
    fn run_virtual(&mut self) -> Result<SessionReport> {
        let mut engine = self.build_engine(VirtualScheduler::new())?;
        let mut planned = None;

        while !engine.phase().is_terminal() {
            let trial = engine.state().current_trial_index;
            if engine.is_stimulus_armed() && planned != Some(trial) {
                planned = Some(trial);
                if let Some(reaction_ms) = self.athlete.plan_reaction() {
                    engine.run_for(reaction_ms);
                    if engine.state().current_trial_index == trial {
                        engine.respond();
                    }
                    continue;
                }
            }
            match engine.scheduler().next_deadline() {
                Some(deadline) => {
                    engine.run_until(deadline);
                }
                None => break,
            }
        }

        Ok(engine.report())
    }

    fn run_realtime(&mut self) -> Result<SessionReport> {
        let mut engine = self.build_engine(RealtimeScheduler::new())?;
        let mut planned = None;
        let mut response_due: Option<(usize, u64)> = None;

        loop {
            engine.poll();
            if engine.phase().is_terminal() {
                break;
            }
            let trial = engine.state().current_trial_index;
            let now = engine.scheduler().now_ms();
            if engine.is_stimulus_armed() && planned != Some(trial) {
                planned = Some(trial);
                response_due = self
                    .athlete
                    .plan_reaction()
                    .map(|reaction_ms| (trial, now + reaction_ms));
            }
            match response_due {
                Some((due_trial, _)) if due_trial != trial => response_due = None,
                Some((_, at)) if now >= at => {
                    engine.record_response(now);
                    response_due = None;
                    continue;
                }
                _ => {}
            }
            engine
                .scheduler()
                .sleep_until_next(response_due.map(|(_, at)| at));
        }

        let stats = engine.scheduler().lateness_stats();
        info!(
            samples = stats.samples,
            average_ms = stats.average_ns / 1_000_000.0,
            jitter_ms = stats.jitter_ns / 1_000_000.0,
            "timer lateness"
        );
        Ok(engine.report())
    }
}

fn load_config(path: &Path) -> Result<TrialConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn progress_printer(thresholds: ScoringThresholds) -> impl FnMut(&SessionEvent) {
    move |event: &SessionEvent| match event {
        SessionEvent::StimulusArmed { trial_number, .. } => {
            println!("Trial {trial_number}: GO");
        }
        SessionEvent::TrialRecorded(result) => {
            println!(
                "Trial {}: {:?} {} ms ({})",
                result.trial_number,
                result.outcome,
                result.reaction_time_ms,
                thresholds.rate(result).label()
            );
        }
        SessionEvent::CountdownTick { remaining_seconds } if remaining_seconds % 10 == 0 => {
            println!("  {remaining_seconds} s left");
        }
        _ => {}
    }
}

fn print_summary(report: &SessionReport) {
    let s = &report.summary;
    println!("\n=== SESSION SUMMARY ===");
    if !s.has_data() {
        println!("No trials completed: no data.");
        return;
    }
    let ms = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0} ms"));
    println!("Trials: {} ({} hits, {} misses)", s.trials_completed, s.hit_count, s.miss_count);
    println!("Average RT: {}", ms(s.average_reaction_time_ms));
    println!("Best RT: {}", ms(s.best_reaction_time_ms.map(|v| v as f64)));
    println!("Hit rate: {:.1}%", s.hit_rate_percent);
    println!("Success rate: {:.1}%", s.success_rate_percent);
    println!(
        "Ratings: {} excellent, {} good, {} slow, {} missed",
        s.ratings.excellent, s.ratings.good, s.ratings.slow, s.ratings.missed
    );
    if let Some(duration) = report.duration_ms() {
        println!("Session length: {:.1} s", duration as f64 / 1000.0);
    }
}
