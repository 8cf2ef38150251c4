//! Test run orchestration
//!
//! A [`TestRun`] wires one paradigm's trial generator to the phase machine,
//! stopwatch, input normalizer and response ledger. It is driven by
//! [`TestRun::tick`], which replays due timers and captured input in
//! timestamp order. Dropping a run tears down its timers and its keyboard
//! registration with it.
//!
//! [`Assessment`] sits on top and files each finished run into the session.

use crate::clock::Clock;
use crate::config::Config;
use crate::input::{InputEvent, InputNormalizer, KeyboardHub, MouseButton, TouchDisposition};
use crate::ledger::{LedgerError, Response, ResponseLedger};
use crate::paradigms::{input_config_for, TestType, TrialGenerator, TrialStimulus};
use crate::phase::{Phase, PhaseError, PhaseMachine, COUNTDOWN_START};
use crate::scheduler::{Scheduler, TimerId, TimerKind};
use crate::scoring::{score, ScoringParams, TestResult};
use crate::session::{Session, SessionMode, SessionState};
use crate::timer::{TimingError, TrialTimer};
use chrono::Utc;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::mpsc;

/// Errors raised while driving a run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Timing(#[from] TimingError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("no test run is active")]
    NoActiveRun,
    #[error("no stimulus is awaiting a response")]
    NoActiveTrial,
    #[error("{requested} requested, but the sequential session expects {expected} next")]
    OutOfSequence {
        expected: TestType,
        requested: TestType,
    },
}

#[derive(Debug, Clone)]
struct ActiveTrial {
    index: usize,
    stimulus: TrialStimulus,
    /// Set once the stimulus is visible
    onset: Option<u64>,
    anticipations: u32,
    timeout: Option<TimerId>,
}

/// One paradigm run from instructions to results
pub struct TestRun<C: Clock> {
    test_type: TestType,
    clock: C,
    phase: PhaseMachine,
    timer: TrialTimer<C>,
    ledger: ResponseLedger,
    scheduler: Scheduler,
    input: InputNormalizer,
    events: mpsc::Receiver<InputEvent>,
    generator: TrialGenerator,
    rng: StdRng,
    params: ScoringParams,
    inter_trial_ms: u64,
    trial: Option<ActiveTrial>,
}

impl<C: Clock> TestRun<C> {
    /// Build a run in the instructions phase, mounted on `hub`
    pub fn new(test_type: TestType, config: &Config, clock: C, hub: &KeyboardHub) -> Self {
        let (tx, events) = mpsc::channel();
        let mut input = InputNormalizer::new(input_config_for(test_type, config), tx);
        input.mount(hub);

        let rng = match config.general.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            test_type,
            timer: TrialTimer::new(clock.clone()),
            clock,
            phase: PhaseMachine::new(),
            ledger: ResponseLedger::new(),
            scheduler: Scheduler::new(),
            input,
            events,
            generator: TrialGenerator::for_test(test_type, config),
            rng,
            params: config.scoring_params(),
            inter_trial_ms: config.general.inter_trial_interval_ms,
            trial: None,
        }
    }

    /// Leave instructions and begin the countdown
    pub fn start(&mut self) -> Result<(), EngineError> {
        let now = self.clock.now_ms();
        self.phase.start(&mut self.scheduler, now)?;
        info!("{} run started", self.test_type);
        Ok(())
    }

    /// Process every timer that has come due and every captured input
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let now = self.clock.now_ms();
        let mut pending: VecDeque<InputEvent> = self.events.try_iter().collect();

        loop {
            let due = self.scheduler.next_due().filter(|&at| at <= now);
            match (pending.front(), due) {
                (Some(event), Some(at)) if event.timestamp >= at => self.dispatch_due(now)?,
                (Some(_), _) => {
                    if let Some(event) = pending.pop_front() {
                        self.handle_input(event)?;
                    }
                }
                (None, Some(_)) => self.dispatch_due(now)?,
                (None, None) => break,
            }
        }
        Ok(())
    }

    fn dispatch_due(&mut self, now: u64) -> Result<(), EngineError> {
        let Some(fired) = self.scheduler.pop_due(now) else {
            return Ok(());
        };
        match fired.kind {
            TimerKind::CountdownTick => {
                if self.phase.on_countdown_tick(&mut self.scheduler) == Some(Phase::Test) {
                    self.enter_test()?;
                }
            }
            TimerKind::DisplayTick => self.timer.on_display_tick(),
            TimerKind::StimulusOnset => self.present_stimulus(),
            TimerKind::TrialTimeout => {
                debug!("trial timed out at {}ms", fired.due_at);
                self.resolve_trial(None)?;
            }
            TimerKind::NextTrial => self.begin_next_trial()?,
        }
        Ok(())
    }

    fn enter_test(&mut self) -> Result<(), EngineError> {
        self.timer.start(&mut self.scheduler);
        self.input.set_enabled(true);
        self.begin_next_trial()
    }

    fn begin_next_trial(&mut self) -> Result<(), EngineError> {
        let elapsed = self.timer.duration()?;
        let Some(stimulus) = self.generator.next_trial(elapsed, &mut self.rng) else {
            return self.finish();
        };

        let index = self.ledger.next_trial_index();
        let delay = stimulus.onset_delay_ms();
        debug!("trial {}: {:?}", index, stimulus);
        self.trial = Some(ActiveTrial {
            index,
            stimulus,
            onset: None,
            anticipations: 0,
            timeout: None,
        });

        if delay == 0 {
            self.present_stimulus();
        } else {
            let now = self.clock.now_ms();
            self.scheduler
                .schedule_once(TimerKind::StimulusOnset, delay, now);
        }
        Ok(())
    }

    fn present_stimulus(&mut self) {
        let onset = self.timer.start_trial();
        let window = self.generator.response_window_ms().max(1);
        let timeout = self
            .scheduler
            .schedule_once(TimerKind::TrialTimeout, window, onset);
        if let Some(trial) = self.trial.as_mut() {
            trial.onset = Some(onset);
            trial.timeout = Some(timeout);
        }
    }

    fn handle_input(&mut self, event: InputEvent) -> Result<(), EngineError> {
        if !self.phase.phase().allows_input() {
            debug!("input outside the test phase ignored");
            return Ok(());
        }
        let onset = match &self.trial {
            Some(trial) => trial.onset,
            None => {
                debug!("input between trials ignored");
                return Ok(());
            }
        };

        match onset {
            Some(onset) if event.timestamp >= onset => self.resolve_trial(Some(&event)),
            _ => {
                if let Some(trial) = self.trial.as_mut() {
                    trial.anticipations += 1;
                    debug!(
                        "anticipation {} on trial {}",
                        trial.anticipations, trial.index
                    );
                }
                Ok(())
            }
        }
    }

    /// Close the visible trial with `input`, or as a miss
    fn resolve_trial(&mut self, input: Option<&InputEvent>) -> Result<(), EngineError> {
        let response = match &self.trial {
            Some(ActiveTrial {
                index,
                stimulus,
                onset: Some(onset),
                anticipations,
                ..
            }) => Response::record(*index, stimulus.clone(), *onset, input)?
                .with_anticipations(*anticipations),
            _ => return Err(EngineError::NoActiveTrial),
        };

        if let Some(id) = self.trial.take().and_then(|t| t.timeout) {
            self.scheduler.cancel(id);
        }
        self.ledger.add_response(response)?;

        let now = self.clock.now_ms();
        self.scheduler
            .schedule_once(TimerKind::NextTrial, self.inter_trial_ms, now);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EngineError> {
        self.phase.finish()?;
        self.trial = None;
        self.input.set_enabled(false);
        self.timer.stop(&mut self.scheduler);
        self.scheduler.cancel_all();

        let (test_type, params) = (self.test_type, self.params);
        let trials = self.ledger.len();
        let result = self.ledger.calculate_and_set_result(|responses| {
            score(test_type, responses, &params, Utc::now())
        });
        info!(
            "{} finished after {} trials: {:.1}%",
            test_type,
            trials,
            result.percentage()
        );
        Ok(())
    }

    /// Resolve the visible trial directly with `input`, or as a miss.
    ///
    /// An input stamped before the stimulus onset is a timing defect.
    pub fn complete_trial(&mut self, input: Option<InputEvent>) -> Result<(), EngineError> {
        if !self.phase.phase().allows_input() {
            return Err(EngineError::NoActiveTrial);
        }
        self.resolve_trial(input.as_ref())
    }

    /// Touch-start on the stimulus surface
    pub fn touch_start(&self, timestamp: u64) -> TouchDisposition {
        self.input.touch_start(timestamp)
    }

    /// Click on the stimulus surface
    pub fn click(&self, button: MouseButton, timestamp: u64) -> bool {
        self.input.click(button, timestamp)
    }

    /// Abandon the run: back to instructions with an empty ledger
    pub fn reset(&mut self) {
        self.phase.reset(&mut self.scheduler);
        self.timer.reset(&mut self.scheduler);
        self.scheduler.cancel_all();
        self.input.set_enabled(false);
        self.events.try_iter().for_each(drop);
        self.ledger.reset();
        self.generator.restart();
        self.trial = None;
        info!("{} run reset", self.test_type);
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn countdown(&self) -> u32 {
        self.phase.countdown()
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.ledger.result()
    }

    /// Responses recorded so far, in trial order
    pub fn responses(&self) -> &[Response] {
        self.ledger.responses()
    }

    /// The stimulus on screen now; `None` during a PVT wait or between trials
    pub fn current_stimulus(&self) -> Option<&TrialStimulus> {
        self.trial
            .as_ref()
            .filter(|t| t.onset.is_some())
            .map(|t| &t.stimulus)
    }

    /// Milliseconds since the visible stimulus appeared
    pub fn stimulus_elapsed_ms(&self) -> Option<u64> {
        self.current_stimulus()?;
        self.timer.reaction_time().ok()
    }

    pub fn planned_trials(&self) -> Option<usize> {
        self.generator.planned_trials()
    }

    /// Elapsed test time as of the last display tick
    pub fn elapsed_display_ms(&self) -> u64 {
        self.timer.elapsed_display_ms()
    }

    /// Whether input is currently captured
    pub fn is_accepting_input(&self) -> bool {
        self.input.is_enabled()
    }
}

/// Session-level facade over the active run
pub struct Assessment<C: Clock> {
    config: Config,
    clock: C,
    hub: KeyboardHub,
    session: Session,
    run: Option<TestRun<C>>,
    result_recorded: bool,
}

impl<C: Clock> Assessment<C> {
    pub fn new(config: Config, clock: C) -> Self {
        Self {
            config,
            clock,
            hub: KeyboardHub::new(),
            session: Session::default(),
            run: None,
            result_recorded: false,
        }
    }

    /// Keyboard target the host forwards key presses to
    pub fn hub(&self) -> &KeyboardHub {
        &self.hub
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discard progress and any active run
    pub fn start_session(&mut self, sequential: bool) {
        self.run = None;
        self.result_recorded = false;
        self.session.start_new_session(sequential);
    }

    /// Replace the active run with a fresh one for `test_type`
    pub fn begin_test(&mut self, test_type: TestType) -> Result<(), EngineError> {
        if self.session.mode() == SessionMode::Sequential {
            if let Some(expected) = self.session.next_missing() {
                if expected != test_type {
                    return Err(EngineError::OutOfSequence {
                        expected,
                        requested: test_type,
                    });
                }
            }
        }
        self.run = None;
        self.result_recorded = false;
        self.run = Some(TestRun::new(
            test_type,
            &self.config,
            self.clock.clone(),
            &self.hub,
        ));
        debug!("{} selected", test_type);
        Ok(())
    }

    /// Drop the active run without recording anything
    pub fn end_test(&mut self) {
        self.run = None;
        self.result_recorded = false;
    }

    fn run_mut(&mut self) -> Result<&mut TestRun<C>, EngineError> {
        self.run.as_mut().ok_or(EngineError::NoActiveRun)
    }

    pub fn start_run(&mut self) -> Result<(), EngineError> {
        self.run_mut()?.start()
    }

    /// Advance the active run and file its result once it finishes
    pub fn tick(&mut self) -> Result<(), EngineError> {
        if let Some(run) = self.run.as_mut() {
            run.tick()?;
        }
        self.record_if_finished();
        Ok(())
    }

    pub fn complete_trial(&mut self, input: Option<InputEvent>) -> Result<(), EngineError> {
        self.run_mut()?.complete_trial(input)?;
        self.record_if_finished();
        Ok(())
    }

    fn record_if_finished(&mut self) {
        if self.result_recorded {
            return;
        }
        if let Some(result) = self.run.as_ref().and_then(TestRun::result) {
            self.session.record_result(result.clone());
            self.result_recorded = true;
        }
    }

    pub fn touch_start(&self, timestamp: u64) -> TouchDisposition {
        self.run
            .as_ref()
            .map(|run| run.touch_start(timestamp))
            .unwrap_or_default()
    }

    pub fn click(&self, button: MouseButton, timestamp: u64) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| run.click(button, timestamp))
    }

    /// Back to instructions; results already filed stay in the session
    pub fn reset_run(&mut self) -> Result<(), EngineError> {
        self.run_mut()?.reset();
        self.result_recorded = false;
        Ok(())
    }

    pub fn current_phase(&self) -> Phase {
        self.run.as_ref().map_or(Phase::Instructions, TestRun::phase)
    }

    pub fn countdown(&self) -> u32 {
        self.run.as_ref().map_or(COUNTDOWN_START, TestRun::countdown)
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.run.as_ref().and_then(TestRun::result)
    }

    pub fn run(&self) -> Option<&TestRun<C>> {
        self.run.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Next test in sequential order, if any remain
    pub fn next_test(&self) -> Option<TestType> {
        self.session.next_missing()
    }
}
