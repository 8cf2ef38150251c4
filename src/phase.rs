//! Run lifecycle: instructions, countdown, test, results
//!
//! Phases only move forward. `test` is reachable solely through a countdown
//! that has ticked all the way to zero; the only way back is `reset`.

use crate::scheduler::{Scheduler, TimerId, TimerKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Countdown value on entering the countdown phase
pub const COUNTDOWN_START: u32 = 3;

/// Time between countdown steps
pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;

/// Phase of a single test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Instructions,
    Countdown,
    Test,
    Results,
}

impl Phase {
    /// The only phase that may follow this one
    pub fn next(&self) -> Option<Self> {
        use Phase::*;
        Some(match self {
            Instructions => Countdown,
            Countdown => Test,
            Test => Results,
            Results => return None,
        })
    }

    /// Participant input is captured in this phase
    pub fn allows_input(&self) -> bool {
        matches!(self, Phase::Test)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Instructions => "instructions",
            Phase::Countdown => "countdown",
            Phase::Test => "test",
            Phase::Results => "results",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transition requested from the wrong phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("cannot {action} during the {phase} phase")]
    InvalidTransition { phase: Phase, action: &'static str },
}

/// Phase sequencer with its countdown
#[derive(Debug)]
pub struct PhaseMachine {
    phase: Phase,
    countdown: u32,
    countdown_tick: Option<TimerId>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Instructions,
            countdown: COUNTDOWN_START,
            countdown_tick: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Remaining countdown steps
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Explicit start: instructions to countdown
    pub fn start(&mut self, scheduler: &mut Scheduler, now: u64) -> Result<(), PhaseError> {
        if self.phase != Phase::Instructions {
            return Err(PhaseError::InvalidTransition {
                phase: self.phase,
                action: "start",
            });
        }
        self.phase = Phase::Countdown;
        self.countdown = COUNTDOWN_START;
        self.countdown_tick = Some(scheduler.schedule_repeating(
            TimerKind::CountdownTick,
            COUNTDOWN_INTERVAL_MS,
            now,
        ));
        log::info!("phase: instructions -> countdown");
        Ok(())
    }

    /// Handle one countdown step. Returns the new phase if the test began.
    pub fn on_countdown_tick(&mut self, scheduler: &mut Scheduler) -> Option<Phase> {
        if self.phase != Phase::Countdown {
            return None;
        }
        self.countdown = self.countdown.saturating_sub(1);
        log::debug!("countdown: {}", self.countdown);

        if self.countdown > 0 {
            return None;
        }
        if let Some(id) = self.countdown_tick.take() {
            scheduler.cancel(id);
        }
        self.phase = Phase::Test;
        log::info!("phase: countdown -> test");
        Some(Phase::Test)
    }

    /// Trial generator reported completion: test to results
    pub fn finish(&mut self) -> Result<(), PhaseError> {
        if self.phase != Phase::Test {
            return Err(PhaseError::InvalidTransition {
                phase: self.phase,
                action: "finish",
            });
        }
        self.phase = Phase::Results;
        log::info!("phase: test -> results");
        Ok(())
    }

    /// Back to instructions from anywhere
    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.countdown_tick.take() {
            scheduler.cancel(id);
        }
        self.phase = Phase::Instructions;
        self.countdown = COUNTDOWN_START;
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(machine: &mut PhaseMachine, scheduler: &mut Scheduler, now: u64) {
        while let Some(fired) = scheduler.pop_due(now) {
            if fired.kind == TimerKind::CountdownTick {
                machine.on_countdown_tick(scheduler);
            }
        }
    }

    #[test]
    fn phase_order_is_fixed() {
        assert_eq!(Phase::Instructions.next(), Some(Phase::Countdown));
        assert_eq!(Phase::Countdown.next(), Some(Phase::Test));
        assert_eq!(Phase::Test.next(), Some(Phase::Results));
        assert_eq!(Phase::Results.next(), None);
    }

    #[test]
    fn only_test_phase_allows_input() {
        assert!(!Phase::Instructions.allows_input());
        assert!(!Phase::Countdown.allows_input());
        assert!(Phase::Test.allows_input());
        assert!(!Phase::Results.allows_input());
    }

    #[test]
    fn countdown_reaches_test_after_exactly_three_ticks() {
        let mut machine = PhaseMachine::new();
        let mut scheduler = Scheduler::new();
        machine.start(&mut scheduler, 0).unwrap();
        assert_eq!(machine.phase(), Phase::Countdown);
        assert_eq!(machine.countdown(), 3);

        run_ticks(&mut machine, &mut scheduler, 1000);
        assert_eq!(machine.countdown(), 2);
        run_ticks(&mut machine, &mut scheduler, 2999);
        assert_eq!(machine.countdown(), 1);
        assert_eq!(machine.phase(), Phase::Countdown);

        run_ticks(&mut machine, &mut scheduler, 3000);
        assert_eq!(machine.countdown(), 0);
        assert_eq!(machine.phase(), Phase::Test);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn catch_up_ticks_stop_at_test() {
        let mut machine = PhaseMachine::new();
        let mut scheduler = Scheduler::new();
        machine.start(&mut scheduler, 0).unwrap();

        run_ticks(&mut machine, &mut scheduler, 10_000);
        assert_eq!(machine.phase(), Phase::Test);
        assert_eq!(machine.countdown(), 0);
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut machine = PhaseMachine::new();
        let mut scheduler = Scheduler::new();

        assert_eq!(
            machine.finish(),
            Err(PhaseError::InvalidTransition {
                phase: Phase::Instructions,
                action: "finish"
            })
        );

        machine.start(&mut scheduler, 0).unwrap();
        assert!(machine.start(&mut scheduler, 0).is_err());
        assert!(machine.finish().is_err());
        assert_eq!(machine.phase(), Phase::Countdown);
    }

    #[test]
    fn stray_tick_outside_countdown_is_ignored() {
        let mut machine = PhaseMachine::new();
        let mut scheduler = Scheduler::new();
        assert_eq!(machine.on_countdown_tick(&mut scheduler), None);
        assert_eq!(machine.countdown(), COUNTDOWN_START);
    }

    #[test]
    fn finish_moves_test_to_results() {
        let mut machine = PhaseMachine::new();
        let mut scheduler = Scheduler::new();
        machine.start(&mut scheduler, 0).unwrap();
        run_ticks(&mut machine, &mut scheduler, 3000);

        machine.finish().unwrap();
        assert_eq!(machine.phase(), Phase::Results);
        assert!(machine.finish().is_err());
    }

    #[test]
    fn reset_from_every_phase_returns_to_instructions() {
        for ticks_to in [None, Some(1000), Some(3000)] {
            let mut machine = PhaseMachine::new();
            let mut scheduler = Scheduler::new();
            if let Some(now) = ticks_to {
                machine.start(&mut scheduler, 0).unwrap();
                run_ticks(&mut machine, &mut scheduler, now);
            }

            machine.reset(&mut scheduler);
            assert_eq!(machine.phase(), Phase::Instructions);
            assert_eq!(machine.countdown(), 3);
            assert_eq!(scheduler.pending(), 0);
        }
    }

    #[test]
    fn phase_error_display() {
        let err = PhaseError::InvalidTransition {
            phase: Phase::Countdown,
            action: "finish",
        };
        assert_eq!(err.to_string(), "cannot finish during the countdown phase");
    }
}
