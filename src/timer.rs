//! Per-run stopwatch
//!
//! Measures reaction time from the current trial's onset and total run
//! duration. The 100ms display tick only refreshes the elapsed value shown to
//! the participant; scoring always reads the clock directly.

use crate::clock::Clock;
use crate::scheduler::{Scheduler, TimerId, TimerKind};

/// Display refresh interval for the elapsed-time readout
pub const DISPLAY_TICK_MS: u64 = 100;

/// Clock or lifecycle misuse detected while reading a timer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingError {
    #[error("run duration read before the timer was started")]
    NotStarted,
    #[error("reaction time read before any trial started")]
    TrialNotStarted,
    #[error("negative reaction time: response at {response}ms precedes onset at {onset}ms")]
    NegativeReactionTime { onset: u64, response: u64 },
    #[error("clock went backwards: read {now}ms after a start at {start}ms")]
    ClockWentBackwards { start: u64, now: u64 },
}

/// Reaction-time and run-duration stopwatch
#[derive(Debug)]
pub struct TrialTimer<C: Clock> {
    clock: C,
    start_time: Option<u64>,
    trial_start_time: Option<u64>,
    elapsed_display_ms: u64,
    display_tick: Option<TimerId>,
}

impl<C: Clock> TrialTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            start_time: None,
            trial_start_time: None,
            elapsed_display_ms: 0,
            display_tick: None,
        }
    }

    /// Record the run epoch and begin the display tick
    pub fn start(&mut self, scheduler: &mut Scheduler) {
        let now = self.clock.now_ms();
        self.stop(scheduler);
        self.start_time = Some(now);
        self.trial_start_time = None;
        self.elapsed_display_ms = 0;
        self.display_tick =
            Some(scheduler.schedule_repeating(TimerKind::DisplayTick, DISPLAY_TICK_MS, now));
    }

    /// Record a trial onset and return it
    pub fn start_trial(&mut self) -> u64 {
        let now = self.clock.now_ms();
        self.trial_start_time = Some(now);
        now
    }

    /// Onset of the current trial, if one has started
    pub fn trial_start_time(&self) -> Option<u64> {
        self.trial_start_time
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    /// Milliseconds since the current trial's onset. Does not reset anything.
    pub fn reaction_time(&self) -> Result<u64, TimingError> {
        self.reaction_time_at(self.clock.now_ms())
    }

    /// Latency of a response captured at `timestamp`
    pub fn reaction_time_at(&self, timestamp: u64) -> Result<u64, TimingError> {
        let onset = self.trial_start_time.ok_or(TimingError::TrialNotStarted)?;
        timestamp
            .checked_sub(onset)
            .ok_or(TimingError::NegativeReactionTime {
                onset,
                response: timestamp,
            })
    }

    /// Milliseconds since `start()`
    pub fn duration(&self) -> Result<u64, TimingError> {
        let start = self.start_time.ok_or(TimingError::NotStarted)?;
        let now = self.clock.now_ms();
        now.checked_sub(start)
            .ok_or(TimingError::ClockWentBackwards { start, now })
    }

    /// Handle a display tick
    pub fn on_display_tick(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed_display_ms = self.clock.now_ms().saturating_sub(start);
        }
    }

    /// Elapsed time as of the last display tick
    pub fn elapsed_display_ms(&self) -> u64 {
        self.elapsed_display_ms
    }

    pub fn is_running(&self) -> bool {
        self.display_tick.is_some()
    }

    /// Halt the display tick. Timestamps are kept.
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.display_tick.take() {
            scheduler.cancel(id);
        }
    }

    /// Stop and forget every timestamp
    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.stop(scheduler);
        self.start_time = None;
        self.trial_start_time = None;
        self.elapsed_display_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn timer() -> (TrialTimer<ManualClock>, ManualClock, Scheduler) {
        let clock = ManualClock::starting_at(1_000);
        (TrialTimer::new(clock.clone()), clock, Scheduler::new())
    }

    #[test]
    fn reads_before_start_are_errors() {
        let (timer, _, _) = timer();
        assert_eq!(timer.duration(), Err(TimingError::NotStarted));
        assert_eq!(timer.reaction_time(), Err(TimingError::TrialNotStarted));
    }

    #[test]
    fn reaction_time_is_idempotent_read() {
        let (mut timer, clock, mut scheduler) = timer();
        timer.start(&mut scheduler);
        clock.advance(500);
        timer.start_trial();
        clock.advance(312);

        assert_eq!(timer.reaction_time(), Ok(312));
        assert_eq!(timer.reaction_time(), Ok(312));
        assert_eq!(timer.duration(), Ok(812));
    }

    #[test]
    fn response_before_onset_is_a_defect() {
        let (mut timer, clock, mut scheduler) = timer();
        timer.start(&mut scheduler);
        clock.advance(200);
        let onset = timer.start_trial();

        assert_eq!(
            timer.reaction_time_at(onset - 1),
            Err(TimingError::NegativeReactionTime {
                onset,
                response: onset - 1
            })
        );
        assert_eq!(timer.reaction_time_at(onset + 250), Ok(250));
    }

    /// Clock whose reading can be rewound, unlike `ManualClock`
    #[derive(Clone)]
    struct RewindableClock(std::rc::Rc<std::cell::Cell<u64>>);

    impl Clock for RewindableClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn duration_detects_clock_going_backwards() {
        let clock = RewindableClock(Default::default());
        clock.0.set(1_000);
        let mut scheduler = Scheduler::new();
        let mut timer = TrialTimer::new(clock.clone());
        timer.start(&mut scheduler);
        clock.0.set(400);

        assert_eq!(
            timer.duration(),
            Err(TimingError::ClockWentBackwards {
                start: 1_000,
                now: 400
            })
        );
    }

    #[test]
    fn display_tick_updates_elapsed_every_100ms() {
        let (mut timer, clock, mut scheduler) = timer();
        timer.start(&mut scheduler);

        clock.advance(350);
        let mut ticks = 0;
        while let Some(fired) = scheduler.pop_due(clock.now_ms()) {
            assert_eq!(fired.kind, TimerKind::DisplayTick);
            timer.on_display_tick();
            ticks += 1;
        }
        assert_eq!(ticks, 3);
        assert_eq!(timer.elapsed_display_ms(), 350);
    }

    #[test]
    fn stop_cancels_tick_and_reset_zeroes() {
        let (mut timer, clock, mut scheduler) = timer();
        timer.start(&mut scheduler);
        timer.start_trial();
        timer.stop(&mut scheduler);

        assert!(!timer.is_running());
        assert_eq!(scheduler.pending(), 0);
        assert!(timer.duration().is_ok());

        timer.reset(&mut scheduler);
        clock.advance(100);
        assert_eq!(timer.duration(), Err(TimingError::NotStarted));
        assert_eq!(timer.trial_start_time(), None);
        assert_eq!(timer.elapsed_display_ms(), 0);
    }

    #[test]
    fn restart_keeps_a_single_display_tick() {
        let (mut timer, _, mut scheduler) = timer();
        timer.start(&mut scheduler);
        timer.start(&mut scheduler);
        assert_eq!(scheduler.pending(), 1);
    }
}
