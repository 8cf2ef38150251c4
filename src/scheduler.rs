//! Cooperative timer registry
//!
//! The scheduler never sleeps and never calls back. The owner asks it for the
//! next due timer with [`Scheduler::pop_due`] and dispatches that fire itself,
//! one at a time, so a handler that cancels a later timer takes effect before
//! that timer can be popped.

/// Identifier handed out for every scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One countdown step (1000ms)
    CountdownTick,
    /// Coarse elapsed-time refresh for display (100ms)
    DisplayTick,
    /// PVT wait interval finished; show the stimulus
    StimulusOnset,
    /// Response window closed without a response
    TrialTimeout,
    /// Inter-trial gap finished; generate the next trial
    NextTrial,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    /// Scheduled due time, not the time it was popped
    pub due_at: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    kind: TimerKind,
    due_at: u64,
    interval: Option<u64>,
}

/// Passive timer registry owned by a single run
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: TimerKind, due_at: u64, interval: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            kind,
            due_at,
            interval,
        });
        id
    }

    /// Fire once, `delay_ms` after `now`
    pub fn schedule_once(&mut self, kind: TimerKind, delay_ms: u64, now: u64) -> TimerId {
        self.insert(kind, now + delay_ms, None)
    }

    /// Fire every `interval_ms`, first at `now + interval_ms`.
    ///
    /// A zero interval is bumped to 1ms so popping always terminates.
    pub fn schedule_repeating(&mut self, kind: TimerKind, interval_ms: u64, now: u64) -> TimerId {
        let interval = interval_ms.max(1);
        self.insert(kind, now + interval, Some(interval))
    }

    /// Remove a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Number of live timers
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_at).min()
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Ties go to the timer registered first. Repeating timers are re-armed at
    /// `due_at + interval`, so catching up after a long gap yields one fire per
    /// elapsed interval.
    pub fn pop_due(&mut self, now: u64) -> Option<Fired> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_at <= now)
            .min_by_key(|(_, e)| (e.due_at, e.id))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[index];
        let fired = Fired {
            id: entry.id,
            kind: entry.kind,
            due_at: entry.due_at,
        };

        match entry.interval {
            Some(interval) => entry.due_at += interval,
            None => {
                self.entries.remove(index);
            }
        }

        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_timer_fires_exactly_once() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(TimerKind::TrialTimeout, 500, 0);

        assert!(scheduler.pop_due(499).is_none());
        let fired = scheduler.pop_due(500).unwrap();
        assert_eq!(fired.kind, TimerKind::TrialTimeout);
        assert_eq!(fired.due_at, 500);
        assert!(scheduler.pop_due(10_000).is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn next_due_reports_earliest_pending() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_due(), None);

        scheduler.schedule_once(TimerKind::TrialTimeout, 900, 100);
        scheduler.schedule_repeating(TimerKind::DisplayTick, 100, 100);
        assert_eq!(scheduler.next_due(), Some(200));
    }

    #[test]
    fn repeating_timer_catches_up_one_fire_per_interval() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TimerKind::CountdownTick, 1000, 0);

        let mut fires = Vec::new();
        while let Some(f) = scheduler.pop_due(3000) {
            fires.push(f.due_at);
        }
        assert_eq!(fires, vec![1000, 2000, 3000]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn earliest_due_pops_first_and_ties_keep_registration_order() {
        let mut scheduler = Scheduler::new();
        let late = scheduler.schedule_once(TimerKind::TrialTimeout, 300, 0);
        let first = scheduler.schedule_once(TimerKind::StimulusOnset, 100, 0);
        let second = scheduler.schedule_once(TimerKind::NextTrial, 100, 0);

        assert_eq!(scheduler.pop_due(1000).unwrap().id, first);
        assert_eq!(scheduler.pop_due(1000).unwrap().id, second);
        assert_eq!(scheduler.pop_due(1000).unwrap().id, late);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_repeating(TimerKind::DisplayTick, 100, 0);

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.pop_due(1000).is_none());
    }

    #[test]
    fn cancel_leaves_other_timers() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.schedule_repeating(TimerKind::DisplayTick, 100, 0);
        scheduler.schedule_once(TimerKind::TrialTimeout, 150, 0);

        assert!(scheduler.cancel(tick));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.pop_due(150).map(|f| f.kind), Some(TimerKind::TrialTimeout));
    }

    #[test]
    fn zero_interval_does_not_spin() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(TimerKind::DisplayTick, 0, 0);

        let mut count = 0;
        while scheduler.pop_due(5).is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
    }
}
