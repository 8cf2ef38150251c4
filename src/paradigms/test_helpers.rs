//! Shared test utilities for paradigm and scoring modules
//!
//! Builds stimuli and ledger responses without running a full test.

use super::{
    Direction, FlankerStimulus, NBackStimulus, PvtStimulus, SartStimulus, TrialStimulus,
};
use crate::input::{InputEvent, DEFAULT_KEY};
use crate::ledger::Response;

pub fn sart(digit: u8, no_go: bool) -> TrialStimulus {
    TrialStimulus::Sart(SartStimulus { digit, no_go })
}

pub fn flanker(target: Direction, congruent: bool) -> TrialStimulus {
    TrialStimulus::Flanker(FlankerStimulus { target, congruent })
}

pub fn nback(letter: char, target: bool) -> TrialStimulus {
    TrialStimulus::NBack(NBackStimulus {
        letter,
        lag: 2,
        target,
    })
}

pub fn pvt(wait_ms: u64) -> TrialStimulus {
    TrialStimulus::Pvt(PvtStimulus { wait_ms })
}

/// Response with the default key, `rt_ms` after onset
pub fn respond(index: usize, stimulus: TrialStimulus, onset: u64, rt_ms: u64) -> Response {
    respond_with(index, stimulus, onset, DEFAULT_KEY, rt_ms)
}

/// Response with a specific key, `rt_ms` after onset
pub fn respond_with(
    index: usize,
    stimulus: TrialStimulus,
    onset: u64,
    key: &str,
    rt_ms: u64,
) -> Response {
    let input = InputEvent::keyboard(key, onset + rt_ms);
    Response::record(index, stimulus, onset, Some(&input)).expect("valid response timing")
}

/// Trial that timed out without a response
pub fn withhold(index: usize, stimulus: TrialStimulus, onset: u64) -> Response {
    Response::record(index, stimulus, onset, None).expect("valid response timing")
}
