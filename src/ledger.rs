//! Per-run response record
//!
//! One [`Response`] per presented trial, appended in trial order. The ledger
//! never edits or reorders entries; a reset swaps in an empty ledger.

use crate::input::{InputEvent, InputType};
use crate::paradigms::TrialStimulus;
use crate::scoring::TestResult;
use crate::timer::TimingError;
use serde::Serialize;

/// Outcome of a single trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    trial_index: usize,
    stimulus: TrialStimulus,
    stimulus_onset: u64,
    response_timestamp: Option<u64>,
    reaction_time: Option<u64>,
    input_type: Option<InputType>,
    correct: bool,
    anticipations: u32,
}

impl Response {
    /// Build the record for a trial, answered by `input` or timed out.
    ///
    /// Reaction time is `input.timestamp - onset`; an input stamped before the
    /// onset is a timing defect and is rejected.
    pub fn record(
        trial_index: usize,
        stimulus: TrialStimulus,
        stimulus_onset: u64,
        input: Option<&InputEvent>,
    ) -> Result<Self, TimingError> {
        let reaction_time = match input {
            Some(event) => Some(event.timestamp.checked_sub(stimulus_onset).ok_or(
                TimingError::NegativeReactionTime {
                    onset: stimulus_onset,
                    response: event.timestamp,
                },
            )?),
            None => None,
        };
        let correct = stimulus.is_correct(input);

        Ok(Self {
            trial_index,
            stimulus,
            stimulus_onset,
            response_timestamp: input.map(|e| e.timestamp),
            reaction_time,
            input_type: input.map(|e| e.input_type),
            correct,
            anticipations: 0,
        })
    }

    /// Attach the number of inputs made before onset
    pub fn with_anticipations(mut self, count: u32) -> Self {
        self.anticipations = count;
        self
    }

    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    pub fn stimulus(&self) -> &TrialStimulus {
        &self.stimulus
    }

    pub fn stimulus_onset(&self) -> u64 {
        self.stimulus_onset
    }

    /// Present exactly when `reaction_time` is
    pub fn response_timestamp(&self) -> Option<u64> {
        self.response_timestamp
    }

    pub fn reaction_time(&self) -> Option<u64> {
        self.reaction_time
    }

    pub fn input_type(&self) -> Option<InputType> {
        self.input_type
    }

    pub fn correct(&self) -> bool {
        self.correct
    }

    pub fn anticipations(&self) -> u32 {
        self.anticipations
    }
}

/// Ledger append rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("trial {got} recorded out of order; expected trial {expected}")]
    OutOfOrder { expected: usize, got: usize },
}

/// Append-only response list for the active run
#[derive(Debug, Default)]
pub struct ResponseLedger {
    responses: Vec<Response>,
    result: Option<TestResult>,
}

impl ResponseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next trial's response. Indices must be gapless from 0.
    pub fn add_response(&mut self, response: Response) -> Result<(), LedgerError> {
        let expected = self.responses.len();
        if response.trial_index != expected {
            return Err(LedgerError::OutOfOrder {
                expected,
                got: response.trial_index,
            });
        }
        log::debug!(
            "trial {} recorded: rt={:?} correct={}",
            response.trial_index,
            response.reaction_time,
            response.correct
        );
        self.responses.push(response);
        Ok(())
    }

    /// Responses in trial order
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Index the next appended response must carry
    pub fn next_trial_index(&self) -> usize {
        self.responses.len()
    }

    /// Score the accumulated responses and keep the result
    pub fn calculate_and_set_result<F>(&mut self, score: F) -> &TestResult
    where
        F: FnOnce(&[Response]) -> TestResult,
    {
        self.result.insert(score(&self.responses))
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// Replace with an empty ledger and drop any cached result
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
