//! Sustained Attention to Response Task
//!
//! Digits 1-9 appear one at a time. Respond to every digit except the no-go
//! digit. Two error kinds matter: responding to the no-go digit (commission)
//! and missing a go digit (omission). Both count against accuracy through each
//! trial's `correct` flag.

use super::probability;
use crate::config::SartConfig;
use crate::ledger::Response;
use crate::utils::mean;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One SART digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SartStimulus {
    pub digit: u8,
    /// Withhold the response on this trial
    pub no_go: bool,
}

/// Fixed-length SART trial source
#[derive(Debug, Clone)]
pub struct SartGenerator {
    config: SartConfig,
    issued: usize,
}

impl SartGenerator {
    pub fn new(config: SartConfig) -> Self {
        Self { config, issued: 0 }
    }

    pub fn config(&self) -> &SartConfig {
        &self.config
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn restart(&mut self) {
        self.issued = 0;
    }

    pub fn next_trial<R: Rng>(&mut self, rng: &mut R) -> Option<SartStimulus> {
        if self.issued >= self.config.trials {
            return None;
        }
        self.issued += 1;

        let no_go_digit = self.config.no_go_digit.clamp(1, 9);
        if rng.random_bool(probability(self.config.no_go_probability)) {
            return Some(SartStimulus {
                digit: no_go_digit,
                no_go: true,
            });
        }

        let go_digits: Vec<u8> = (1..=9).filter(|d| *d != no_go_digit).collect();
        let digit = go_digits[rng.random_range(0..go_digits.len())];
        Some(SartStimulus {
            digit,
            no_go: false,
        })
    }
}

/// SART scoring output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SartMetrics {
    pub total_trials: usize,
    pub correct: usize,
    /// Responded on a no-go trial
    pub commission_errors: usize,
    /// Missed a go trial
    pub omission_errors: usize,
    /// `correct / total_trials`; NaN with no trials
    pub accuracy: f64,
    /// Mean RT over responded go trials
    pub mean_go_rt_ms: Option<f64>,
}

impl SartMetrics {
    pub fn from_responses(responses: &[Response]) -> Self {
        let mut metrics = Self {
            total_trials: responses.len(),
            correct: 0,
            commission_errors: 0,
            omission_errors: 0,
            accuracy: f64::NAN,
            mean_go_rt_ms: None,
        };
        let mut go_rts = Vec::new();

        for response in responses {
            if response.correct() {
                metrics.correct += 1;
            }
            let expects = response.stimulus().expects_response();
            match (expects, response.reaction_time()) {
                (false, Some(_)) => metrics.commission_errors += 1,
                (true, None) => metrics.omission_errors += 1,
                (true, Some(rt)) => go_rts.push(rt),
                (false, None) => {}
            }
        }

        metrics.accuracy = metrics.correct as f64 / metrics.total_trials as f64;
        metrics.mean_go_rt_ms = mean(&go_rts);
        metrics
    }
}
