//! N-back working-memory task
//!
//! A stream of letters; respond when the current letter matches the one shown
//! `n` trials earlier. The score is the recall rate over target trials.
//! False alarms are tracked but do not enter that ratio.

use super::probability;
use crate::config::NBackConfig;
use crate::ledger::Response;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Letter pool; consonants only so no words form
const LETTERS: &[char] = &[
    'B', 'C', 'D', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W',
    'X', 'Z',
];

/// One N-back letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NBackStimulus {
    pub letter: char,
    /// The `n` this letter is compared against
    pub lag: usize,
    /// Matches the letter `lag` trials back
    pub target: bool,
}

/// Fixed-length N-back trial source
#[derive(Debug, Clone)]
pub struct NBackGenerator {
    config: NBackConfig,
    history: Vec<char>,
}

impl NBackGenerator {
    pub fn new(config: NBackConfig) -> Self {
        Self {
            config,
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &NBackConfig {
        &self.config
    }

    pub fn issued(&self) -> usize {
        self.history.len()
    }

    pub fn restart(&mut self) {
        self.history.clear();
    }

    pub fn next_trial<R: Rng>(&mut self, rng: &mut R) -> Option<NBackStimulus> {
        if self.history.len() >= self.config.trials {
            return None;
        }
        let lag = self.config.n.max(1);
        let back = self
            .history
            .len()
            .checked_sub(lag)
            .map(|i| self.history[i]);

        let (letter, target) = match back {
            Some(previous) if rng.random_bool(probability(self.config.target_probability)) => {
                (previous, true)
            }
            Some(previous) => {
                let others: Vec<char> =
                    LETTERS.iter().copied().filter(|c| *c != previous).collect();
                (others[rng.random_range(0..others.len())], false)
            }
            None => (LETTERS[rng.random_range(0..LETTERS.len())], false),
        };

        self.history.push(letter);
        Some(NBackStimulus {
            letter,
            lag,
            target,
        })
    }
}

/// N-back scoring output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NBackMetrics {
    pub total_trials: usize,
    /// Target trials answered correctly
    pub hits: usize,
    /// Target trials with no or an incorrect response
    pub misses: usize,
    /// Responses on non-target trials
    pub false_alarms: usize,
    /// Non-target trials correctly withheld
    pub correct_rejections: usize,
}

impl NBackMetrics {
    pub fn from_responses(responses: &[Response]) -> Self {
        let mut metrics = Self {
            total_trials: responses.len(),
            hits: 0,
            misses: 0,
            false_alarms: 0,
            correct_rejections: 0,
        };

        for response in responses {
            let target = response.stimulus().expects_response();
            match (target, response.correct()) {
                (true, true) => metrics.hits += 1,
                (true, false) => metrics.misses += 1,
                (false, true) => metrics.correct_rejections += 1,
                (false, false) => metrics.false_alarms += 1,
            }
        }
        metrics
    }

    /// `hits / (hits + misses)`; NaN when there were no target trials
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / (self.hits + self.misses) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paradigms::test_helpers::{nback, respond, withhold};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generate(config: NBackConfig, seed: u64) -> Vec<NBackStimulus> {
        let mut generator = NBackGenerator::new(config);
        let mut rng = StdRng::seed_from_u64(seed);
        std::iter::from_fn(|| generator.next_trial(&mut rng)).collect()
    }

    #[test]
    fn target_flag_matches_letter_n_back() {
        let trials = generate(NBackConfig::default(), 99);
        assert_eq!(trials.len(), NBackConfig::default().trials);

        for (i, trial) in trials.iter().enumerate() {
            assert_eq!(trial.lag, 2);
            match i.checked_sub(2) {
                Some(j) => assert_eq!(trial.target, trial.letter == trials[j].letter),
                None => assert!(!trial.target),
            }
        }
    }

    #[test]
    fn certain_targets_repeat_the_lagged_letter() {
        let trials = generate(
            NBackConfig {
                n: 1,
                trials: 6,
                target_probability: 1.0,
                ..NBackConfig::default()
            },
            5,
        );
        assert!(!trials[0].target);
        assert!(trials[1..].iter().all(|t| t.target && t.letter == trials[0].letter));
    }

    #[test]
    fn twenty_targets_fifteen_hits_is_seventy_five_percent() {
        let mut responses = Vec::new();
        for i in 0..20 {
            if i < 15 {
                responses.push(respond(i, nback('K', true), 0, 450));
            } else {
                responses.push(withhold(i, nback('K', true), 0));
            }
        }
        responses.push(respond(20, nback('B', false), 0, 400));
        responses.push(withhold(21, nback('C', false), 0));

        let metrics = NBackMetrics::from_responses(&responses);
        assert_eq!(metrics.hits, 15);
        assert_eq!(metrics.misses, 5);
        assert_eq!(metrics.false_alarms, 1);
        assert_eq!(metrics.correct_rejections, 1);
        assert_eq!(metrics.hit_rate(), 0.75);
    }

    #[test]
    fn no_targets_gives_nan_hit_rate() {
        let responses = vec![withhold(0, nback('B', false), 0)];
        let metrics = NBackMetrics::from_responses(&responses);
        assert!(metrics.hit_rate().is_nan());
    }
}
