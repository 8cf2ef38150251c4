//! Eriksen flanker task
//!
//! A row of five arrows; the centre arrow decides the correct key and the
//! four flankers either agree with it (congruent) or point the other way.

use super::probability;
use crate::config::FlankerConfig;
use crate::input::InputEvent;
use crate::ledger::Response;
use crate::utils::{mean, variance};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Arrow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Key identifier that answers this direction
    pub fn key(&self) -> &'static str {
        match self {
            Direction::Left => "ArrowLeft",
            Direction::Right => "ArrowRight",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// One flanker display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlankerStimulus {
    /// Centre arrow
    pub target: Direction,
    pub congruent: bool,
}

impl FlankerStimulus {
    pub fn flanker(&self) -> Direction {
        if self.congruent {
            self.target
        } else {
            self.target.opposite()
        }
    }

    pub fn arrows(&self) -> &'static str {
        match (self.target, self.congruent) {
            (Direction::Left, true) => "<<<<<",
            (Direction::Right, true) => ">>>>>",
            (Direction::Left, false) => ">><>>",
            (Direction::Right, false) => "<<><<",
        }
    }

    /// Correct only for the key matching the centre arrow
    pub fn is_correct(&self, input: Option<&InputEvent>) -> bool {
        input.and_then(InputEvent::key) == Some(self.target.key())
    }
}

/// Fixed-length flanker trial source
#[derive(Debug, Clone)]
pub struct FlankerGenerator {
    config: FlankerConfig,
    issued: usize,
}

impl FlankerGenerator {
    pub fn new(config: FlankerConfig) -> Self {
        Self { config, issued: 0 }
    }

    pub fn config(&self) -> &FlankerConfig {
        &self.config
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn restart(&mut self) {
        self.issued = 0;
    }

    pub fn next_trial<R: Rng>(&mut self, rng: &mut R) -> Option<FlankerStimulus> {
        if self.issued >= self.config.trials {
            return None;
        }
        self.issued += 1;

        let target = if rng.random_bool(0.5) {
            Direction::Left
        } else {
            Direction::Right
        };
        Some(FlankerStimulus {
            target,
            congruent: rng.random_bool(probability(self.config.congruent_ratio)),
        })
    }
}

/// Flanker scoring output.
///
/// Only `accuracy` feeds the overall score; the RT figures are reported
/// alongside and cover correct trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlankerMetrics {
    pub total_trials: usize,
    pub correct: usize,
    /// `correct / total_trials`; NaN with no trials
    pub accuracy: f64,
    pub mean_rt_ms: Option<f64>,
    pub rt_variance: Option<f64>,
    pub congruent_mean_rt_ms: Option<f64>,
    pub incongruent_mean_rt_ms: Option<f64>,
    /// Incongruent minus congruent mean RT
    pub interference_ms: Option<f64>,
}

impl FlankerMetrics {
    pub fn from_responses(responses: &[Response]) -> Self {
        let mut correct = 0;
        let mut all = Vec::new();
        let mut congruent = Vec::new();
        let mut incongruent = Vec::new();

        for response in responses {
            if !response.correct() {
                continue;
            }
            correct += 1;
            let (Some(rt), super::TrialStimulus::Flanker(stimulus)) =
                (response.reaction_time(), response.stimulus())
            else {
                continue;
            };
            all.push(rt);
            if stimulus.congruent {
                congruent.push(rt);
            } else {
                incongruent.push(rt);
            }
        }

        let congruent_mean_rt_ms = mean(&congruent);
        let incongruent_mean_rt_ms = mean(&incongruent);
        Self {
            total_trials: responses.len(),
            correct,
            accuracy: correct as f64 / responses.len() as f64,
            mean_rt_ms: mean(&all),
            rt_variance: variance(&all),
            congruent_mean_rt_ms,
            incongruent_mean_rt_ms,
            interference_ms: incongruent_mean_rt_ms
                .zip(congruent_mean_rt_ms)
                .map(|(i, c)| i - c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paradigms::test_helpers::{flanker, respond_with, withhold};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn arrows_put_target_in_the_centre() {
        for target in [Direction::Left, Direction::Right] {
            for congruent in [true, false] {
                let stimulus = FlankerStimulus { target, congruent };
                let arrows: Vec<char> = stimulus.arrows().chars().collect();
                let centre = if target == Direction::Left { '<' } else { '>' };
                assert_eq!(arrows[2], centre);
                assert_eq!(arrows[0] == centre, congruent);
            }
        }
    }

    #[test]
    fn only_matching_arrow_key_is_correct() {
        let stimulus = FlankerStimulus {
            target: Direction::Left,
            congruent: false,
        };
        assert!(stimulus.is_correct(Some(&InputEvent::keyboard("ArrowLeft", 1))));
        assert!(!stimulus.is_correct(Some(&InputEvent::keyboard("ArrowRight", 1))));
        assert!(!stimulus.is_correct(Some(&InputEvent::click(1))));
        assert!(!stimulus.is_correct(None));
        assert_eq!(stimulus.flanker(), Direction::Right);
    }

    #[test]
    fn congruent_ratio_extremes() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut generator = FlankerGenerator::new(FlankerConfig {
            trials: 10,
            congruent_ratio: 0.0,
            ..FlankerConfig::default()
        });
        while let Some(trial) = generator.next_trial(&mut rng) {
            assert!(!trial.congruent);
        }
        assert_eq!(generator.issued(), 10);
    }

    #[test]
    fn metrics_split_rt_by_congruency() {
        let responses = vec![
            respond_with(0, flanker(Direction::Left, true), 0, "ArrowLeft", 400),
            respond_with(1, flanker(Direction::Right, true), 0, "ArrowRight", 500),
            respond_with(2, flanker(Direction::Left, false), 0, "ArrowLeft", 600),
            respond_with(3, flanker(Direction::Right, false), 0, "ArrowLeft", 300),
            withhold(4, flanker(Direction::Right, false), 0),
        ];

        let metrics = FlankerMetrics::from_responses(&responses);
        assert_eq!(metrics.total_trials, 5);
        assert_eq!(metrics.correct, 3);
        assert!((metrics.accuracy - 0.6).abs() < 1e-9);
        assert_eq!(metrics.mean_rt_ms, Some(500.0));
        assert_eq!(metrics.congruent_mean_rt_ms, Some(450.0));
        assert_eq!(metrics.incongruent_mean_rt_ms, Some(600.0));
        assert_eq!(metrics.interference_ms, Some(150.0));
        let var = metrics.rt_variance.unwrap();
        assert!((var - 20_000.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn empty_run_metrics() {
        let metrics = FlankerMetrics::from_responses(&[]);
        assert!(metrics.accuracy.is_nan());
        assert_eq!(metrics.mean_rt_ms, None);
        assert_eq!(metrics.interference_ms, None);
    }
}
