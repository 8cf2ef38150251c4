//! Psychomotor Vigilance Task
//!
//! After a random wait a counter appears; respond as fast as possible. The
//! run lasts a fixed amount of active time rather than a fixed trial count.

use crate::config::PvtConfig;
use crate::ledger::Response;
use crate::utils::{mean, MinMaxExt};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Reference RT below which no speed penalty applies
pub const PVT_REFERENCE_RT_MS: f64 = 200.0;

/// One PVT trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvtStimulus {
    /// Foreperiod before the counter appears
    pub wait_ms: u64,
}

/// Duration-bounded PVT trial source
#[derive(Debug, Clone)]
pub struct PvtGenerator {
    config: PvtConfig,
    issued: usize,
}

impl PvtGenerator {
    pub fn new(config: PvtConfig) -> Self {
        Self { config, issued: 0 }
    }

    pub fn config(&self) -> &PvtConfig {
        &self.config
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn restart(&mut self) {
        self.issued = 0;
    }

    /// Next trial unless `elapsed_ms` has reached the run duration
    pub fn next_trial<R: Rng>(&mut self, elapsed_ms: u64, rng: &mut R) -> Option<PvtStimulus> {
        if elapsed_ms >= self.config.duration_ms {
            return None;
        }
        self.issued += 1;

        let low = self.config.min_wait_ms.min(self.config.max_wait_ms);
        let high = self.config.min_wait_ms.max(self.config.max_wait_ms);
        Some(PvtStimulus {
            wait_ms: rng.random_range(low..=high),
        })
    }
}

/// PVT scoring output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvtMetrics {
    pub total_trials: usize,
    pub responded: usize,
    /// Mean RT over responded trials; NaN if none responded
    pub average_reaction_time: f64,
    /// Trials slower than the threshold or without a response
    pub lapses: usize,
    /// Inputs made before the counter appeared
    pub false_starts: usize,
    pub fastest_rt_ms: Option<u64>,
    pub slowest_rt_ms: Option<u64>,
    pub lapse_threshold_ms: u64,
}

impl PvtMetrics {
    pub fn from_responses(responses: &[Response], lapse_threshold_ms: u64) -> Self {
        let mut rts = Vec::new();
        let mut lapses = 0;
        let mut false_starts = 0;
        let mut fastest = None;
        let mut slowest = None;

        for response in responses {
            false_starts += response.anticipations() as usize;
            match response.reaction_time() {
                Some(rt) => {
                    rts.push(rt);
                    fastest.update_min(rt);
                    slowest.update_max(rt);
                    if rt > lapse_threshold_ms {
                        lapses += 1;
                    }
                }
                None => lapses += 1,
            }
        }

        Self {
            total_trials: responses.len(),
            responded: rts.len(),
            average_reaction_time: mean(&rts).unwrap_or(f64::NAN),
            lapses,
            false_starts,
            fastest_rt_ms: fastest,
            slowest_rt_ms: slowest,
            lapse_threshold_ms,
        }
    }

    /// Speed score with a flat per-lapse penalty, in `[0, 100]`.
    ///
    /// NaN when no trial was responded to.
    pub fn score(&self) -> f64 {
        pvt_score(self.average_reaction_time, self.lapses)
    }
}

/// `max(0, 100 - (avg - 200) / 10)`, then `max(0, base - 10 * lapses)`,
/// capped at 100
pub fn pvt_score(average_reaction_time: f64, lapses: usize) -> f64 {
    if average_reaction_time.is_nan() {
        return f64::NAN;
    }
    let base = (100.0 - (average_reaction_time - PVT_REFERENCE_RT_MS) / 10.0).max(0.0);
    (base - lapses as f64 * 10.0).max(0.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paradigms::test_helpers::{pvt, respond, withhold};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn waits_stay_in_configured_range() {
        let mut generator = PvtGenerator::new(PvtConfig::default());
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let trial = generator.next_trial(0, &mut rng).unwrap();
            assert!((2000..=10_000).contains(&trial.wait_ms));
        }
    }

    #[test]
    fn stops_when_duration_elapsed() {
        let mut generator = PvtGenerator::new(PvtConfig {
            duration_ms: 5000,
            ..PvtConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generator.next_trial(4999, &mut rng).is_some());
        assert!(generator.next_trial(5000, &mut rng).is_none());
        assert_eq!(generator.issued(), 1);
    }

    #[test]
    fn example_score_350ms_two_lapses_is_65() {
        assert_eq!(pvt_score(350.0, 2), 65.0);
    }

    #[test]
    fn score_is_clamped_to_0_100() {
        assert_eq!(pvt_score(150.0, 0), 100.0);
        assert_eq!(pvt_score(5000.0, 0), 0.0);
        assert_eq!(pvt_score(250.0, 50), 0.0);
        assert!(pvt_score(f64::NAN, 0).is_nan());
    }

    #[test]
    fn lapses_count_slow_and_missing_responses() {
        let responses = vec![
            respond(0, pvt(3000), 0, 250),
            respond(1, pvt(4000), 0, 501),
            respond(2, pvt(2500), 0, 500),
            withhold(3, pvt(6000), 0),
        ];

        let metrics = PvtMetrics::from_responses(&responses, 500);
        assert_eq!(metrics.total_trials, 4);
        assert_eq!(metrics.responded, 3);
        assert_eq!(metrics.lapses, 2);
        assert_eq!(metrics.fastest_rt_ms, Some(250));
        assert_eq!(metrics.slowest_rt_ms, Some(501));
        assert!((metrics.average_reaction_time - 417.0).abs() < 1e-9);
    }

    #[test]
    fn false_starts_are_summed() {
        let responses = vec![
            respond(0, pvt(3000), 0, 250).with_anticipations(2),
            respond(1, pvt(3000), 0, 260).with_anticipations(1),
        ];
        assert_eq!(PvtMetrics::from_responses(&responses, 500).false_starts, 3);
    }

    #[test]
    fn nothing_responded_scores_nan() {
        let responses = vec![withhold(0, pvt(3000), 0)];
        let metrics = PvtMetrics::from_responses(&responses, 500);
        assert!(metrics.average_reaction_time.is_nan());
        assert_eq!(metrics.lapses, 1);
        assert!(metrics.score().is_nan());
    }
}
