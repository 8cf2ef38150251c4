//! Test paradigms: stimulus types, trial generators and per-paradigm metrics

mod flanker;
mod nback;
mod pvt;
mod sart;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use flanker::{Direction, FlankerGenerator, FlankerMetrics, FlankerStimulus};
pub use nback::{NBackGenerator, NBackMetrics, NBackStimulus};
pub use pvt::{PvtGenerator, PvtMetrics, PvtStimulus};
pub use sart::{SartGenerator, SartMetrics, SartStimulus};

use crate::config::Config;
use crate::input::{InputConfig, InputEvent, KeyboardInput, ToggleInput};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed universe of test types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "sart")]
    Sart,
    #[serde(rename = "flanker")]
    Flanker,
    #[serde(rename = "nback")]
    NBack,
    #[serde(rename = "pvt")]
    Pvt,
}

impl TestType {
    /// Every test type, in the order a sequential session runs them
    pub const ALL: [TestType; 4] = [
        TestType::Sart,
        TestType::Flanker,
        TestType::NBack,
        TestType::Pvt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TestType::Sart => "SART",
            TestType::Flanker => "Flanker",
            TestType::NBack => "N-back",
            TestType::Pvt => "PVT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TestType::Sart => "Respond to every digit except the no-go digit",
            TestType::Flanker => "Press the arrow matching the centre arrow",
            TestType::NBack => "Respond when the letter matches the one n steps back",
            TestType::Pvt => "Respond as fast as possible when the counter appears",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stimulus presented on one trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "paradigm", rename_all = "lowercase")]
pub enum TrialStimulus {
    Sart(SartStimulus),
    Flanker(FlankerStimulus),
    NBack(NBackStimulus),
    Pvt(PvtStimulus),
}

impl TrialStimulus {
    pub fn test_type(&self) -> TestType {
        match self {
            TrialStimulus::Sart(_) => TestType::Sart,
            TrialStimulus::Flanker(_) => TestType::Flanker,
            TrialStimulus::NBack(_) => TestType::NBack,
            TrialStimulus::Pvt(_) => TestType::Pvt,
        }
    }

    /// Whether the correct behaviour is to respond at all
    pub fn expects_response(&self) -> bool {
        match self {
            TrialStimulus::Sart(s) => !s.no_go,
            TrialStimulus::Flanker(_) => true,
            TrialStimulus::NBack(s) => s.target,
            TrialStimulus::Pvt(_) => true,
        }
    }

    /// Expected-correct-response predicate
    pub fn is_correct(&self, input: Option<&InputEvent>) -> bool {
        match self {
            TrialStimulus::Flanker(s) => s.is_correct(input),
            _ => self.expects_response() == input.is_some(),
        }
    }

    /// Delay between trial start and stimulus onset
    pub fn onset_delay_ms(&self) -> u64 {
        match self {
            TrialStimulus::Pvt(s) => s.wait_ms,
            _ => 0,
        }
    }

    /// Short text form for the presentation layer
    pub fn display(&self) -> String {
        match self {
            TrialStimulus::Sart(s) => s.digit.to_string(),
            TrialStimulus::Flanker(s) => s.arrows().to_string(),
            TrialStimulus::NBack(s) => s.letter.to_string(),
            TrialStimulus::Pvt(_) => "0".to_string(),
        }
    }
}

/// Trial source for one run
#[derive(Debug, Clone)]
pub enum TrialGenerator {
    Sart(SartGenerator),
    Flanker(FlankerGenerator),
    NBack(NBackGenerator),
    Pvt(PvtGenerator),
}

impl TrialGenerator {
    /// Build the generator for `test_type` from the paradigm settings
    pub fn for_test(test_type: TestType, config: &Config) -> Self {
        match test_type {
            TestType::Sart => TrialGenerator::Sart(SartGenerator::new(config.sart.clone())),
            TestType::Flanker => {
                TrialGenerator::Flanker(FlankerGenerator::new(config.flanker.clone()))
            }
            TestType::NBack => TrialGenerator::NBack(NBackGenerator::new(config.nback.clone())),
            TestType::Pvt => TrialGenerator::Pvt(PvtGenerator::new(config.pvt.clone())),
        }
    }

    pub fn test_type(&self) -> TestType {
        match self {
            TrialGenerator::Sart(_) => TestType::Sart,
            TrialGenerator::Flanker(_) => TestType::Flanker,
            TrialGenerator::NBack(_) => TestType::NBack,
            TrialGenerator::Pvt(_) => TestType::Pvt,
        }
    }

    /// Next stimulus, or `None` once the run is complete.
    ///
    /// `elapsed_ms` is active test time so far; only duration-bounded
    /// paradigms look at it.
    pub fn next_trial<R: Rng>(&mut self, elapsed_ms: u64, rng: &mut R) -> Option<TrialStimulus> {
        match self {
            TrialGenerator::Sart(g) => g.next_trial(rng).map(TrialStimulus::Sart),
            TrialGenerator::Flanker(g) => g.next_trial(rng).map(TrialStimulus::Flanker),
            TrialGenerator::NBack(g) => g.next_trial(rng).map(TrialStimulus::NBack),
            TrialGenerator::Pvt(g) => g.next_trial(elapsed_ms, rng).map(TrialStimulus::Pvt),
        }
    }

    /// Time allowed for a response after onset
    pub fn response_window_ms(&self) -> u64 {
        match self {
            TrialGenerator::Sart(g) => g.config().response_window_ms,
            TrialGenerator::Flanker(g) => g.config().response_window_ms,
            TrialGenerator::NBack(g) => g.config().response_window_ms,
            TrialGenerator::Pvt(g) => g.config().response_window_ms,
        }
    }

    /// Trials issued so far
    pub fn issued(&self) -> usize {
        match self {
            TrialGenerator::Sart(g) => g.issued(),
            TrialGenerator::Flanker(g) => g.issued(),
            TrialGenerator::NBack(g) => g.issued(),
            TrialGenerator::Pvt(g) => g.issued(),
        }
    }

    /// Planned trial count, if the paradigm is count-bounded
    pub fn planned_trials(&self) -> Option<usize> {
        match self {
            TrialGenerator::Sart(g) => Some(g.config().trials),
            TrialGenerator::Flanker(g) => Some(g.config().trials),
            TrialGenerator::NBack(g) => Some(g.config().trials),
            TrialGenerator::Pvt(_) => None,
        }
    }

    /// Start over with no trials issued
    pub fn restart(&mut self) {
        match self {
            TrialGenerator::Sart(g) => g.restart(),
            TrialGenerator::Flanker(g) => g.restart(),
            TrialGenerator::NBack(g) => g.restart(),
            TrialGenerator::Pvt(g) => g.restart(),
        }
    }
}

/// Input modalities each paradigm listens to
pub fn input_config_for(test_type: TestType, config: &Config) -> InputConfig {
    let toggle = |enabled| Some(ToggleInput { enabled });
    match test_type {
        // Direction needs a key; a bare tap cannot say left or right
        TestType::Flanker => InputConfig {
            keyboard: Some(KeyboardInput::new([
                Direction::Left.key(),
                Direction::Right.key(),
            ])),
            touch: toggle(false),
            click: toggle(false),
        },
        _ => InputConfig {
            keyboard: Some(KeyboardInput::new([config.input.response_key.clone()])),
            touch: toggle(config.input.touch),
            click: toggle(config.input.click),
        },
    }
}

/// Clamp a configured probability into `[0, 1]`
pub(crate) fn probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_type_universe_is_fixed() {
        assert_eq!(TestType::ALL.len(), 4);
        assert_eq!(TestType::ALL[0], TestType::Sart);
        assert_eq!(TestType::NBack.to_string(), "N-back");
    }

    #[test]
    fn correctness_predicate_per_paradigm() {
        let press = InputEvent::keyboard("Space", 10);

        let go = TrialStimulus::Sart(SartStimulus { digit: 5, no_go: false });
        let no_go = TrialStimulus::Sart(SartStimulus { digit: 3, no_go: true });
        assert!(go.is_correct(Some(&press)));
        assert!(!go.is_correct(None));
        assert!(no_go.is_correct(None));
        assert!(!no_go.is_correct(Some(&press)));

        let target = TrialStimulus::NBack(NBackStimulus { letter: 'K', lag: 2, target: true });
        let lure = TrialStimulus::NBack(NBackStimulus { letter: 'B', lag: 2, target: false });
        assert!(target.is_correct(Some(&press)));
        assert!(lure.is_correct(None));

        let pvt = TrialStimulus::Pvt(PvtStimulus { wait_ms: 4000 });
        assert!(pvt.is_correct(Some(&InputEvent::touch(1))));
        assert!(!pvt.is_correct(None));
    }

    #[test]
    fn only_pvt_delays_onset() {
        assert_eq!(TrialStimulus::Pvt(PvtStimulus { wait_ms: 3200 }).onset_delay_ms(), 3200);
        assert_eq!(
            TrialStimulus::Sart(SartStimulus { digit: 1, no_go: false }).onset_delay_ms(),
            0
        );
    }

    #[test]
    fn generator_matches_requested_type() {
        let config = Config::default();
        for test_type in TestType::ALL {
            let generator = TrialGenerator::for_test(test_type, &config);
            assert_eq!(generator.test_type(), test_type);
            assert!(generator.response_window_ms() > 0);
        }
    }

    #[test]
    fn count_bounded_generator_stops_and_restarts() {
        let mut config = Config::default();
        config.sart.trials = 3;
        let mut generator = TrialGenerator::for_test(TestType::Sart, &config);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..3 {
            assert!(generator.next_trial(0, &mut rng).is_some());
        }
        assert!(generator.next_trial(0, &mut rng).is_none());
        assert_eq!(generator.issued(), 3);

        generator.restart();
        assert_eq!(generator.issued(), 0);
        assert!(generator.next_trial(0, &mut rng).is_some());
    }

    #[test]
    fn flanker_listens_to_arrows_only() {
        let input = input_config_for(TestType::Flanker, &Config::default());
        assert_eq!(input.allowed_keys(), vec!["ArrowLeft", "ArrowRight"]);
        assert!(!input.touch_enabled());
        assert!(!input.click_enabled());

        let input = input_config_for(TestType::Pvt, &Config::default());
        assert_eq!(input.allowed_keys(), vec!["Space"]);
        assert!(input.touch_enabled());
    }

    #[test]
    fn probability_is_clamped() {
        assert_eq!(probability(1.5), 1.0);
        assert_eq!(probability(-0.2), 0.0);
        assert_eq!(probability(f64::NAN), 0.0);
        assert_eq!(probability(0.3), 0.3);
    }
}
