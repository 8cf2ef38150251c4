//! Per-paradigm scoring and the cross-test aggregate
//!
//! Every scoring function is a pure function of a complete response sequence.
//! A paradigm with no valid denominator scores NaN, and NaN scores are
//! dropped from the aggregate rather than shown.

use crate::ledger::Response;
use crate::paradigms::{FlankerMetrics, NBackMetrics, PvtMetrics, SartMetrics, TestType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default PVT lapse threshold
pub const DEFAULT_LAPSE_THRESHOLD_MS: u64 = 500;

/// Scoring settings that are not part of the response data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringParams {
    pub lapse_threshold_ms: u64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            lapse_threshold_ms: DEFAULT_LAPSE_THRESHOLD_MS,
        }
    }
}

/// Paradigm-specific metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test_type", rename_all = "lowercase")]
pub enum TestMetrics {
    Sart(SartMetrics),
    Flanker(FlankerMetrics),
    NBack(NBackMetrics),
    Pvt(PvtMetrics),
}

/// Scored outcome of one completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub completed_at: DateTime<Utc>,
    pub metrics: TestMetrics,
}

impl TestResult {
    pub fn new(completed_at: DateTime<Utc>, metrics: TestMetrics) -> Self {
        Self {
            completed_at,
            metrics,
        }
    }

    pub fn test_type(&self) -> TestType {
        match self.metrics {
            TestMetrics::Sart(_) => TestType::Sart,
            TestMetrics::Flanker(_) => TestType::Flanker,
            TestMetrics::NBack(_) => TestType::NBack,
            TestMetrics::Pvt(_) => TestType::Pvt,
        }
    }

    /// The paradigm's percentage on a 0-100 scale, NaN if undefined
    pub fn percentage(&self) -> f64 {
        match &self.metrics {
            TestMetrics::Sart(m) => m.accuracy * 100.0,
            TestMetrics::Flanker(m) => m.accuracy * 100.0,
            TestMetrics::NBack(m) => m.hit_rate() * 100.0,
            TestMetrics::Pvt(m) => m.score(),
        }
    }

    pub fn is_scorable(&self) -> bool {
        !self.percentage().is_nan()
    }
}

/// Score a response sequence with the paradigm's own formula
pub fn score(
    test_type: TestType,
    responses: &[Response],
    params: &ScoringParams,
    completed_at: DateTime<Utc>,
) -> TestResult {
    let metrics = match test_type {
        TestType::Sart => TestMetrics::Sart(SartMetrics::from_responses(responses)),
        TestType::Flanker => TestMetrics::Flanker(FlankerMetrics::from_responses(responses)),
        TestType::NBack => TestMetrics::NBack(NBackMetrics::from_responses(responses)),
        TestType::Pvt => TestMetrics::Pvt(PvtMetrics::from_responses(
            responses,
            params.lapse_threshold_ms,
        )),
    };
    TestResult::new(completed_at, metrics)
}

/// Mean paradigm percentage over results that have one; 0 if none do
pub fn calculate_overall_score(results: &[TestResult]) -> f64 {
    let valid: Vec<f64> = results
        .iter()
        .map(TestResult::percentage)
        .filter(|p| !p.is_nan())
        .collect();

    if valid.is_empty() {
        return 0.0;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Four-tier label for an aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    /// Lower bounds are inclusive: 90, 75, 60
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::Excellent,
            s if s >= 75.0 => Self::Good,
            s if s >= 60.0 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for a score, e.g. `"Good"` for 75
pub fn get_performance_level(score: f64) -> &'static str {
    PerformanceLevel::from_score(score).label()
}
