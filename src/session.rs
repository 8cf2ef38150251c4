//! Cross-test progress for one sitting
//!
//! Completed and missing test types always partition the full set of test
//! types. Results are kept in the order the runs finished.

use crate::paradigms::TestType;
use crate::scoring::{calculate_overall_score, PerformanceLevel, TestResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the participant moves between tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Free choice from a dashboard
    #[default]
    Individual,
    /// Fixed order, one after another
    Sequential,
}

impl SessionMode {
    pub fn from_sequential(sequential: bool) -> Self {
        if sequential {
            Self::Sequential
        } else {
            Self::Individual
        }
    }
}

/// Session aggregator
#[derive(Debug, Clone)]
pub struct Session {
    completed: BTreeSet<TestType>,
    missing: BTreeSet<TestType>,
    results: Vec<TestResult>,
    mode: SessionMode,
}

impl Session {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            completed: BTreeSet::new(),
            missing: TestType::ALL.into_iter().collect(),
            results: Vec::new(),
            mode,
        }
    }

    /// Discard progress and history, keeping nothing from the old sitting
    pub fn start_new_session(&mut self, sequential: bool) {
        *self = Self::new(SessionMode::from_sequential(sequential));
        log::info!("new {:?} session started", self.mode);
    }

    /// File a finished run's result
    pub fn record_result(&mut self, result: TestResult) {
        let test_type = result.test_type();
        self.missing.remove(&test_type);
        self.completed.insert(test_type);
        log::info!("{} completed: {:.1}%", test_type, result.percentage());
        self.results.push(result);
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn completed_tests(&self) -> &BTreeSet<TestType> {
        &self.completed
    }

    pub fn missing_tests(&self) -> &BTreeSet<TestType> {
        &self.missing
    }

    pub fn is_completed(&self, test_type: TestType) -> bool {
        self.completed.contains(&test_type)
    }

    /// Results in completion order
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// First missing test in the fixed sequential order
    pub fn next_missing(&self) -> Option<TestType> {
        TestType::ALL.into_iter().find(|t| self.missing.contains(t))
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn overall_score(&self) -> f64 {
        calculate_overall_score(&self.results)
    }

    /// Snapshot for the presentation layer
    pub fn state(&self) -> SessionState {
        let overall_score = self.overall_score();
        SessionState {
            mode: self.mode,
            completed: self.completed.iter().copied().collect(),
            missing: self.missing.iter().copied().collect(),
            results: self.results.clone(),
            overall_score,
            performance_level: PerformanceLevel::from_score(overall_score),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionMode::Individual)
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub mode: SessionMode,
    pub completed: Vec<TestType>,
    pub missing: Vec<TestType>,
    pub results: Vec<TestResult>,
    pub overall_score: f64,
    pub performance_level: PerformanceLevel,
}

impl Default for SessionState {
    /// Safe fallback when no session data is available
    fn default() -> Self {
        Session::default().state()
    }
}
