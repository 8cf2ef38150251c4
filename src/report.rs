//! Session report and export functionality

use crate::identity::UserIdentity;
use crate::paradigms::TestType;
use crate::scoring::{TestMetrics, TestResult};
use crate::session::{SessionMode, SessionState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Complete session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: SessionSummary,
    /// Results in completion order
    pub results: Vec<ResultEntry>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Session duration in seconds
    pub duration_secs: f64,
}

/// Session summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: SessionMode,
    /// Participant id, when one is associated with the session
    pub participant: Option<String>,
    pub completed: Vec<TestType>,
    pub missing: Vec<TestType>,
    pub overall_score: f64,
    pub performance_level: String,
}

/// Single result entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEntry {
    pub test_type: TestType,
    pub completed_at: String,
    /// Paradigm percentage; absent when the run had nothing to score
    pub percentage: Option<f64>,
    pub metrics: TestMetrics,
}

impl From<&TestResult> for ResultEntry {
    fn from(result: &TestResult) -> Self {
        Self {
            test_type: result.test_type(),
            completed_at: result.completed_at.to_rfc3339(),
            percentage: Some(result.percentage()).filter(|p| !p.is_nan()),
            metrics: result.metrics.clone(),
        }
    }
}

impl SessionReport {
    /// Create a new session report
    pub fn new(
        start_time: Instant,
        state: &SessionState,
        participant: Option<&UserIdentity>,
    ) -> Self {
        let duration_secs = start_time.elapsed().as_secs_f64();
        let now: DateTime<Utc> = Utc::now();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                duration_secs,
            },
            summary: SessionSummary {
                mode: state.mode,
                participant: participant.map(|u| u.id.clone()),
                completed: state.completed.clone(),
                missing: state.missing.clone(),
                overall_score: state.overall_score,
                performance_level: state.performance_level.label().to_string(),
            },
            results: state.results.iter().map(ResultEntry::from).collect(),
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary for the terminal
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Cognitive TestKit report ({})", self.metadata.generated_at);
        if let Some(id) = &self.summary.participant {
            let _ = writeln!(out, "Participant: {}", id);
        }
        let _ = writeln!(
            out,
            "Overall: {:.1} ({})",
            self.summary.overall_score, self.summary.performance_level
        );

        for entry in &self.results {
            match entry.percentage {
                Some(p) => {
                    let _ = writeln!(out, "  {:<8} {:>6.1}%", entry.test_type.name(), p);
                }
                None => {
                    let _ = writeln!(out, "  {:<8}    n/a", entry.test_type.name());
                }
            }
        }

        if !self.summary.missing.is_empty() {
            let missing: Vec<&str> = self.summary.missing.iter().map(TestType::name).collect();
            let _ = writeln!(out, "Not taken: {}", missing.join(", "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paradigms::NBackMetrics;
    use crate::session::Session;

    fn session_with(hits: usize, misses: usize) -> Session {
        let mut session = Session::default();
        session.record_result(TestResult::new(
            Utc::now(),
            TestMetrics::NBack(NBackMetrics {
                total_trials: hits + misses,
                hits,
                misses,
                false_alarms: 1,
                correct_rejections: 4,
            }),
        ));
        session
    }

    #[test]
    fn report_summarizes_session() {
        let session = session_with(15, 5);
        let user = UserIdentity {
            id: "p-004".to_string(),
        };
        let report = SessionReport::new(Instant::now(), &session.state(), Some(&user));

        assert_eq!(report.summary.overall_score, 75.0);
        assert_eq!(report.summary.performance_level, "Good");
        assert_eq!(report.summary.participant.as_deref(), Some("p-004"));
        assert_eq!(report.summary.missing.len(), 3);
        assert_eq!(report.results[0].percentage, Some(75.0));
    }

    #[test]
    fn unscorable_result_has_no_percentage() {
        let session = session_with(0, 0);
        let report = SessionReport::new(Instant::now(), &session.state(), None);

        assert_eq!(report.results[0].percentage, None);
        assert_eq!(report.summary.overall_score, 0.0);
        assert!(report.to_text().contains("n/a"));
    }

    #[test]
    fn json_export_carries_metrics() {
        let report = SessionReport::new(Instant::now(), &session_with(3, 1).state(), None);
        let json = report.to_json().unwrap();

        assert!(json.contains("\"test_type\": \"nback\""));
        assert!(json.contains("\"false_alarms\": 1"));
        assert!(json.contains("\"performance_level\""));
    }

    #[test]
    fn export_json_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "cognitive-testkit-report-{}.json",
            std::process::id()
        ));
        let report = SessionReport::new(Instant::now(), &session_with(2, 2).state(), None);
        report.export_json(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"overall_score\": 50.0"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn text_lists_missing_tests() {
        let text = SessionReport::new(Instant::now(), &session_with(1, 0).state(), None).to_text();
        assert!(text.contains("Overall: 100.0 (Excellent)"));
        assert!(text.contains("Not taken: SART, Flanker, PVT"));
    }
}
