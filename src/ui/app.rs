//! Main application state and logic

use super::theme::ThemeColors;
use super::widgets::{ResultRow, RowStatus, StimulusView};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::Assessment;
use crate::identity::{EnvIdentity, IdentityContext};
use crate::input::{KeyDispatch, MouseButton};
use crate::paradigms::{TestType, TrialStimulus};
use crate::phase::Phase;
use crate::report::SessionReport;
use crate::scoring::{get_performance_level, TestMetrics, TestResult};
use crate::session::SessionMode;
use std::path::Path;
use std::time::Instant;

/// Current view/tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Dashboard,
    Sart,
    Flanker,
    NBack,
    Pvt,
    Help,
}

impl AppView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Help => "Help",
            _ => self.test_type().map_or("", |t| t.name()),
        }
    }

    pub fn all() -> &'static [AppView] {
        &[
            Self::Dashboard,
            Self::Sart,
            Self::Flanker,
            Self::NBack,
            Self::Pvt,
            Self::Help,
        ]
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Dashboard => 0,
            Self::Sart => 1,
            Self::Flanker => 2,
            Self::NBack => 3,
            Self::Pvt => 4,
            Self::Help => 5,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Dashboard,
            1 => Self::Sart,
            2 => Self::Flanker,
            3 => Self::NBack,
            4 => Self::Pvt,
            _ => Self::Help,
        }
    }

    /// Paradigm shown in this view, if any
    pub fn test_type(&self) -> Option<TestType> {
        match self {
            Self::Sart => Some(TestType::Sart),
            Self::Flanker => Some(TestType::Flanker),
            Self::NBack => Some(TestType::NBack),
            Self::Pvt => Some(TestType::Pvt),
            Self::Dashboard | Self::Help => None,
        }
    }

    pub fn for_test(test_type: TestType) -> Self {
        match test_type {
            TestType::Sart => Self::Sart,
            TestType::Flanker => Self::Flanker,
            TestType::NBack => Self::NBack,
            TestType::Pvt => Self::Pvt,
        }
    }
}

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Main application
pub struct App {
    /// Current view
    pub view: AppView,
    /// Application state
    pub state: AppState,
    /// Configuration
    pub config: Config,
    pub colors: ThemeColors,
    clock: SystemClock,
    assessment: Assessment<SystemClock>,
    identity: IdentityContext<SystemClock, EnvIdentity>,
    /// Application start time
    pub start_time: Instant,
    /// Last status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let clock = SystemClock::new();
        Self {
            view: AppView::Dashboard,
            state: AppState::Running,
            colors: ThemeColors::from_theme(config.ui.theme),
            assessment: Assessment::new(config.clone(), clock.clone()),
            identity: IdentityContext::new(clock.clone(), EnvIdentity),
            clock,
            config,
            start_time: Instant::now(),
            status_message: None,
            status_time: None,
        }
    }

    pub fn assessment(&self) -> &Assessment<SystemClock> {
        &self.assessment
    }

    /// Switch views. Entering a test view prepares a fresh run.
    pub fn select_view(&mut self, view: AppView) {
        if view == self.view && self.assessment.run().is_some() {
            return;
        }
        self.view = view;
        match view.test_type() {
            Some(test_type) => {
                if let Err(e) = self.assessment.begin_test(test_type) {
                    self.assessment.end_test();
                    self.set_status(e.to_string());
                }
            }
            None => self.assessment.end_test(),
        }
    }

    /// Switch to the next view
    pub fn next_view(&mut self) {
        let next = (self.view.index() + 1) % AppView::all().len();
        self.select_view(AppView::from_index(next));
    }

    /// Switch to the previous view
    pub fn prev_view(&mut self) {
        let current = self.view.index();
        let prev = if current == 0 {
            AppView::all().len() - 1
        } else {
            current - 1
        };
        self.select_view(AppView::from_index(prev));
    }

    /// Enter: start from instructions, move on from results
    pub fn confirm(&mut self) {
        match self.assessment.current_phase() {
            Phase::Instructions if self.assessment.run().is_some() => {
                if let Err(e) = self.assessment.start_run() {
                    self.set_status(e.to_string());
                }
            }
            Phase::Results => match self.assessment.next_test() {
                Some(next) if self.assessment.session().mode() == SessionMode::Sequential => {
                    self.select_view(AppView::for_test(next));
                }
                _ => self.select_view(AppView::Dashboard),
            },
            _ => {}
        }
    }

    /// Forward a key press to the keyboard hub
    pub fn key_press(&mut self, key: &str) -> KeyDispatch {
        let now = self.clock.now_ms();
        self.assessment.hub().dispatch_key(key, now)
    }

    /// Primary click on the stimulus panel
    pub fn click(&mut self, button: MouseButton) -> bool {
        let now = self.clock.now_ms();
        self.assessment.click(button, now)
    }

    /// Advance timers and captured input
    pub fn tick(&mut self) {
        let was_finished = self.assessment.result().is_some();
        if let Err(e) = self.assessment.tick() {
            log::error!("run failed: {}", e);
            self.set_status(format!("Run error: {}", e));
            self.assessment.end_test();
        }
        if !was_finished {
            if let Some(result) = self.assessment.result() {
                let msg = format!("{} complete: {:.1}%", result.test_type(), result.percentage());
                self.set_status(msg);
            }
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Reset current test
    pub fn reset_current(&mut self) {
        if self.assessment.reset_run().is_ok() {
            self.set_status(format!("{} reset", self.view.name()));
        }
    }

    /// Discard all progress and start over
    pub fn new_session(&mut self, sequential: bool) {
        self.assessment.start_session(sequential);
        self.identity.invalidate();
        if sequential {
            self.view = AppView::Dashboard;
            self.select_view(AppView::Sart);
            self.set_status("Sequential session started".to_string());
        } else {
            self.select_view(AppView::Dashboard);
            self.set_status("New session started".to_string());
        }
    }

    /// Set a status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_time = Some(Instant::now());
    }

    /// Get status message if still valid (within 3 seconds)
    pub fn get_status(&self) -> Option<&str> {
        match (&self.status_message, self.status_time) {
            (Some(msg), Some(time)) if time.elapsed().as_secs() < 3 => Some(msg),
            _ => None,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        self.assessment.current_phase().name()
    }

    /// What the stimulus panel should show
    pub fn stimulus_view(&self) -> StimulusView {
        let Some(run) = self.assessment.run() else {
            return StimulusView::Blank;
        };
        match run.phase() {
            Phase::Instructions => StimulusView::Instructions {
                title: run.test_type().name().to_string(),
                description: run.test_type().description().to_string(),
                controls: match run.test_type() {
                    TestType::Flanker => "Left / Right arrow".to_string(),
                    _ => format!("{} or click", self.config.input.response_key),
                },
            },
            Phase::Countdown => StimulusView::Countdown(run.countdown()),
            Phase::Test => match run.current_stimulus() {
                Some(TrialStimulus::Pvt(_)) => {
                    StimulusView::Stimulus(run.stimulus_elapsed_ms().unwrap_or(0).to_string())
                }
                Some(stimulus) => StimulusView::Stimulus(stimulus.display()),
                None => StimulusView::Blank,
            },
            Phase::Results => {
                let score = run.result().map_or(f64::NAN, TestResult::percentage);
                StimulusView::Finished {
                    score,
                    level: get_performance_level(score),
                }
            }
        }
    }

    /// Rows for the results panel of the current view
    pub fn current_rows(&mut self) -> Vec<ResultRow> {
        match self.view {
            AppView::Dashboard => self.dashboard_rows(),
            AppView::Help => Vec::new(),
            _ => self.run_rows(),
        }
    }

    fn dashboard_rows(&mut self) -> Vec<ResultRow> {
        let state = self.assessment.session_state();
        let mut rows = vec![
            ResultRow::info("Mode", format!("{:?}", state.mode)),
            ResultRow::info(
                "Participant",
                self.identity
                    .current_user()
                    .map_or_else(|| "anonymous".to_string(), |u| u.id.clone()),
            ),
        ];

        for test_type in TestType::ALL {
            let latest = state
                .results
                .iter()
                .rev()
                .find(|r| r.test_type() == test_type);
            rows.push(match latest {
                Some(result) => ResultRow::score(test_type.name(), result.percentage()),
                None => ResultRow::info(test_type.name(), "not taken"),
            });
        }

        let overall = ResultRow::score("Overall", state.overall_score);
        rows.push(ResultRow {
            value: format!("{} ({})", overall.value, state.performance_level),
            ..overall
        });
        if let Some(next) = self.assessment.next_test() {
            rows.push(ResultRow::info("Next", next.name()));
        }
        rows
    }

    fn run_rows(&self) -> Vec<ResultRow> {
        let Some(run) = self.assessment.run() else {
            return Vec::new();
        };
        if let Some(result) = run.result() {
            return metric_rows(result);
        }

        let mut rows = vec![ResultRow::info("Phase", run.phase().name())];
        let trials = match run.planned_trials() {
            Some(planned) => format!("{} / {}", run.responses().len(), planned),
            None => run.responses().len().to_string(),
        };
        rows.push(ResultRow::info("Trials", trials));
        if run.phase() == Phase::Test {
            rows.push(ResultRow::info(
                "Elapsed",
                format!("{:.1}s", run.elapsed_display_ms() as f64 / 1000.0),
            ));
        }
        if let Some(last) = run.responses().last() {
            let (status, verdict) = if last.correct() {
                (RowStatus::Good, "correct")
            } else {
                (RowStatus::Poor, "incorrect")
            };
            let rt = last
                .reaction_time()
                .map_or_else(|| "no response".to_string(), |rt| format!("{} ms", rt));
            rows.push(ResultRow::new("Last", format!("{}, {}", verdict, rt), status));
        }
        rows
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Generate a session report
    pub fn generate_report(&mut self) -> SessionReport {
        let participant = self.identity.current_user().cloned();
        SessionReport::new(
            self.start_time,
            &self.assessment.session_state(),
            participant.as_ref(),
        )
    }

    /// Export session report to JSON file
    pub fn export_report(&mut self, filename: &str) -> Result<String, std::io::Error> {
        let report = self.generate_report();
        report.export_json(Path::new(filename))?;
        let msg = format!("Exported to {}", filename);
        self.set_status(msg.clone());
        Ok(msg)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn ms(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.0} ms", v))
}

/// Detailed rows for a finished run
fn metric_rows(result: &TestResult) -> Vec<ResultRow> {
    let mut rows = vec![ResultRow::score("Score", result.percentage())];
    match &result.metrics {
        TestMetrics::Sart(m) => {
            rows.push(ResultRow::info("Trials", m.total_trials.to_string()));
            rows.push(ResultRow::info("Commission errors", m.commission_errors.to_string()));
            rows.push(ResultRow::info("Omission errors", m.omission_errors.to_string()));
            rows.push(ResultRow::info("Mean go RT", ms(m.mean_go_rt_ms)));
        }
        TestMetrics::Flanker(m) => {
            rows.push(ResultRow::info("Trials", m.total_trials.to_string()));
            rows.push(ResultRow::info("Mean RT", ms(m.mean_rt_ms)));
            rows.push(ResultRow::info("Congruent RT", ms(m.congruent_mean_rt_ms)));
            rows.push(ResultRow::info("Incongruent RT", ms(m.incongruent_mean_rt_ms)));
            rows.push(ResultRow::info("Interference", ms(m.interference_ms)));
        }
        TestMetrics::NBack(m) => {
            rows.push(ResultRow::info("Hits", m.hits.to_string()));
            rows.push(ResultRow::info("Misses", m.misses.to_string()));
            rows.push(ResultRow::info("False alarms", m.false_alarms.to_string()));
            rows.push(ResultRow::info("Correct rejections", m.correct_rejections.to_string()));
        }
        TestMetrics::Pvt(m) => {
            rows.push(ResultRow::info("Trials", m.total_trials.to_string()));
            let average = Some(m.average_reaction_time).filter(|v| !v.is_nan());
            rows.push(ResultRow::info("Average RT", ms(average)));
            let lapse_status = if m.lapses == 0 {
                RowStatus::Good
            } else {
                RowStatus::Warning
            };
            rows.push(ResultRow::new("Lapses", m.lapses.to_string(), lapse_status));
            rows.push(ResultRow::info("False starts", m.false_starts.to_string()));
            if let (Some(fast), Some(slow)) = (m.fastest_rt_ms, m.slowest_rt_ms) {
                rows.push(ResultRow::info("Range", format!("{}-{} ms", fast, slow)));
            }
        }
    }
    rows
}
