//! Cognitive TestKit - timed cognitive assessments in the terminal
//!
//! Runs the SART, Flanker, N-back and PVT paradigms: sequences each run
//! through instructions, countdown, trials and results, measures reaction
//! times against an injectable clock, and scores the responses into
//! per-test metrics and an overall performance level.

pub mod clock;
pub mod config;
pub mod engine;
pub mod identity;
pub mod input;
pub mod ledger;
pub mod paradigms;
pub mod phase;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod ui;
pub mod utils;

pub use config::Config;
pub use engine::{Assessment, EngineError, TestRun};
