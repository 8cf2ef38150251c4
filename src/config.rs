//! Configuration management for Cognitive TestKit
//!
//! Provides persistent configuration that is automatically saved to and loaded
//! from a platform-specific config file.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/cognitive-testkit/config.toml` |
//! | macOS | `~/Library/Application Support/cognitive-testkit/config.toml` |
//! | Windows | `%APPDATA%\cognitive-testkit\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use cognitive_testkit::Config;
//!
//! // Load existing config or use defaults
//! let mut config = Config::load().unwrap_or_default();
//!
//! // Shorter vigilance run
//! config.pvt.duration_ms = 30_000;
//!
//! // Save to disk
//! config.save().expect("Failed to save config");
//! ```

use crate::input::DEFAULT_KEY;
use crate::scoring::{ScoringParams, DEFAULT_LAPSE_THRESHOLD_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value is outside its usable range
    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("cognitive-testkit");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Settings shared by every run
    #[serde(default)]
    pub general: GeneralConfig,
    /// Response modalities for single-key paradigms
    #[serde(default)]
    pub input: InputSettings,
    /// SART settings
    #[serde(default)]
    pub sart: SartConfig,
    /// Flanker settings
    #[serde(default)]
    pub flanker: FlankerConfig,
    /// N-back settings
    #[serde(default)]
    pub nback: NBackConfig,
    /// PVT settings
    #[serde(default)]
    pub pvt: PvtConfig,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Settings shared by every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Fixed RNG seed for reproducible trial sequences
    #[serde(default)]
    pub seed: Option<u64>,
    /// Gap between one trial resolving and the next starting
    pub inter_trial_interval_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: None,
            inter_trial_interval_ms: 500,
        }
    }
}

/// Response modalities for the single-key paradigms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    /// Key identifier that counts as a response
    pub response_key: String,
    pub touch: bool,
    pub click: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            response_key: DEFAULT_KEY.to_string(),
            touch: true,
            click: true,
        }
    }
}

/// SART configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SartConfig {
    pub trials: usize,
    /// Digit on which the response must be withheld
    pub no_go_digit: u8,
    pub no_go_probability: f64,
    pub response_window_ms: u64,
}

impl Default for SartConfig {
    fn default() -> Self {
        Self {
            trials: 45,
            no_go_digit: 3,
            no_go_probability: 0.11,
            response_window_ms: 1150,
        }
    }
}

/// Flanker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlankerConfig {
    pub trials: usize,
    /// Share of trials whose flankers agree with the target
    pub congruent_ratio: f64,
    pub response_window_ms: u64,
}

impl Default for FlankerConfig {
    fn default() -> Self {
        Self {
            trials: 40,
            congruent_ratio: 0.5,
            response_window_ms: 2000,
        }
    }
}

/// N-back configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NBackConfig {
    /// How many trials back to compare
    pub n: usize,
    pub trials: usize,
    pub target_probability: f64,
    pub response_window_ms: u64,
}

impl Default for NBackConfig {
    fn default() -> Self {
        Self {
            n: 2,
            trials: 30,
            target_probability: 0.3,
            response_window_ms: 2500,
        }
    }
}

/// PVT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvtConfig {
    /// Active test time before the run ends
    pub duration_ms: u64,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    pub response_window_ms: u64,
    /// Responses slower than this are lapses
    pub lapse_threshold_ms: u64,
}

impl Default for PvtConfig {
    fn default() -> Self {
        Self {
            duration_ms: 60_000,
            min_wait_ms: 2000,
            max_wait_ms: 10_000,
            response_window_ms: 3000,
            lapse_threshold_ms: DEFAULT_LAPSE_THRESHOLD_MS,
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Refresh rate for UI updates (in Hz)
    pub refresh_rate_hz: u32,
    /// Color theme (dark/light)
    pub theme: Theme,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 60,
            theme: Theme::Dark,
        }
    }
}

/// Color theme options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings no run could use
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if !(1..=9).contains(&self.sart.no_go_digit) {
            return invalid("sart.no_go_digit", "must be between 1 and 9");
        }
        if self.nback.n == 0 {
            return invalid("nback.n", "must be at least 1");
        }
        for (field, p) in [
            ("sart.no_go_probability", self.sart.no_go_probability),
            ("flanker.congruent_ratio", self.flanker.congruent_ratio),
            ("nback.target_probability", self.nback.target_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(field, "must be between 0 and 1");
            }
        }
        if self.pvt.min_wait_ms > self.pvt.max_wait_ms {
            return invalid("pvt.min_wait_ms", "must not exceed pvt.max_wait_ms");
        }
        if self.input.response_key.trim().is_empty() {
            return invalid("input.response_key", "must not be empty");
        }
        if self.ui.refresh_rate_hz == 0 {
            return invalid("ui.refresh_rate_hz", "must be at least 1");
        }
        Ok(())
    }

    /// Scoring settings derived from the paradigm sections
    pub fn scoring_params(&self) -> ScoringParams {
        ScoringParams {
            lapse_threshold_ms: self.pvt.lapse_threshold_ms,
        }
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.ui.refresh_rate_hz.max(1) as u64)
    }
}
