//! Per-modality input configuration

use serde::{Deserialize, Serialize};

/// Key used when keyboard input is enabled without an explicit allow-list
pub const DEFAULT_KEY: &str = "Space";

/// Keyboard modality settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardInput {
    pub enabled: bool,
    /// Allowed key identifiers. Empty means [`DEFAULT_KEY`] only.
    #[serde(default)]
    pub keys: Vec<String>,
}

impl KeyboardInput {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Effective allow-list
    pub fn allowed_keys(&self) -> Vec<String> {
        if self.keys.is_empty() {
            vec![DEFAULT_KEY.to_string()]
        } else {
            self.keys.clone()
        }
    }
}

/// On/off switch for the touch and click modalities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleInput {
    pub enabled: bool,
}

/// Which modalities a test listens to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Absent means keyboard input is off
    #[serde(default)]
    pub keyboard: Option<KeyboardInput>,
    /// Absent means touch input is on
    #[serde(default)]
    pub touch: Option<ToggleInput>,
    /// Absent means click input is on
    #[serde(default)]
    pub click: Option<ToggleInput>,
}

impl InputConfig {
    /// Keyboard on with the given allow-list, touch and click on
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyboard: Some(KeyboardInput::new(keys)),
            ..Self::default()
        }
    }

    pub fn keyboard_enabled(&self) -> bool {
        self.keyboard.as_ref().is_some_and(|k| k.enabled)
    }

    pub fn touch_enabled(&self) -> bool {
        self.touch.map_or(true, |t| t.enabled)
    }

    pub fn click_enabled(&self) -> bool {
        self.click.map_or(true, |c| c.enabled)
    }

    /// Allowed keys, or empty if the keyboard is off
    pub fn allowed_keys(&self) -> Vec<String> {
        match &self.keyboard {
            Some(k) if k.enabled => k.allowed_keys(),
            _ => Vec::new(),
        }
    }

    /// True when no modality can ever produce an event
    pub fn is_inert(&self) -> bool {
        !self.keyboard_enabled() && !self.touch_enabled() && !self.click_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keyboard_off_pointer_on() {
        let config = InputConfig::default();
        assert!(!config.keyboard_enabled());
        assert!(config.touch_enabled());
        assert!(config.click_enabled());
        assert!(config.allowed_keys().is_empty());
    }

    #[test]
    fn empty_key_list_falls_back_to_default_key() {
        let config = InputConfig::with_keys(Vec::<String>::new());
        assert_eq!(config.allowed_keys(), vec![DEFAULT_KEY.to_string()]);
    }

    #[test]
    fn explicit_keys_replace_default() {
        let config = InputConfig::with_keys(["ArrowLeft", "ArrowRight"]);
        assert_eq!(config.allowed_keys(), vec!["ArrowLeft", "ArrowRight"]);
    }

    #[test]
    fn disabled_keyboard_has_no_keys() {
        let mut config = InputConfig::with_keys(["Space"]);
        config.keyboard.as_mut().unwrap().enabled = false;
        assert!(config.allowed_keys().is_empty());
    }

    #[test]
    fn all_modalities_off_is_inert() {
        let config = InputConfig {
            keyboard: None,
            touch: Some(ToggleInput { enabled: false }),
            click: Some(ToggleInput { enabled: false }),
        };
        assert!(config.is_inert());
        assert!(!InputConfig::default().is_inert());
    }

    #[test]
    fn deserializes_from_toml() {
        let config: InputConfig = toml::from_str(
            r#"
[keyboard]
enabled = true
keys = ["KeyJ"]

[click]
enabled = false
"#,
        )
        .expect("Failed to deserialize");

        assert_eq!(config.allowed_keys(), vec!["KeyJ"]);
        assert!(!config.click_enabled());
        assert!(config.touch_enabled());
    }
}
