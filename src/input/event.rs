//! Normalized input event types

use serde::{Deserialize, Serialize};

/// Which modality produced an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Keyboard,
    Touch,
    Click,
}

/// Pointer button for click input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// A single user response with its capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Modality that produced the event
    pub input_type: InputType,
    /// Key identifier, keyboard events only
    pub key: Option<String>,
    /// Capture time in clock milliseconds
    pub timestamp: u64,
    /// Always true; the event represents a response
    pub has_response: bool,
}

impl InputEvent {
    pub fn keyboard(key: impl Into<String>, timestamp: u64) -> Self {
        Self {
            input_type: InputType::Keyboard,
            key: Some(key.into()),
            timestamp,
            has_response: true,
        }
    }

    pub fn touch(timestamp: u64) -> Self {
        Self {
            input_type: InputType::Touch,
            key: None,
            timestamp,
            has_response: true,
        }
    }

    pub fn click(timestamp: u64) -> Self {
        Self {
            input_type: InputType::Click,
            key: None,
            timestamp,
            has_response: true,
        }
    }

    /// Key identifier if this came from the keyboard
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
