//! Turns raw keyboard, touch and click input into [`InputEvent`]s

use super::{InputConfig, InputEvent, KeyboardHub, ListenerGuard, MouseButton};
use std::sync::mpsc;

/// What happened to a touch-start on the stimulus surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchDisposition {
    /// An event was emitted
    pub emitted: bool,
    /// The host should swallow the synthetic click and scroll that follow
    pub suppress_default: bool,
}

/// Normalizes the three input modalities into one event stream.
///
/// The keyboard listener is registered with the hub while the normalizer is
/// mounted, enabled and configured for keyboard input, and at no other time.
/// There is at most one registration per normalizer.
pub struct InputNormalizer {
    config: InputConfig,
    enabled: bool,
    tx: mpsc::Sender<InputEvent>,
    hub: Option<KeyboardHub>,
    listener: Option<ListenerGuard>,
}

impl InputNormalizer {
    /// Create an unmounted, disabled normalizer
    pub fn new(config: InputConfig, tx: mpsc::Sender<InputEvent>) -> Self {
        if config.is_inert() {
            log::warn!("input config enables no modality; no input will be captured");
        }
        Self {
            config,
            enabled: false,
            tx,
            hub: None,
            listener: None,
        }
    }

    /// Attach to the keyboard hub. Mounting twice is a no-op.
    pub fn mount(&mut self, hub: &KeyboardHub) {
        if self.hub.is_some() {
            return;
        }
        self.hub = Some(hub.clone());
        self.sync_listener();
    }

    /// Detach from the hub, removing the keyboard listener
    pub fn unmount(&mut self) {
        self.listener = None;
        self.hub = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.hub.is_some()
    }

    /// Swap the configuration, replacing the keyboard registration
    pub fn set_config(&mut self, config: InputConfig) {
        if config.is_inert() {
            log::warn!("input config enables no modality; no input will be captured");
        }
        self.config = config;
        self.listener = None;
        self.sync_listener();
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Gate every modality on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.listener = None;
        self.sync_listener();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True while a keyboard listener is registered with the hub
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    fn sync_listener(&mut self) {
        if self.listener.is_some() || !self.enabled || !self.config.keyboard_enabled() {
            return;
        }
        if let Some(hub) = &self.hub {
            self.listener = Some(hub.register(self.config.allowed_keys(), self.tx.clone()));
        }
    }

    /// Touch-start on the stimulus surface
    pub fn touch_start(&self, timestamp: u64) -> TouchDisposition {
        if !self.enabled || !self.config.touch_enabled() {
            return TouchDisposition::default();
        }
        TouchDisposition {
            emitted: self.tx.send(InputEvent::touch(timestamp)).is_ok(),
            suppress_default: true,
        }
    }

    /// Click on the stimulus surface. Only the primary button counts.
    pub fn click(&self, button: MouseButton, timestamp: u64) -> bool {
        if !self.enabled || !self.config.click_enabled() || button != MouseButton::Primary {
            return false;
        }
        self.tx.send(InputEvent::click(timestamp)).is_ok()
    }
}
