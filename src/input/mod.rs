//! Input capture and normalization
//!
//! Keyboard, touch and click input all end up as a single stream of
//! [`InputEvent`]s delivered over an `mpsc` channel.

mod config;
mod event;
mod hub;
mod normalizer;

pub use config::{InputConfig, KeyboardInput, ToggleInput, DEFAULT_KEY};
pub use event::{InputEvent, InputType, MouseButton};
pub use hub::{KeyDispatch, KeyboardHub, ListenerGuard};
pub use normalizer::{InputNormalizer, TouchDisposition};
