//! Process-wide keyboard target
//!
//! Key presses arrive at the hub regardless of focus, the way a window-level
//! listener would see them. Each registration is tied to a [`ListenerGuard`];
//! dropping the guard removes the listener immediately.

use super::InputEvent;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::mpsc;

struct KeyListener {
    allowed: Vec<String>,
    tx: mpsc::Sender<InputEvent>,
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: BTreeMap<u64, KeyListener>,
}

/// Outcome of dispatching one raw key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDispatch {
    /// Listeners that emitted an event for this key
    pub delivered: usize,
    /// Host default handling should be suppressed (some listener matched)
    pub prevent_default: bool,
}

/// Shared keyboard event target
#[derive(Clone, Default)]
pub struct KeyboardHub {
    inner: Rc<RefCell<HubInner>>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `allowed` keys. Lives as long as the guard.
    pub fn register(&self, allowed: Vec<String>, tx: mpsc::Sender<InputEvent>) -> ListenerGuard {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.insert(id, KeyListener { allowed, tx });
        log::debug!("keyboard listener {} registered", id);

        ListenerGuard {
            id,
            hub: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver a key press to every listener whose allow-list contains it
    pub fn dispatch_key(&self, key: &str, timestamp: u64) -> KeyDispatch {
        let inner = self.inner.borrow();
        let mut dispatch = KeyDispatch::default();

        for listener in inner.listeners.values() {
            if !listener.allowed.iter().any(|k| k == key) {
                continue;
            }
            dispatch.prevent_default = true;
            if listener.tx.send(InputEvent::keyboard(key, timestamp)).is_ok() {
                dispatch.delivered += 1;
            }
        }

        dispatch
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Keeps a hub registration alive
pub struct ListenerGuard {
    id: u64,
    hub: Weak<RefCell<HubInner>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.borrow_mut().listeners.remove(&self.id);
            log::debug!("keyboard listener {} removed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputType;

    #[test]
    fn matched_key_is_delivered_and_prevents_default() {
        let hub = KeyboardHub::new();
        let (tx, rx) = mpsc::channel();
        let _guard = hub.register(vec!["Space".into()], tx);

        let dispatch = hub.dispatch_key("Space", 120);
        assert_eq!(dispatch.delivered, 1);
        assert!(dispatch.prevent_default);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.input_type, InputType::Keyboard);
        assert_eq!(event.key(), Some("Space"));
        assert_eq!(event.timestamp, 120);
    }

    #[test]
    fn unmatched_key_passes_through() {
        let hub = KeyboardHub::new();
        let (tx, rx) = mpsc::channel();
        let _guard = hub.register(vec!["Space".into()], tx);

        let dispatch = hub.dispatch_key("KeyA", 5);
        assert_eq!(dispatch, KeyDispatch::default());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropping_guard_deregisters() {
        let hub = KeyboardHub::new();
        let (tx, rx) = mpsc::channel();
        let guard = hub.register(vec!["Space".into()], tx);
        assert_eq!(hub.listener_count(), 1);

        drop(guard);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.dispatch_key("Space", 1).delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn guard_outliving_hub_is_harmless() {
        let (tx, _rx) = mpsc::channel();
        let guard = {
            let hub = KeyboardHub::new();
            hub.register(vec!["Space".into()], tx)
        };
        drop(guard);
    }
}
