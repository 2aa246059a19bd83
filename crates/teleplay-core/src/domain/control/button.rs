//! The two-state [`Button`] control.

use std::fmt;

use crate::domain::callback::Callback;
use crate::domain::control::{Control, ControlCore, SenderRestriction};
use crate::domain::error::ConfigError;
use crate::domain::event::{Event, EventName};
use crate::keymap::Key;

const PRESS_TIER: u8 = 3;
const ANY_TIER: u8 = 2;
const RELEASE_TIER: u8 = 1;

/// Construction options for a [`Button`].
#[derive(Debug, Clone, Copy)]
pub struct ButtonOptions {
    /// A second physical key that drives the same button.
    pub alternative: Option<Key>,
    /// Accept events from the host only, leaving the key free for players.
    pub host_only: bool,
    /// Descriptive amount shown by listings; not interpreted here.
    pub amount: u32,
}

impl Default for ButtonOptions {
    fn default() -> Self {
        Self {
            alternative: None,
            host_only: false,
            amount: 1,
        }
    }
}

/// A push button: `on_release` until pressed, `on_press` until released.
pub struct Button {
    core: ControlCore,
    key: Key,
}

impl Button {
    /// Creates a button owning `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateControlKey`] if the alternative is the
    /// key itself.
    pub fn new(key: Key, options: ButtonOptions) -> Result<Self, ConfigError> {
        let sender = if options.host_only {
            SenderRestriction::HostOnly
        } else {
            SenderRestriction::Any
        };
        let alternatives: Vec<Key> = options.alternative.into_iter().collect();
        let core = ControlCore::new(
            "Button",
            vec![key],
            sender,
            Event::seed(EventName::OnRelease, key),
            &alternatives,
            options.amount,
        )?;
        Ok(Self { core, key })
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Runs `callback` when the button goes down.
    pub fn on_press(&mut self, callback: Callback) -> &mut Self {
        self.core
            .add_key_to_has_callbacks(self.key, callback.title(), PRESS_TIER);
        self.core.add_state_callback(EventName::OnPress, callback);
        self
    }

    /// Runs `callback` when the button comes back up.
    pub fn on_release(&mut self, callback: Callback) -> &mut Self {
        let title = callback.title().map(|t| format!("{t} (release)"));
        self.core
            .add_key_to_has_callbacks(self.key, title.as_deref(), RELEASE_TIER);
        self.core.add_state_callback(EventName::OnRelease, callback);
        self
    }

    /// Runs `callback` on both edges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CallbackMissingEvent`] if `callback` does not
    /// take the event; without it the callback could not tell the edges apart.
    pub fn on_any(&mut self, callback: Callback) -> Result<&mut Self, ConfigError> {
        if !callback.takes_event() {
            return Err(ConfigError::CallbackMissingEvent {
                registration: "on_any",
                title: callback.title().unwrap_or("<untitled>").to_string(),
            });
        }
        self.core
            .add_key_to_has_callbacks(self.key, callback.title(), ANY_TIER);
        self.core
            .add_state_callback(EventName::OnPress, callback.clone());
        self.core.add_state_callback(EventName::OnRelease, callback);
        Ok(self)
    }

    pub fn is_pressed(&self) -> bool {
        self.core.state() == EventName::OnPress
    }

    pub fn is_released(&self) -> bool {
        self.core.state() == EventName::OnRelease
    }
}

impl Control for Button {
    fn core(&self) -> &ControlCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ControlCore {
        &mut self.core
    }

    fn process_event(&mut self, event: Event) -> (bool, Event) {
        (self.core.state() == event.name(), event)
    }

    fn release_callbacks_and_event(&mut self, time: i64) -> (Vec<Callback>, Option<Event>) {
        if self.is_released() {
            return (Vec::new(), None);
        }
        let release = self
            .core
            .latest_event()
            .clone()
            .stamped(time)
            .renamed(EventName::OnRelease);
        let (callbacks, event) = self.instance_callbacks(release);
        (callbacks, Some(event))
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.core.sender() {
            SenderRestriction::Any => write!(f, "Button({})", self.key),
            SenderRestriction::HostOnly => write!(f, "Button({}, host_only)", self.key),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
