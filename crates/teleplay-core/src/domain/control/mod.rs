//! Controls: owners of keys and of the state machine that governs them.
//!
//! # How a control resolves an event
//!
//! ```text
//! Event ──► canonicalize key ──► process_event ──► state := event.name
//!                                     │
//!                                ignore? ──yes──► no callbacks
//!                                     │no
//!                                     ▼
//!                  latest_event := event (re-bound as the live event)
//!                                     │
//!                                     ▼
//!                       callbacks registered for event.name
//! ```
//!
//! The shared bookkeeping (keys, alternates, state, callbacks, listing data)
//! lives in [`ControlCore`].  Concrete variants such as
//! [`button::Button`] embed a core and implement the [`Control`] trait, which
//! only asks them for the variant-specific parts: whether an event is a
//! duplicate transition, and how to synthesize a forced release.

pub mod button;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::domain::callback::Callback;
use crate::domain::error::ConfigError;
use crate::domain::event::{Event, EventName, LivenessTracker, Sender};
use crate::domain::listing::ControlData;
use crate::keymap::Key;

/// Which senders a control accepts events from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenderRestriction {
    HostOnly,
    Any,
}

impl SenderRestriction {
    /// The sender roles a control with this restriction claims in the registry.
    pub fn claimed_senders(self) -> &'static [Sender] {
        match self {
            SenderRestriction::HostOnly => &[Sender::Host],
            SenderRestriction::Any => &[Sender::Host, Sender::Player],
        }
    }
}

/// State shared by every control variant.
pub struct ControlCore {
    keys: Vec<Key>,
    sender: SenderRestriction,
    state: EventName,
    latest_event: Event,
    tracker: LivenessTracker,
    alternatives: HashMap<Key, Key>,
    alternative_keys: Vec<Key>,
    state_callbacks: HashMap<EventName, Vec<Callback>>,
    data: ControlData,
}

impl ControlCore {
    /// Creates the core for a control owning `keys`.
    ///
    /// `alternatives`, when non-empty, must have one entry per key: the
    /// alternate physical key that also drives the matching primary key.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateControlKey`] if a key (primary or alternate)
    ///   appears twice.
    /// - [`ConfigError::AlternativeCountMismatch`] if `alternatives` does not
    ///   line up with `keys`.
    pub fn new(
        kind: &'static str,
        keys: Vec<Key>,
        sender: SenderRestriction,
        start_event: Event,
        alternatives: &[Key],
        amount: u32,
    ) -> Result<Self, ConfigError> {
        if !alternatives.is_empty() && alternatives.len() != keys.len() {
            return Err(ConfigError::AlternativeCountMismatch {
                expected: keys.len(),
                actual: alternatives.len(),
            });
        }

        let mut seen: Vec<Key> = Vec::with_capacity(keys.len() + alternatives.len());
        for key in keys.iter().chain(alternatives) {
            if seen.contains(key) {
                return Err(ConfigError::DuplicateControlKey(*key));
            }
            seen.push(*key);
        }

        let mut data = ControlData::new(kind, &keys, amount);
        let mut alternative_map = HashMap::new();
        for (key, alternative) in keys.iter().zip(alternatives) {
            alternative_map.insert(*alternative, *key);
            data.add_alternative(*key, *alternative);
        }

        Ok(Self {
            keys,
            sender,
            state: start_event.name(),
            latest_event: start_event,
            tracker: LivenessTracker::default(),
            alternatives: alternative_map,
            alternative_keys: alternatives.to_vec(),
            state_callbacks: HashMap::new(),
            data,
        })
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Primary keys followed by alternates: every key this control claims.
    pub fn claimed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys.iter().chain(self.alternative_keys.iter()).copied()
    }

    pub fn sender(&self) -> SenderRestriction {
        self.sender
    }

    pub fn state(&self) -> EventName {
        self.state
    }

    pub fn latest_event(&self) -> &Event {
        &self.latest_event
    }

    pub fn data(&self) -> &ControlData {
        &self.data
    }

    /// Rewrites an alternate key to the primary key it stands for.
    pub fn canonicalize(&self, event: Event) -> Event {
        match event.key().and_then(|k| self.alternatives.get(&k)) {
            Some(canonical) => event.with_key(*canonical),
            None => event,
        }
    }

    pub fn add_state_callback(&mut self, name: EventName, callback: Callback) {
        self.state_callbacks.entry(name).or_default().push(callback);
    }

    pub fn add_key_to_has_callbacks(&mut self, key: Key, title: Option<&str>, tier: u8) {
        self.data.add_key_to_has_callbacks(key, title, tier);
    }

    pub fn callbacks_for(&self, name: EventName) -> &[Callback] {
        self.state_callbacks.get(&name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Records the outcome of `process_event` and returns the callbacks to run.
    fn apply(&mut self, ignored: bool, event: Event) -> Resolution {
        // State follows the last delivered event even when it is ignored.
        self.state = event.name();
        if ignored {
            debug!("ignoring duplicate {} for {:?}", event.name(), event.key());
            return Resolution {
                ignored,
                callbacks: Vec::new(),
                event,
            };
        }

        let event = event.with_liveness(self.tracker.bind());
        self.latest_event = event.clone();
        Resolution {
            ignored,
            callbacks: self.callbacks_for(event.name()).to_vec(),
            event,
        }
    }
}

/// What a control made of one event.
#[derive(Debug)]
pub struct Resolution {
    /// The event repeated the current state and changed nothing.
    pub ignored: bool,
    /// Callbacks registered for the new state; empty when `ignored`.
    pub callbacks: Vec<Callback>,
    /// The event as the control saw it, bound as its latest event unless
    /// `ignored`.
    pub event: Event,
}

/// A control variant.
///
/// Implementors provide access to their [`ControlCore`] plus the
/// variant-specific transition rule; resolution is shared.
pub trait Control: fmt::Display + Send {
    fn core(&self) -> &ControlCore;

    fn core_mut(&mut self) -> &mut ControlCore;

    /// Decides whether `event` is a no-op transition.
    ///
    /// Returns `(ignore, event)`; the event may be adjusted by the variant.
    fn process_event(&mut self, event: Event) -> (bool, Event);

    /// Synthesizes a release of the current state, stamped with `time`.
    ///
    /// Returns no callbacks and `None` if there is nothing to release.
    fn release_callbacks_and_event(&mut self, time: i64) -> (Vec<Callback>, Option<Event>);

    /// Resolves an event whose key has already been canonicalized.
    fn resolve(&mut self, event: Event) -> Resolution {
        let (ignore, event) = self.process_event(event);
        self.core_mut().apply(ignore, event)
    }

    /// [`Control::resolve`] without the `ignored` flag.
    fn instance_callbacks(&mut self, event: Event) -> (Vec<Callback>, Event) {
        let resolution = self.resolve(event);
        (resolution.callbacks, resolution.event)
    }

    fn state(&self) -> EventName {
        self.core().state()
    }

    fn latest_event(&self) -> &Event {
        self.core().latest_event()
    }

    fn data(&self) -> &ControlData {
        self.core().data()
    }
}
