//! The [`Event`] value: one input or system occurrence.
//!
//! An event is immutable from the outside.  Inside this crate a control may
//! derive a new event from an old one in three ways, each at most once per
//! event:
//!
//! - [`Event::with_key`] rewrites an alternate key to its canonical key.
//! - [`Event::stamped`] and [`Event::renamed`] turn the latest press into a
//!   synthetic release when a control is force-released.
//!
//! # Liveness
//!
//! Every event answers [`Event::is_active`]: "am I still the latest event of
//! the control that resolved me?".  Long-running callbacks use it to bail out
//! when the button they were started by has since been released.  A control
//! hands out liveness through a [`LivenessTracker`], a shared generation
//! counter: binding a new event bumps the counter, which deactivates every
//! event bound before it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::keymap::Key;

/// Timestamp sentinel for an event whose time has not been resolved yet.
pub const UNRESOLVED_TIME: i64 = -1;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    OnPress,
    OnRelease,
    PlayerConnect,
    PlayerDisconnect,
    HostConnect,
    HostDisconnect,
}

/// Whether an event name carries key input or session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Input,
    System,
}

impl EventName {
    pub fn kind(self) -> EventKind {
        match self {
            EventName::OnPress | EventName::OnRelease => EventKind::Input,
            _ => EventKind::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventName::OnPress => "on_press",
            EventName::OnRelease => "on_release",
            EventName::PlayerConnect => "player_connect",
            EventName::PlayerDisconnect => "player_disconnect",
            EventName::HostConnect => "host_connect",
            EventName::HostDisconnect => "host_disconnect",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the link produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Host,
    Player,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Host => f.write_str("host"),
            Sender::Player => f.write_str("player"),
        }
    }
}

/// The answer to [`Event::is_active`].
#[derive(Clone)]
pub enum Liveness {
    /// A constant answer.  Unresolved events are active; a control's seed
    /// event is never active.
    Fixed(bool),
    /// Active while `latest` still holds `serial`.
    Latest { latest: Arc<AtomicU64>, serial: u64 },
}

impl Liveness {
    fn is_active(&self) -> bool {
        match self {
            Liveness::Fixed(active) => *active,
            Liveness::Latest { latest, serial } => latest.load(Ordering::Acquire) == *serial,
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Liveness::Fixed(true)
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liveness::Fixed(active) => write!(f, "Fixed({active})"),
            Liveness::Latest { serial, .. } => write!(f, "Latest(#{serial}, active={})", self.is_active()),
        }
    }
}

/// Hands out [`Liveness::Latest`] bindings for one control.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    latest: Arc<AtomicU64>,
}

impl LivenessTracker {
    /// Binds a new event as the latest one, deactivating all previous bindings.
    pub fn bind(&self) -> Liveness {
        let serial = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        Liveness::Latest {
            latest: Arc::clone(&self.latest),
            serial,
        }
    }
}

/// One input or system occurrence.
///
/// Equality compares `name`, `sender`, `key` and `time`; liveness is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    name: EventName,
    sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<Key>,
    #[serde(default = "unresolved_time")]
    time: i64,
    #[serde(skip)]
    liveness: Liveness,
}

fn unresolved_time() -> i64 {
    UNRESOLVED_TIME
}

impl Event {
    /// Creates an active key event with an unresolved timestamp.
    pub fn new(name: EventName, sender: Sender, key: Key) -> Self {
        Self {
            name,
            sender,
            key: Some(key),
            time: UNRESOLVED_TIME,
            liveness: Liveness::default(),
        }
    }

    /// Creates an active key event stamped with `time`.
    pub fn at(name: EventName, sender: Sender, key: Key, time: i64) -> Self {
        Self {
            time,
            ..Self::new(name, sender, key)
        }
    }

    /// Creates a keyless system event (connect/disconnect).
    pub fn system(name: EventName, sender: Sender) -> Self {
        Self {
            name,
            sender,
            key: None,
            time: UNRESOLVED_TIME,
            liveness: Liveness::default(),
        }
    }

    /// The start event a control is seeded with: never active, time `-1`.
    pub(crate) fn seed(name: EventName, key: Key) -> Self {
        Self {
            liveness: Liveness::Fixed(false),
            ..Self::new(name, Sender::Host, key)
        }
    }

    pub fn name(&self) -> EventName {
        self.name
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn key(&self) -> Option<Key> {
        self.key
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn kind(&self) -> EventKind {
        self.name.kind()
    }

    /// Whether this is still the latest event of the control that resolved it.
    pub fn is_active(&self) -> bool {
        self.liveness.is_active()
    }

    pub(crate) fn with_key(self, key: Key) -> Self {
        Self {
            key: Some(key),
            ..self
        }
    }

    pub(crate) fn stamped(self, time: i64) -> Self {
        Self { time, ..self }
    }

    pub(crate) fn renamed(self, name: EventName) -> Self {
        Self { name, ..self }
    }

    pub(crate) fn with_liveness(self, liveness: Liveness) -> Self {
        Self { liveness, ..self }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.sender == other.sender
            && self.key == other.key
            && self.time == other.time
    }
}

impl Eq for Event {}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            Some(key) => write!(f, "Event({}, {}, {}, t={})", self.name, self.sender, key, self.time),
            None => write!(f, "Event({}, {}, t={})", self.name, self.sender, self.time),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_is_active_and_unresolved() {
        let event = Event::new(EventName::OnPress, Sender::Player, Key::A);
        assert!(event.is_active());
        assert_eq!(event.time(), UNRESOLVED_TIME);
        assert_eq!(event.kind(), EventKind::Input);
    }

    #[test]
    fn test_seed_event_is_never_active() {
        let event = Event::seed(EventName::OnRelease, Key::A);
        assert!(!event.is_active());
        assert_eq!(event.time(), -1);
        assert_eq!(event.sender(), Sender::Host);
    }

    #[test]
    fn test_system_event_has_no_key() {
        let event = Event::system(EventName::PlayerDisconnect, Sender::Player);
        assert_eq!(event.key(), None);
        assert_eq!(event.kind(), EventKind::System);
    }

    #[test]
    fn test_tracker_binding_deactivates_previous_events() {
        // Arrange
        let tracker = LivenessTracker::default();
        let first = Event::new(EventName::OnPress, Sender::Host, Key::A).with_liveness(tracker.bind());
        assert!(first.is_active());

        // Act
        let second = first.clone().renamed(EventName::OnRelease).with_liveness(tracker.bind());

        // Assert
        assert!(!first.is_active());
        assert!(second.is_active());
    }

    #[test]
    fn test_clones_share_liveness() {
        let tracker = LivenessTracker::default();
        let event = Event::new(EventName::OnPress, Sender::Host, Key::A).with_liveness(tracker.bind());
        let handed_to_callback = event.clone();
        let _newer = tracker.bind();
        assert!(!handed_to_callback.is_active());
    }

    #[test]
    fn test_equality_ignores_liveness() {
        let a = Event::at(EventName::OnPress, Sender::Host, Key::A, 5);
        let b = a.clone().with_liveness(Liveness::Fixed(false));
        assert_eq!(a, b);
        assert_ne!(a, a.clone().stamped(6));
    }

    #[test]
    fn test_event_json_shape() {
        // Arrange
        let event = Event::new(EventName::OnRelease, Sender::Player, Key::Left);

        // Act
        let json = serde_json::to_value(&event).unwrap();

        // Assert
        assert_eq!(
            json,
            serde_json::json!({"name": "on_release", "sender": "player", "key": "LEFT", "time": -1})
        );
    }

    #[test]
    fn test_deserialized_event_defaults_time_and_is_active() {
        let event: Event = serde_json::from_str(r#"{"name":"on_press","sender":"host","key":"W"}"#).unwrap();
        assert_eq!(event.time(), UNRESOLVED_TIME);
        assert_eq!(event.key(), Some(Key::W));
        assert!(event.is_active());
    }
}
