//! Engine: owns the controls and routes each event to the one that owns its key.
//!
//! The engine lives in one of two phases.  During [`EnginePhase::Setup`]
//! controls are registered and their keys claimed in the
//! [`ControlRegistry`]; once [`Engine::start`] is called the set of controls
//! is frozen and events can be handled.

use std::time::Duration;

use teleplay_core::{ConfigError, Control, ControlData, ControlId, ControlRegistry, Event, EventKind};
use tracing::{debug, info, warn};

use crate::application::dispatch::{CallbackDispatcher, DispatchError};

/// Lifecycle phase of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Setup,
    Running,
}

/// What happened to an event handed to [`Engine::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A control accepted the event and `callbacks` callbacks were run.
    Dispatched { control: ControlId, callbacks: usize },
    /// The owning control treated the event as a duplicate transition.
    Ignored { control: ControlId },
    /// No control owns the key for this sender, or the event carries no key.
    Unowned,
}

/// The routing and dispatch engine.
pub struct Engine {
    phase: EnginePhase,
    registry: ControlRegistry,
    controls: Vec<Box<dyn Control>>,
    dispatcher: CallbackDispatcher,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            phase: EnginePhase::Setup,
            registry: ControlRegistry::new(),
            controls: Vec::new(),
            dispatcher: CallbackDispatcher::new(),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Adds a control and claims all of its keys.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::RegistrationClosed`] once the engine has started.
    /// - [`ConfigError::DuplicateKeyOwner`] if another control already owns
    ///   one of its `(key, sender)` pairs.  The control is not added.
    pub fn register<C: Control + 'static>(&mut self, control: C) -> Result<ControlId, ConfigError> {
        let label = control.to_string();
        if self.phase == EnginePhase::Running {
            return Err(ConfigError::RegistrationClosed(label));
        }

        let id = ControlId(self.controls.len());
        let core = control.core();
        self.registry
            .register_control(core.claimed_keys(), core.sender(), id, &label)?;

        debug!("registered {label} as {id:?}");
        self.controls.push(Box::new(control));
        Ok(id)
    }

    /// Freezes the control set.  Calling it twice is harmless.
    pub fn start(&mut self) {
        if self.phase == EnginePhase::Setup {
            info!("engine started with {} control(s)", self.controls.len());
            self.phase = EnginePhase::Running;
        }
    }

    pub fn control(&self, id: ControlId) -> Option<&dyn Control> {
        self.controls.get(id.0).map(|c| c.as_ref())
    }

    pub fn controls(&self) -> impl Iterator<Item = &dyn Control> + '_ {
        self.controls.iter().map(|c| c.as_ref())
    }

    /// Listing data for every registered control, in registration order.
    pub fn control_datas(&self) -> Vec<ControlData> {
        self.controls.iter().map(|c| c.data().clone()).collect()
    }

    /// Resolves `event` to its control, advances the control's state machine
    /// and runs the resulting callbacks.
    ///
    /// System events carry no key and are never owned by a control.
    ///
    /// # Errors
    ///
    /// Returns the first synchronous callback failure.  The control's state
    /// has already advanced when that happens.
    pub fn handle_event(&mut self, event: Event) -> Result<Outcome, DispatchError> {
        let key = match (event.kind(), event.key()) {
            (EventKind::Input, Some(key)) => key,
            _ => return Ok(Outcome::Unowned),
        };
        let Some(id) = self.registry.resolve(key, event.sender()) else {
            debug!("no control handles {key} from {}", event.sender());
            return Ok(Outcome::Unowned);
        };
        let Some(control) = self.controls.get_mut(id.0) else {
            return Ok(Outcome::Unowned);
        };

        let event = control.core().canonicalize(event);
        let resolution = control.resolve(event);
        if resolution.ignored {
            return Ok(Outcome::Ignored { control: id });
        }

        self.dispatcher.execute(&resolution.callbacks, &resolution.event)?;
        Ok(Outcome::Dispatched {
            control: id,
            callbacks: resolution.callbacks.len(),
        })
    }

    /// Force-releases every pressed control at `time` and runs the release
    /// callbacks.
    ///
    /// Every control is released even if an earlier one's callbacks fail.
    ///
    /// # Errors
    ///
    /// Returns the first callback failure encountered.
    pub fn release_all(&mut self, time: i64) -> Result<usize, DispatchError> {
        let mut released = 0;
        let mut first_error = None;

        for control in &mut self.controls {
            let (callbacks, event) = control.release_callbacks_and_event(time);
            let Some(event) = event else { continue };
            released += 1;
            debug!("force-released {control} at {time}");
            if let Err(e) = self.dispatcher.execute(&callbacks, &event) {
                warn!("release callback of {control} failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(released),
        }
    }

    /// Collects finished deferred callbacks, returning their failures.
    pub fn reap(&mut self) -> Vec<DispatchError> {
        self.dispatcher.reap()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.dispatcher.pending_count()
    }

    /// Waits up to `timeout` for the remaining deferred callbacks.
    pub async fn drain(&mut self, timeout: Duration) -> Vec<DispatchError> {
        self.dispatcher.drain(timeout).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
