//! Keyboard capture from the controlling terminal, via `crossterm`.
//!
//! The listener thread puts the terminal into raw mode and polls for key
//! events every `poll_interval`.  Terminals that implement the kitty keyboard
//! protocol report key releases; on those the listener asks for event types
//! and forwards real `KeyUp`s.  Everywhere else a press is followed by a
//! synthesized release straight away, so a control never stays pressed.
//!
//! Esc and Ctrl-C both produce [`RawInputEvent::Exit`].

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, ModifierKeyCode, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use teleplay_core::Key;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use super::{CaptureError, InputSource, RawInputEvent};

/// Terminal-backed [`InputSource`].
pub struct TerminalInputSource {
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalInputSource {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }
}

impl InputSource for TerminalInputSource {
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(CaptureError::AlreadyStarted);
        }

        if let Err(e) = terminal::enable_raw_mode() {
            self.running.store(false, Ordering::Release);
            return Err(CaptureError::RawModeFailed(e.to_string()));
        }
        let enhanced = push_enhancement();
        info!(
            "keyboard capture started ({})",
            if enhanced { "key releases reported" } else { "releases synthesized" }
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::clone(&self.running);
        let poll_interval = self.poll_interval;
        let spawned = std::thread::Builder::new()
            .name("teleplay-input".to_string())
            .spawn(move || {
                listen(&running, poll_interval, enhanced, &tx);
                restore_terminal(enhanced);
                running.store(false, Ordering::Release);
                debug!("keyboard listener exited");
            });

        match spawned {
            Ok(handle) => {
                *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                Ok(rx)
            }
            Err(e) => {
                restore_terminal(enhanced);
                self.running.store(false, Ordering::Release);
                Err(CaptureError::SpawnFailed(e.to_string()))
            }
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("keyboard listener thread panicked");
                let _ = terminal::disable_raw_mode();
            }
        }
    }
}

impl Drop for TerminalInputSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn push_enhancement() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    let flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    match execute!(io::stdout(), PushKeyboardEnhancementFlags(flags)) {
        Ok(()) => true,
        Err(e) => {
            warn!("could not enable key release reporting: {e}");
            false
        }
    }
}

fn restore_terminal(enhanced: bool) {
    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = terminal::disable_raw_mode() {
        error!("failed to restore terminal mode: {e}");
    }
}

fn listen(
    running: &AtomicBool,
    poll_interval: Duration,
    enhanced: bool,
    tx: &UnboundedSender<RawInputEvent>,
) {
    let started = Instant::now();

    while running.load(Ordering::Acquire) {
        let ready = match event::poll(poll_interval) {
            Ok(ready) => ready,
            Err(e) => {
                error!("terminal poll failed: {e}");
                return;
            }
        };
        if !ready {
            continue;
        }

        let key_event = match event::read() {
            Ok(TermEvent::Key(key_event)) => key_event,
            Ok(_) => continue,
            Err(e) => {
                error!("terminal read failed: {e}");
                return;
            }
        };

        let time_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        for raw in translate(&key_event, enhanced, time_ms) {
            let exit = matches!(raw, RawInputEvent::Exit { .. });
            if tx.send(raw).is_err() || exit {
                return;
            }
        }
    }
}

/// Converts one terminal key event into zero, one or two raw events.
fn translate(key_event: &KeyEvent, enhanced: bool, time_ms: i64) -> Vec<RawInputEvent> {
    let is_ctrl_c = key_event.code == KeyCode::Char('c')
        && key_event.modifiers.contains(KeyModifiers::CONTROL);
    if key_event.code == KeyCode::Esc || is_ctrl_c {
        return match key_event.kind {
            KeyEventKind::Press => vec![RawInputEvent::Exit { time_ms }],
            _ => Vec::new(),
        };
    }
    // Ctrl chords are terminal shortcuts, not game input.
    let is_ctrl_chord = matches!(key_event.code, KeyCode::Char(_))
        && key_event.modifiers.contains(KeyModifiers::CONTROL);
    if is_ctrl_chord {
        return Vec::new();
    }

    let Some(key) = key_for(key_event.code) else {
        return Vec::new();
    };
    match (key_event.kind, enhanced) {
        (KeyEventKind::Press, true) => vec![RawInputEvent::KeyDown { key, time_ms }],
        (KeyEventKind::Release, true) => vec![RawInputEvent::KeyUp { key, time_ms }],
        (KeyEventKind::Press, false) => vec![
            RawInputEvent::KeyDown { key, time_ms },
            RawInputEvent::KeyUp { key, time_ms },
        ],
        _ => Vec::new(),
    }
}

fn key_for(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(c) => Key::from_char(c),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Modifier(m) => match m {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => Some(Key::Shift),
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => Some(Key::Ctrl),
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => Some(Key::Alt),
            _ => None,
        },
        _ => None,
    }
}
