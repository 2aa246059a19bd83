//! Control introspection data and the human-readable control summary.
//!
//! Each control keeps a [`ControlData`] describing which of its keys have
//! callbacks and what the strongest callback for each key is called.  The
//! host prints [`render_input_list`] at startup so the operator can see what
//! every key does.

use std::collections::HashMap;

use crate::keymap::Key;

/// Title tier used when a callback has no title.
pub const UNTITLED_TIER: u8 = 0;

/// Introspection data for one control.
///
/// `has_callbacks` and `without_callbacks` together hold every primary key of
/// the control exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlData {
    kind: &'static str,
    keys: Vec<(Key, Vec<Key>)>,
    titles: HashMap<Key, (Option<String>, u8)>,
    has_callbacks: Vec<Key>,
    without_callbacks: Vec<Key>,
    amount: u32,
}

impl ControlData {
    pub(crate) fn new(kind: &'static str, keys: &[Key], amount: u32) -> Self {
        Self {
            kind,
            keys: keys.iter().map(|k| (*k, vec![*k])).collect(),
            titles: HashMap::new(),
            has_callbacks: Vec::new(),
            without_callbacks: keys.to_vec(),
            amount,
        }
    }

    pub(crate) fn add_alternative(&mut self, key: Key, alternative: Key) {
        if let Some((_, physical)) = self.keys.iter_mut().find(|(k, _)| *k == key) {
            physical.push(alternative);
        }
    }

    /// Moves `key` into `has_callbacks` and records `title` if it outranks the
    /// current one.  Ties keep the first title.
    pub(crate) fn add_key_to_has_callbacks(&mut self, key: Key, title: Option<&str>, tier: u8) {
        let tier = if title.is_none() { UNTITLED_TIER } else { tier };

        if let Some(pos) = self.without_callbacks.iter().position(|k| *k == key) {
            self.without_callbacks.remove(pos);
            self.has_callbacks.push(key);
        }

        let replace = match self.titles.get(&key) {
            Some((_, current)) => *current < tier,
            None => true,
        };
        if replace {
            self.titles.insert(key, (title.map(str::to_string), tier));
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn has_callbacks(&self) -> &[Key] {
        &self.has_callbacks
    }

    pub fn without_callbacks(&self) -> &[Key] {
        &self.without_callbacks
    }

    /// The physical keys (canonical first, then alternates) behind `key`.
    pub fn physical_keys(&self, key: Key) -> &[Key] {
        self.keys
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, physical)| physical.as_slice())
            .unwrap_or_default()
    }

    /// The surfaced title for `key` and its tier.
    pub fn title(&self, key: Key) -> Option<(&str, u8)> {
        self.titles
            .get(&key)
            .and_then(|(title, tier)| title.as_deref().map(|t| (t, *tier)))
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

fn key_cap(s: &str) -> String {
    format!("\x1b[1;7m {s} \x1b[0m")
}

fn blue_key_cap(s: &str) -> String {
    format!("\x1b[1;44;37m {s} \x1b[0m")
}

/// `"turn_left_"` → `"Turn left"`.
pub fn function_name_to_sentence(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// Visible width of one key cap plus its " / " separator.
fn cap_width(key: Key) -> usize {
    key.name().len() + 5
}

fn padding_target(datas: &[ControlData]) -> usize {
    datas
        .iter()
        .flat_map(|d| d.keys.iter())
        .map(|(_, physical)| physical.iter().map(|k| cap_width(*k)).sum::<usize>())
        .max()
        .unwrap_or(0)
}

fn render_caps(keys: &[Key], highlighted: bool, target: usize) -> String {
    let caps: Vec<String> = keys
        .iter()
        .map(|k| if highlighted { blue_key_cap(k.name()) } else { key_cap(k.name()) })
        .collect();
    let visible: usize = keys.iter().map(|k| cap_width(*k)).sum();
    let padding = " ".repeat(target.saturating_sub(visible));
    format!("{}{padding}", caps.join(" / "))
}

/// Renders the control summary printed when a host or player starts.
pub fn render_input_list(datas: &[ControlData]) -> String {
    let target = padding_target(datas);
    let mut out = String::new();

    for data in datas {
        for key in &data.has_callbacks {
            let title = data
                .title(*key)
                .map(|(t, _)| function_name_to_sentence(t))
                .unwrap_or_else(|| "Unknown action".to_string());
            out.push_str(&format!(
                "{} - {title}\n",
                render_caps(data.physical_keys(*key), true, target)
            ));
        }
        for key in &data.without_callbacks {
            out.push_str(&format!(
                "{} - No callbacks added\n",
                render_caps(data.physical_keys(*key), false, target)
            ));
        }
    }

    if out.is_empty() {
        dim("(no inputs created)\n")
    } else {
        out.push('\n');
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
