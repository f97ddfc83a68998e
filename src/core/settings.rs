//! User-selected settings: the hotkey binding and the interaction mode.

use std::collections::HashSet;
use std::fmt;

/// How hotkey events drive the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Press once to disable the network, press again to restore it.
    Toggle,
    /// Network stays disabled only while the hotkey is held.
    Hold,
}

impl Mode {
    /// Parse the menu choice used at setup and in `mode.txt`.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Mode::Toggle),
            "2" => Some(Mode::Hold),
            _ => None,
        }
    }

    pub fn as_choice(self) -> &'static str {
        match self {
            Mode::Toggle => "1",
            Mode::Hold => "2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Toggle => "Toggle",
            Mode::Hold => "Hold",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single key (`f10`) or a `+`-separated chord (`ctrl+shift+a`).
///
/// The raw text is kept for display and persistence; matching uses the
/// lowercased key names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    raw: String,
    keys: Vec<String>,
}

impl HotkeyBinding {
    /// Returns `None` for empty input or a chord with an empty component.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        // A lone "+" names the plus key itself rather than an empty chord.
        let keys: Vec<String> = if raw == "+" {
            vec![raw.to_string()]
        } else {
            raw.split('+')
                .map(|part| part.trim().to_lowercase())
                .collect()
        };
        if keys.iter().any(|k| k.is_empty()) {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            keys,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// True when `key` was just pressed, belongs to this binding, and every
    /// other key of the binding is already held.
    pub fn matches_press(&self, key: &str, pressed: &HashSet<String>) -> bool {
        let key = key.to_lowercase();
        self.keys.iter().any(|k| *k == key)
            && self.keys.iter().all(|k| *k == key || pressed.contains(k))
    }

    /// True while every key of the binding is held.
    pub fn is_held(&self, pressed: &HashSet<String>) -> bool {
        self.keys.iter().all(|k| pressed.contains(k))
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Everything loaded (or prompted for) at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub hotkey: HotkeyBinding,
    pub mode: Mode,
}
