//! Hotkey listening.
//!
//! Platform backends push key edges into a [`KeyFeed`]; the driver consumes
//! them through the [`KeySource`] trait:
//! - Linux: evdev device readers (`evdev_backend`)
//! - Windows / macOS: `rdev::listen` hook (`rdev_backend`)

#[cfg(target_os = "linux")]
mod evdev_backend;

#[cfg(not(target_os = "linux"))]
mod rdev_backend;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

/// Source of hotkey events for the input driver and first-run setup.
pub trait KeySource: Send {
    /// Wait for the next key press. `None` once the listener has stopped.
    fn next_press(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// A press that is already queued, without waiting.
    fn try_next_press(&mut self) -> Option<String>;

    /// Names of all keys currently held down.
    fn pressed_keys(&self) -> HashSet<String>;
}

/// Held keys by physical code, mapped to their canonical name. Left and right
/// modifiers share a name, so a name stays held while any of its codes is.
type HeldKeys = Arc<Mutex<HashMap<String, String>>>;

/// Producer side, owned by a backend thread.
#[derive(Clone)]
pub struct KeyFeed {
    held: HeldKeys,
    presses: mpsc::UnboundedSender<String>,
}

impl KeyFeed {
    /// Record a key going down. Auto-repeat of an already held key is not
    /// forwarded. Returns `false` once the consumer is gone.
    pub fn press(&self, name: String) -> bool {
        let code = name.clone();
        self.press_code(&code, name)
    }

    pub fn release(&self, name: &str) {
        self.release_code(name);
    }

    /// Like [`press`](Self::press) for a key whose physical `code` differs
    /// from its canonical `name`.
    pub fn press_code(&self, code: &str, name: String) -> bool {
        let newly_held = {
            let mut held = lock_held(&self.held);
            if held.contains_key(code) {
                false
            } else {
                let name_was_held = held.values().any(|n| *n == name);
                held.insert(code.to_string(), name.clone());
                !name_was_held
            }
        };
        if newly_held {
            return self.presses.send(name).is_ok();
        }
        !self.presses.is_closed()
    }

    pub fn release_code(&self, code: &str) {
        lock_held(&self.held).remove(code);
    }
}

/// Consumer side of a [`KeyFeed`].
pub struct ChannelKeySource {
    held: HeldKeys,
    presses: mpsc::UnboundedReceiver<String>,
}

impl KeySource for ChannelKeySource {
    async fn next_press(&mut self) -> Option<String> {
        self.presses.recv().await
    }

    fn try_next_press(&mut self) -> Option<String> {
        self.presses.try_recv().ok()
    }

    fn pressed_keys(&self) -> HashSet<String> {
        lock_held(&self.held).values().cloned().collect()
    }
}

/// Create a connected feed/source pair.
pub fn channel() -> (KeyFeed, ChannelKeySource) {
    let held: HeldKeys = Arc::default();
    let (tx, rx) = mpsc::unbounded_channel();
    (
        KeyFeed {
            held: Arc::clone(&held),
            presses: tx,
        },
        ChannelKeySource { held, presses: rx },
    )
}

/// Start the platform key listener on background threads.
pub fn start_listener() -> anyhow::Result<ChannelKeySource> {
    let (feed, source) = channel();

    #[cfg(target_os = "linux")]
    evdev_backend::spawn(feed)?;

    #[cfg(not(target_os = "linux"))]
    rdev_backend::spawn(feed)?;

    Ok(source)
}

fn lock_held(
    held: &Mutex<HashMap<String, String>>,
) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    held.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map modifier spellings from either backend onto one name each.
pub(crate) fn canonical_modifier(name: &str) -> Option<&'static str> {
    match name {
        "controlleft" | "controlright" | "leftctrl" | "rightctrl" => Some("ctrl"),
        "shiftleft" | "shiftright" | "leftshift" | "rightshift" => Some("shift"),
        "alt" | "altgr" | "leftalt" | "rightalt" => Some("alt"),
        "metaleft" | "metaright" | "leftmeta" | "rightmeta" => Some("windows"),
        "return" | "kpreturn" | "kpenter" => Some("enter"),
        "escape" => Some("esc"),
        _ => None,
    }
}
