//! Centralized runtime constants for LagSwitch.
//!
//! All tunable intervals, file names, and environment overrides are collected
//! here so they can be found and adjusted in a single place rather than
//! scattered across modules.

use std::path::PathBuf;
use std::time::Duration;

/// Title used for desktop notifications and the console banner.
pub const APP_TITLE: &str = "LagSwitch";

/// Delay after a toggle-mode press before the next press is accepted (milliseconds).
pub const TOGGLE_DEBOUNCE_MS: u64 = 500;

/// Interval at which hold mode samples the hotkey's pressed state (milliseconds).
pub const HOLD_POLL_INTERVAL_MS: u64 = 100;

/// Upper bound on a single release/renew command before it is killed (seconds).
pub const COMMAND_TIMEOUT_SECS: u64 = 30;

/// How long a desktop notification stays on screen (milliseconds).
pub const NOTIFICATION_TIMEOUT_MS: u32 = 2000;

/// Buffered link events per subscriber before a slow presenter starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// File holding the persisted hotkey binding.
pub const HOTKEY_FILE: &str = "hotkey.txt";

/// File holding the persisted mode selector ("1" = Toggle, "2" = Hold).
pub const MODE_FILE: &str = "mode.txt";

pub const CONFIG_DIR_ENV: &str = "LAGSWITCH_CONFIG_DIR";
pub const INTERFACE_ENV: &str = "LAGSWITCH_INTERFACE";
pub const COMMAND_TIMEOUT_ENV: &str = "LAGSWITCH_COMMAND_TIMEOUT_SECS";

/// Settings resolved once at startup from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Directory containing `hotkey.txt` and `mode.txt`.
    pub config_dir: PathBuf,
    /// Adapter passed to the release/renew commands; `None` means all adapters.
    pub interface: Option<String>,
    pub command_timeout: Duration,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the config through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config_dir = lookup(CONFIG_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let interface = lookup(INTERFACE_ENV)
            .map(|iface| iface.trim().to_string())
            .filter(|iface| !iface.is_empty());

        let command_timeout = match lookup(COMMAND_TIMEOUT_ENV) {
            None => Duration::from_secs(COMMAND_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        "Ignoring {COMMAND_TIMEOUT_ENV}={raw:?}; using {COMMAND_TIMEOUT_SECS}s"
                    );
                    Duration::from_secs(COMMAND_TIMEOUT_SECS)
                }
            },
        };

        Self {
            config_dir,
            interface,
            command_timeout,
        }
    }
}
