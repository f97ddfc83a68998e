//! Linux key capture by reading `/dev/input` directly through evdev.
//!
//! Works under both X11 and Wayland, but the user must be able to read the
//! event devices (typically membership in the `input` group).

use anyhow::{bail, Context};
use evdev::{Device, InputEventKind, Key};

use super::{canonical_modifier, KeyFeed};

const KEY_UP: i32 = 0;
const KEY_DOWN: i32 = 1;

/// Spawn one reader thread per keyboard-like device.
pub(super) fn spawn(feed: KeyFeed) -> anyhow::Result<()> {
    let keyboards: Vec<(std::path::PathBuf, Device)> = evdev::enumerate()
        .filter(|(_, device)| {
            device
                .supported_keys()
                .map_or(false, |keys| keys.contains(Key::KEY_ENTER))
        })
        .collect();

    if keyboards.is_empty() {
        bail!("no readable keyboard devices under /dev/input (is the user in the `input` group?)");
    }

    for (idx, (path, device)) in keyboards.into_iter().enumerate() {
        let feed = feed.clone();
        let label = device.name().unwrap_or("unnamed").to_string();
        tracing::info!("Listening for hotkeys on {} ({label})", path.display());
        std::thread::Builder::new()
            .name(format!("hotkey-evdev-{idx}"))
            .spawn(move || {
                if let Err(e) = read_loop(device, &feed) {
                    tracing::warn!("Key reader for {} stopped: {e:#}", path.display());
                }
            })
            .context("failed to spawn evdev reader thread")?;
    }
    Ok(())
}

fn read_loop(mut device: Device, feed: &KeyFeed) -> anyhow::Result<()> {
    loop {
        let events = device.fetch_events().context("reading input events")?;
        for event in events {
            let InputEventKind::Key(key) = event.kind() else {
                continue;
            };
            let code = key_code(key);
            match event.value() {
                KEY_DOWN => {
                    if !feed.press_code(&code, normalize_key_name(&code)) {
                        return Ok(());
                    }
                }
                KEY_UP => feed.release_code(&code),
                // 2 = autorepeat; the held set already covers it.
                _ => {}
            }
        }
    }
}

/// Physical key identifier; distinguishes left and right modifiers.
fn key_code(key: Key) -> String {
    format!("{key:?}")
}

/// `KEY_F10` -> `f10`, `KEY_LEFTCTRL` -> `ctrl`.
pub(super) fn normalize_key_name(raw: &str) -> String {
    let name = raw.strip_prefix("KEY_").unwrap_or(raw).to_lowercase();
    match canonical_modifier(&name) {
        Some(canonical) => canonical.to_string(),
        None => name,
    }
}
