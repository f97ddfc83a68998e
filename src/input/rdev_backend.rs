//! Windows / macOS key capture via a global `rdev` hook.

use anyhow::Context;
use rdev::{EventType, Key};

use super::{canonical_modifier, KeyFeed};

/// Run `rdev::listen` on a dedicated thread; it blocks for the process lifetime.
pub(super) fn spawn(feed: KeyFeed) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("hotkey-rdev".into())
        .spawn(move || {
            let hook_feed = feed.clone();
            let result = rdev::listen(move |event| match event.event_type {
                EventType::KeyPress(key) => {
                    let code = key_code(key);
                    hook_feed.press_code(&code, normalize_key_name(&code));
                }
                EventType::KeyRelease(key) => hook_feed.release_code(&key_code(key)),
                _ => {}
            });
            if let Err(e) = result {
                tracing::error!("Global key hook stopped: {e:?}");
            }
            drop(feed);
        })
        .context("failed to spawn rdev listener thread")?;
    Ok(())
}

/// Physical key identifier; distinguishes left and right modifiers.
fn key_code(key: Key) -> String {
    format!("{key:?}")
}

/// `KeyA` -> `a`, `Num1` -> `1`, `F10` -> `f10`, `ControlLeft` -> `ctrl`.
pub(super) fn normalize_key_name(raw: &str) -> String {
    let single_char = |rest: &str| rest.chars().count() == 1;
    let name = raw
        .strip_prefix("Key")
        .filter(|rest| single_char(rest))
        .or_else(|| {
            raw.strip_prefix("Num")
                .filter(|rest| single_char(rest) && rest.chars().all(|c| c.is_ascii_digit()))
        })
        .unwrap_or(raw)
        .to_lowercase();
    match canonical_modifier(&name) {
        Some(canonical) => canonical.to_string(),
        None => name,
    }
}
