//! Desktop notifications. Best effort: never blocks, never fails the caller.

use notify_rust::{Notification, Timeout};

use crate::config;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Shows a native toast on a detached thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let title = title.to_string();
        let message = message.to_string();
        let spawned = std::thread::Builder::new()
            .name("notification".into())
            .spawn(move || {
                let shown = Notification::new()
                    .appname(config::APP_TITLE)
                    .summary(&title)
                    .body(&message)
                    .timeout(Timeout::Milliseconds(config::NOTIFICATION_TIMEOUT_MS))
                    .show();
                if let Err(e) = shown {
                    tracing::warn!("Desktop notification failed: {e}");
                }
            });
        if let Err(e) = spawned {
            tracing::warn!("Could not spawn notification thread: {e}");
        }
    }
}
