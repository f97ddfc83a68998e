//! Background presentation of controller events.
//!
//! The presenter task turns every `LinkEvent` into a console status line and a
//! desktop notification. It only reads events, so a slow or failing notifier
//! can never hold up a transition.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::config;
use crate::core::{Direction, LinkEvent, Mode};
use crate::notify::Notifier;

/// Spawn the detached event presenter. Ends when the controller is dropped.
pub fn spawn_event_presenter<N>(
    mut events: broadcast::Receiver<LinkEvent>,
    notifier: N,
    mode: Mode,
) -> JoinHandle<()>
where
    N: Notifier + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    println!("{}", status_line(&event, mode));
                    notifier.notify(config::APP_TITLE, &status_message(&event));
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Event presenter fell behind, skipped {missed} event(s)");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Event presenter stopped");
    })
}

/// Short message used for the notification body.
pub fn status_message(event: &LinkEvent) -> String {
    match event {
        LinkEvent::LinkDown => "Switch Enabled - Internet Disabled".to_string(),
        LinkEvent::LinkUp => "Switch Disabled - Internet Enabled".to_string(),
        LinkEvent::TransitionFailed {
            direction: Direction::Down,
            ..
        } => "Release Failed - Internet State Unconfirmed".to_string(),
        LinkEvent::TransitionFailed {
            direction: Direction::Up,
            ..
        } => "Renew Failed - Internet State Unconfirmed".to_string(),
    }
}

/// Console line printed for each event.
pub fn status_line(event: &LinkEvent, mode: Mode) -> String {
    match event {
        LinkEvent::TransitionFailed { reason, .. } => {
            format!("{} | Mode: {mode} | {reason}", status_message(event))
        }
        _ => format!("{} | Mode: {mode}", status_message(event)),
    }
}
