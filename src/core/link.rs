//! Link state model shared by the controller, the driver, and the presenter.

use serde::Serialize;

/// Logical state of the network link as tracked by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Up,
    Down,
    TransitioningDown,
    TransitioningUp,
    /// A release/renew command was attempted but did not report success.
    Unknown,
}

/// Which transition a request or event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    pub(crate) fn in_progress_state(self) -> LinkState {
        match self {
            Direction::Down => LinkState::TransitioningDown,
            Direction::Up => LinkState::TransitioningUp,
        }
    }
}

/// Emitted by the controller once per finished transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum LinkEvent {
    LinkDown,
    LinkUp,
    TransitionFailed { direction: Direction, reason: String },
}

/// Point-in-time view of the controller's internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchSnapshot {
    pub link: LinkState,
    pub pending_down: u32,
    pub transitioning: bool,
    /// Up requests waiting for the in-flight transition to finish.
    pub queued_up: u32,
}
