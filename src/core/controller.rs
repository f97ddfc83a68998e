//! Switch Controller: owns the logical link state and serializes every
//! release/renew transition.
//!
//! All mutable state lives behind one `Mutex`. A `Notify` stands in for a
//! condition variable so queued up-requests wait without spinning. Each
//! transition runs on its own short-lived tokio task so command latency never
//! reaches the hotkey loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use crate::config;
use crate::core::link::{Direction, LinkEvent, LinkState, SwitchSnapshot};
use crate::error::ExecError;
use crate::net::LeaseExecutor;

#[derive(Debug, Default)]
struct SwitchState {
    link: LinkState,
    pending_down: u32,
    in_flight: Option<Direction>,
    queued_up: u32,
}

impl SwitchState {
    fn begin(&mut self, direction: Direction) {
        self.in_flight = Some(direction);
        self.link = direction.in_progress_state();
        if direction == Direction::Up {
            self.pending_down = self.pending_down.saturating_sub(1);
        }
    }

    fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queued_up == 0
    }
}

struct Shared<E> {
    executor: E,
    state: Mutex<SwitchState>,
    idle: Notify,
    events: broadcast::Sender<LinkEvent>,
}

/// Cloneable handle to the single switch controller.
pub struct SwitchController<E> {
    shared: Arc<Shared<E>>,
}

impl<E> Clone for SwitchController<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: LeaseExecutor> SwitchController<E> {
    pub fn new(executor: E) -> Self {
        let (events, _) = broadcast::channel(config::EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                executor,
                state: Mutex::new(SwitchState::default()),
                idle: Notify::new(),
                events,
            }),
        }
    }

    /// Subscribe to `LinkEvent`s emitted after each finished transition.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> SwitchSnapshot {
        let state = self.shared.lock();
        SwitchSnapshot {
            link: state.link,
            pending_down: state.pending_down,
            transitioning: state.in_flight.is_some(),
            queued_up: state.queued_up,
        }
    }

    /// Take the link down unless a down request is already active or any
    /// transition is in flight, in which case this is a no-op returning `None`.
    pub fn request_down(&self) -> Option<JoinHandle<()>> {
        {
            let mut state = self.shared.lock();
            if state.pending_down > 0 || state.in_flight.is_some() {
                tracing::debug!(
                    "Down request dropped (pending={}, in_flight={:?})",
                    state.pending_down,
                    state.in_flight
                );
                return None;
            }
            state.pending_down += 1;
            state.begin(Direction::Down);
        }

        let guard = TransitionGuard::new(&self.shared, Direction::Down, GuardPhase::Running);
        Some(tokio::spawn(guard.run()))
    }

    /// Bring the link up. Never dropped: if a transition is in flight the
    /// request queues behind it.
    pub fn request_up(&self) -> JoinHandle<()> {
        let phase = {
            let mut state = self.shared.lock();
            if state.in_flight.is_none() {
                state.begin(Direction::Up);
                GuardPhase::Running
            } else {
                state.queued_up += 1;
                GuardPhase::Queued
            }
        };

        let guard = TransitionGuard::new(&self.shared, Direction::Up, phase);
        tokio::spawn(guard.run())
    }

    /// Wait until no transition is in flight and no up request is queued.
    pub async fn settle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.lock().is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Restore connectivity before exit unless the link is confirmed up.
    pub async fn shutdown(&self) {
        self.settle().await;
        let link = self.snapshot().link;
        if link == LinkState::Up {
            return;
        }
        tracing::info!("Restoring connectivity before exit (link was {link:?})");
        if let Err(e) = self.request_up().await {
            tracing::error!("Final renew task failed: {e}");
        }
    }
}

impl<E: LeaseExecutor> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, SwitchState> {
        // Nothing panics while holding the lock; recover the data regardless.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn claim_queued_up(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if state.in_flight.is_none() {
                    state.queued_up -= 1;
                    state.begin(Direction::Up);
                    return;
                }
            }
            notified.await;
        }
    }

    fn finish(&self, direction: Direction, result: Result<(), ExecError>) {
        let event = {
            let mut state = self.lock();
            state.in_flight = None;
            match result {
                Ok(()) => match direction {
                    Direction::Down => {
                        state.link = LinkState::Down;
                        LinkEvent::LinkDown
                    }
                    Direction::Up => {
                        state.link = LinkState::Up;
                        LinkEvent::LinkUp
                    }
                },
                Err(e) => {
                    state.link = LinkState::Unknown;
                    if direction == Direction::Down {
                        state.pending_down = 0;
                    }
                    tracing::error!("{direction:?} transition failed, link state unconfirmed: {e}");
                    LinkEvent::TransitionFailed {
                        direction,
                        reason: e.to_string(),
                    }
                }
            }
        };
        self.idle.notify_waiters();

        match &event {
            LinkEvent::LinkDown => tracing::info!("Link down"),
            LinkEvent::LinkUp => tracing::info!("Link up"),
            LinkEvent::TransitionFailed { .. } => {}
        }
        // No subscribers is fine; the presenter may not be running in tests.
        let _ = self.events.send(event);
    }

    /// Drop a queued up request that was cancelled before it could claim.
    fn leave_queue(&self) {
        self.lock().queued_up -= 1;
        self.idle.notify_waiters();
    }

    /// Reset after a transition task unwound or was cancelled mid-command.
    fn abandon(&self, direction: Direction) {
        {
            let mut state = self.lock();
            state.in_flight = None;
            state.link = LinkState::Unknown;
            if direction == Direction::Down {
                state.pending_down = 0;
            }
        }
        self.idle.notify_waiters();
        tracing::error!("{direction:?} transition abandoned before completion");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardPhase {
    Queued,
    Running,
    Finished,
}

/// Owns one transition from claim to completion. Created before the task is
/// spawned, so the state is reset on every exit path: completion, panic, or a
/// task aborted before it was first polled.
struct TransitionGuard<E: LeaseExecutor> {
    shared: Arc<Shared<E>>,
    direction: Direction,
    phase: GuardPhase,
}

impl<E: LeaseExecutor> TransitionGuard<E> {
    fn new(shared: &Arc<Shared<E>>, direction: Direction, phase: GuardPhase) -> Self {
        Self {
            shared: Arc::clone(shared),
            direction,
            phase,
        }
    }

    async fn run(mut self) {
        if self.phase == GuardPhase::Queued {
            self.shared.claim_queued_up().await;
            self.phase = GuardPhase::Running;
        }
        let result = match self.direction {
            Direction::Down => self.shared.executor.bring_down().await,
            Direction::Up => self.shared.executor.bring_up().await,
        };
        self.phase = GuardPhase::Finished;
        self.shared.finish(self.direction, result);
    }
}

impl<E: LeaseExecutor> Drop for TransitionGuard<E> {
    fn drop(&mut self) {
        match self.phase {
            GuardPhase::Queued => self.shared.leave_queue(),
            GuardPhase::Running => self.shared.abandon(self.direction),
            GuardPhase::Finished => {}
        }
    }
}
