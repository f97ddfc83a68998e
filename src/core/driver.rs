//! Input Mode Driver: turns hotkey events into controller requests.
//!
//! The two modes are small pure state machines ([`ToggleMachine`],
//! [`HoldMachine`]); [`InputDriver`] owns the event loop that feeds them.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::config;
use crate::core::controller::SwitchController;
use crate::core::settings::{HotkeyBinding, Mode};
use crate::error::AppError;
use crate::input::KeySource;
use crate::net::LeaseExecutor;

/// What the driver asks of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TogglePhase {
    #[default]
    WaitingFirstPress,
    /// Down was requested; presses are ignored until the debounce settles.
    DownActive,
    WaitingSecondPress,
}

/// Press once to go down, press again to come back up.
#[derive(Debug, Default)]
pub struct ToggleMachine {
    phase: TogglePhase,
}

impl ToggleMachine {
    pub fn phase(&self) -> TogglePhase {
        self.phase
    }

    /// Feed a matching hotkey press.
    pub fn press(&mut self) -> Option<Action> {
        match self.phase {
            TogglePhase::WaitingFirstPress => {
                self.phase = TogglePhase::DownActive;
                Some(Action::Down)
            }
            TogglePhase::DownActive => None,
            TogglePhase::WaitingSecondPress => {
                self.phase = TogglePhase::WaitingFirstPress;
                Some(Action::Up)
            }
        }
    }

    /// The debounce after a down request elapsed.
    pub fn settle(&mut self) {
        if self.phase == TogglePhase::DownActive {
            self.phase = TogglePhase::WaitingSecondPress;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldPhase {
    #[default]
    Released,
    Held,
}

/// Down while the hotkey is held, up the moment it is released.
#[derive(Debug, Default)]
pub struct HoldMachine {
    phase: HoldPhase,
}

impl HoldMachine {
    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    /// Feed one sample of the hotkey's pressed state.
    pub fn observe(&mut self, held: bool) -> Option<Action> {
        match (self.phase, held) {
            (HoldPhase::Released, true) => {
                self.phase = HoldPhase::Held;
                Some(Action::Down)
            }
            (HoldPhase::Held, false) => {
                self.phase = HoldPhase::Released;
                Some(Action::Up)
            }
            _ => None,
        }
    }
}

/// Debounce and poll intervals used by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTiming {
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for DriverTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(config::TOGGLE_DEBOUNCE_MS),
            poll_interval: Duration::from_millis(config::HOLD_POLL_INTERVAL_MS),
        }
    }
}

pub struct InputDriver<E> {
    controller: SwitchController<E>,
    binding: HotkeyBinding,
    timing: DriverTiming,
}

impl<E: LeaseExecutor> InputDriver<E> {
    pub fn new(controller: SwitchController<E>, binding: HotkeyBinding, timing: DriverTiming) -> Self {
        Self {
            controller,
            binding,
            timing,
        }
    }

    /// Run until the key source closes, which is always an error.
    pub async fn run<K: KeySource>(&self, mode: Mode, keys: &mut K) -> Result<(), AppError> {
        tracing::info!("Input driver started: hotkey '{}', mode {mode}", self.binding);
        match mode {
            Mode::Toggle => self.run_toggle(keys).await,
            Mode::Hold => self.run_hold(keys).await,
        }
    }

    async fn run_toggle<K: KeySource>(&self, keys: &mut K) -> Result<(), AppError> {
        let mut machine = ToggleMachine::default();
        loop {
            let key = keys.next_press().await.ok_or_else(listener_stopped)?;
            if !self.binding.matches_press(&key, &keys.pressed_keys()) {
                continue;
            }
            let Some(action) = machine.press() else {
                continue;
            };
            self.dispatch(action);
            self.debounce(keys).await;
            machine.settle();
            tracing::debug!("Toggle phase: {:?}", machine.phase());
        }
    }

    async fn run_hold<K: KeySource>(&self, keys: &mut K) -> Result<(), AppError> {
        let mut machine = HoldMachine::default();
        let mut ticker = tokio::time::interval(self.timing.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let held = self.binding.is_held(&keys.pressed_keys());
                    if let Some(action) = machine.observe(held) {
                        self.dispatch(action);
                    }
                }
                // A press that completes the binding counts as held even if it
                // is released before the next tick; that tick then sends the up.
                key = keys.next_press() => {
                    let key = key.ok_or_else(listener_stopped)?;
                    if self.binding.matches_press(&key, &keys.pressed_keys()) {
                        if let Some(action) = machine.observe(true) {
                            self.dispatch(action);
                        }
                    }
                }
            }
        }
    }

    fn dispatch(&self, action: Action) {
        tracing::debug!("Hotkey action: {action:?}");
        // Completion is observed through controller events, not awaited here.
        match action {
            Action::Down => {
                if self.controller.request_down().is_none() {
                    tracing::debug!("Down request ignored, switch already engaged");
                }
            }
            Action::Up => {
                self.controller.request_up();
            }
        }
    }

    /// Sleep, then discard presses that arrived in the meantime.
    async fn debounce<K: KeySource>(&self, keys: &mut K) {
        tokio::time::sleep(self.timing.debounce).await;
        while let Some(key) = keys.try_next_press() {
            tracing::trace!("Debounced press of '{key}'");
        }
    }
}

fn listener_stopped() -> AppError {
    AppError::Input("hotkey listener stopped delivering events".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::core::link::LinkState;
    use crate::error::ExecError;
    use crate::input;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Action>>,
        downs: AtomicUsize,
        ups: AtomicUsize,
    }

    #[derive(Clone, Default)]
    struct RecordingExecutor(Arc<Recorder>);

    impl LeaseExecutor for RecordingExecutor {
        async fn bring_down(&self) -> Result<(), ExecError> {
            self.0.downs.fetch_add(1, Ordering::SeqCst);
            self.0.calls.lock().unwrap().push(Action::Down);
            Ok(())
        }

        async fn bring_up(&self) -> Result<(), ExecError> {
            self.0.ups.fetch_add(1, Ordering::SeqCst);
            self.0.calls.lock().unwrap().push(Action::Up);
            Ok(())
        }
    }

    fn fast_timing() -> DriverTiming {
        DriverTiming {
            debounce: Duration::from_millis(30),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn driver(binding: &str) -> (InputDriver<RecordingExecutor>, Arc<Recorder>) {
        let exec = RecordingExecutor::default();
        let recorder = Arc::clone(&exec.0);
        let controller = SwitchController::new(exec);
        let binding = HotkeyBinding::parse(binding).unwrap();
        (InputDriver::new(controller, binding, fast_timing()), recorder)
    }

    async fn eventually(what: &str, cond: impl Fn() -> bool) {
        for _ in 0..400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {what}");
    }

    #[test]
    fn test_toggle_machine_cycle() {
        let mut m = ToggleMachine::default();
        assert_eq!(m.press(), Some(Action::Down));
        assert_eq!(m.phase(), TogglePhase::DownActive);
        assert_eq!(m.press(), None);
        m.settle();
        assert_eq!(m.phase(), TogglePhase::WaitingSecondPress);
        assert_eq!(m.press(), Some(Action::Up));
        assert_eq!(m.phase(), TogglePhase::WaitingFirstPress);
        m.settle();
        assert_eq!(m.phase(), TogglePhase::WaitingFirstPress);
    }

    #[test]
    fn test_hold_machine_edges_only() {
        let mut m = HoldMachine::default();
        assert_eq!(m.observe(false), None);
        assert_eq!(m.observe(true), Some(Action::Down));
        assert_eq!(m.observe(true), None);
        assert_eq!(m.phase(), HoldPhase::Held);
        assert_eq!(m.observe(false), Some(Action::Up));
        assert_eq!(m.observe(false), None);
    }

    #[tokio::test]
    async fn test_toggle_press_press_gives_down_then_up() {
        let (driver, recorder) = driver("f10");
        let (feed, mut keys) = input::channel();

        let script = async {
            feed.press("f10".into());
            feed.release("f10");
            eventually("down", || recorder.downs.load(Ordering::SeqCst) == 1).await;
            tokio::time::sleep(Duration::from_millis(60)).await;

            feed.press("x".into());
            feed.release("x");
            feed.press("f10".into());
            feed.release("f10");
            eventually("up", || recorder.ups.load(Ordering::SeqCst) == 1).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Toggle, &mut keys), script);
        assert_eq!(result.unwrap_err().kind(), "Input");

        driver.controller.settle().await;
        assert_eq!(*recorder.calls.lock().unwrap(), [Action::Down, Action::Up]);
        assert_eq!(driver.controller.snapshot().link, LinkState::Up);
    }

    #[tokio::test]
    async fn test_toggle_press_during_debounce_is_ignored() {
        let (driver, recorder) = driver("f10");
        let (feed, mut keys) = input::channel();

        let script = async {
            feed.press("f10".into());
            feed.release("f10");
            // Bounce inside the debounce window.
            feed.press("f10".into());
            feed.release("f10");
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Toggle, &mut keys), script);
        assert!(result.is_err());

        driver.controller.settle().await;
        assert_eq!(*recorder.calls.lock().unwrap(), [Action::Down]);
        assert_eq!(driver.controller.snapshot().link, LinkState::Down);
    }

    #[tokio::test]
    async fn test_toggle_ignores_other_keys() {
        let (driver, recorder) = driver("f10");
        let (feed, mut keys) = input::channel();

        let script = async {
            for key in ["a", "f9", "space"] {
                feed.press(key.into());
                feed.release(key);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Toggle, &mut keys), script);
        assert!(result.is_err());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_chord_binding() {
        let (driver, recorder) = driver("ctrl+a");
        let (feed, mut keys) = input::channel();

        let script = async {
            feed.press("a".into());
            feed.release("a");
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(recorder.downs.load(Ordering::SeqCst), 0);

            feed.press("ctrl".into());
            feed.press("a".into());
            eventually("down", || recorder.downs.load(Ordering::SeqCst) == 1).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Toggle, &mut keys), script);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_hold_down_on_press_up_on_release() {
        let (driver, recorder) = driver("space");
        let (feed, mut keys) = input::channel();

        let script = async {
            feed.press("space".into());
            eventually("down", || recorder.downs.load(Ordering::SeqCst) == 1).await;

            // Held across many polls: still exactly one down.
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(recorder.downs.load(Ordering::SeqCst), 1);
            assert_eq!(recorder.ups.load(Ordering::SeqCst), 0);

            feed.release("space");
            eventually("up", || recorder.ups.load(Ordering::SeqCst) == 1).await;
            tokio::time::sleep(Duration::from_millis(30)).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Hold, &mut keys), script);
        assert_eq!(result.unwrap_err().kind(), "Input");

        driver.controller.settle().await;
        assert_eq!(*recorder.calls.lock().unwrap(), [Action::Down, Action::Up]);
    }

    #[tokio::test]
    async fn test_hold_tap_shorter_than_poll_interval() {
        let exec = RecordingExecutor::default();
        let recorder = Arc::clone(&exec.0);
        let timing = DriverTiming {
            debounce: Duration::from_millis(30),
            poll_interval: Duration::from_millis(100),
        };
        let driver = InputDriver::new(
            SwitchController::new(exec),
            HotkeyBinding::parse("space").unwrap(),
            timing,
        );
        let (feed, mut keys) = input::channel();

        let script = async {
            // Let the immediate first tick pass, then tap between two polls.
            tokio::time::sleep(Duration::from_millis(20)).await;
            feed.press("space".into());
            tokio::time::sleep(Duration::from_millis(40)).await;
            feed.release("space");
            tokio::time::sleep(Duration::from_millis(300)).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Hold, &mut keys), script);
        assert!(result.is_err());

        driver.controller.settle().await;
        assert_eq!(*recorder.calls.lock().unwrap(), [Action::Down, Action::Up]);
        assert_eq!(driver.controller.snapshot().link, LinkState::Up);
    }

    #[tokio::test]
    async fn test_hold_up_follows_release_within_one_poll() {
        let exec = RecordingExecutor::default();
        let recorder = Arc::clone(&exec.0);
        let poll_interval = Duration::from_millis(50);
        let timing = DriverTiming {
            debounce: Duration::from_millis(30),
            poll_interval,
        };
        let driver = InputDriver::new(
            SwitchController::new(exec),
            HotkeyBinding::parse("space").unwrap(),
            timing,
        );
        let (feed, mut keys) = input::channel();

        let script = async {
            feed.press("space".into());
            eventually("down", || recorder.downs.load(Ordering::SeqCst) == 1).await;
            tokio::time::sleep(Duration::from_millis(120)).await;

            let released_at = tokio::time::Instant::now();
            feed.release("space");
            eventually("up", || recorder.ups.load(Ordering::SeqCst) == 1).await;
            let elapsed = released_at.elapsed();
            assert!(
                elapsed <= poll_interval + Duration::from_millis(40),
                "up took {elapsed:?} after release"
            );
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Hold, &mut keys), script);
        assert!(result.is_err());

        driver.controller.settle().await;
        assert_eq!(*recorder.calls.lock().unwrap(), [Action::Down, Action::Up]);
    }

    #[tokio::test]
    async fn test_hold_chord_modifier_released_on_one_side_only() {
        let (driver, recorder) = driver("ctrl+a");
        let (feed, mut keys) = input::channel();

        let script = async {
            feed.press_code("leftctrl", "ctrl".into());
            feed.press_code("rightctrl", "ctrl".into());
            feed.press("a".into());
            eventually("down", || recorder.downs.load(Ordering::SeqCst) == 1).await;

            feed.release_code("leftctrl");
            tokio::time::sleep(Duration::from_millis(40)).await;
            assert_eq!(recorder.ups.load(Ordering::SeqCst), 0);

            feed.release_code("rightctrl");
            eventually("up", || recorder.ups.load(Ordering::SeqCst) == 1).await;
            drop(feed);
        };

        let (result, ()) = tokio::join!(driver.run(Mode::Hold, &mut keys), script);
        assert!(result.is_err());
    }
}
