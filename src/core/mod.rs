//! Core logic: link state, the switch controller, and the input mode driver.
//!
//! - [`SwitchController`]: single-flight release/renew transitions
//! - [`InputDriver`]: Toggle / Hold hotkey state machines
//! - [`settings`]: hotkey binding and mode types
//! - [`link`]: link state, events, and snapshots

pub mod controller;
pub mod driver;
pub mod link;
pub mod settings;

pub use controller::SwitchController;
pub use driver::{DriverTiming, InputDriver};
pub use link::{Direction, LinkEvent, LinkState, SwitchSnapshot};
pub use settings::{HotkeyBinding, Mode, Settings};
