//! Embassy tasks module
//!
//! Contains the async tasks a board crate spawns, organised by
//! functionality.

pub mod clock;
pub mod led;
pub mod tracker;

pub use clock::{symbol_clock_task, ClockControl, CLOCK_CONTROL, SYMBOL_TICKS};
pub use led::{led_task, BlinkRequest, LedReceiver, LedSender, LED_CHANNEL};
pub use tracker::tracker_task;
