#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod gps;
pub mod led;
pub mod morse;
pub mod scheduler;
pub mod sensors;
pub mod synth;
pub mod timer;
pub mod tracker;
pub mod wspr;

// Device tasks need the embassy runtime, only available with the embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
