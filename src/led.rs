//! Status LED policy
//!
//! The LED only shows fix status while the balloon is low enough for someone
//! on the ground to see it; at altitude it stays dark to save power.

use crate::config::LedConfig;
use crate::gps::FixState;

/// Whether the LED should show a fix blink now
pub fn should_blink(fix: &FixState, config: &LedConfig) -> bool {
    config.pin != 0 && config.blinks > 0 && fix.valid && fix.altitude_m < config.altitude_m as f32
}
