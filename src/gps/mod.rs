//! GPS fix collaborator
//!
//! The NMEA decoder lives with the board support code. It publishes a
//! [`FixState`] snapshot; the scheduler and controller only ever read it.

pub mod traits;

#[cfg(feature = "embedded")]
pub mod shared;

pub use crate::wspr::Locator;
pub use traits::GpsSource;

#[cfg(feature = "embedded")]
pub use shared::SharedFix;

/// Time of day from the GPS receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl UtcTime {
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }
}

/// Latest position and time from the receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixState {
    /// Position is usable for a report
    pub valid: bool,
    pub locator: Locator,
    pub altitude_m: f32,
    pub utc: UtcTime,
    pub satellites: u8,
    pub speed_knots: f32,
}

impl FixState {
    /// State before the receiver has produced anything
    pub const fn no_fix() -> Self {
        Self {
            valid: false,
            locator: Locator::ORIGIN,
            altitude_m: 0.0,
            utc: UtcTime::new(0, 0, 0),
            satellites: 0,
            speed_knots: 0.0,
        }
    }
}

impl Default for FixState {
    fn default() -> Self {
        Self::no_fix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fix() {
        let fix = FixState::default();
        assert!(!fix.valid);
        assert_eq!(fix.satellites, 0);
        assert_eq!(fix.locator.as_str(), "AA00AA");
    }
}
