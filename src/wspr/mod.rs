//! WSPR protocol core
//!
//! Turns a callsign, locator and power level into the 162 four-level channel
//! symbols of one transmission:
//!
//! ```text
//! Callsign/Locator/Power -> pack (50 bits) -> convolve (162 bits)
//!                        -> interleave -> merge with sync -> symbols 0..=3
//! ```
//!
//! Also carries the sub-band table and the telemetry encoding that rides in
//! standard frames.

use core::fmt;

use crate::synth::{hz, Centihertz};

pub mod callsign;
pub mod encoder;
pub mod locator;
pub mod message;
pub mod telemetry;

pub use callsign::Callsign;
pub use encoder::{encode, encode_packed, SymbolStream, SYNC_VECTOR};
pub use locator::Locator;
pub use message::{callsign_hash, hashlittle, pack_fields, PackedMessage, PowerLevel, WsprMessage, POWER_LEVELS};
pub use telemetry::{DecodedTelemetry, TelemetryFrame};

/// Channel symbols per transmission
pub const SYMBOL_COUNT: usize = 162;

/// Ideal symbol period: 8192 / 12000 s
pub const SYMBOL_PERIOD_NS: u64 = 8192 * 1_000_000_000 / 12_000;

/// Transmissions start one second into an even minute
pub const START_DELAY_MS: u64 = 1000;

/// A WSPR start at or after this second of the minute is too late to decode
pub const LATE_START_S: u8 = 2;

/// WSPR protocol errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsprError {
    /// Callsign does not fit the type-1 layout
    InvalidCallsign,
    /// Locator is not a 4 or 6 character Maidenhead grid
    InvalidLocator,
    /// Power is not one of the legal dBm codes
    InvalidPower,
}

impl fmt::Display for WsprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WsprError::InvalidCallsign => write!(f, "invalid callsign"),
            WsprError::InvalidLocator => write!(f, "invalid locator"),
            WsprError::InvalidPower => write!(f, "invalid power level"),
        }
    }
}

/// One 200 Hz WSPR sub-band window, in hertz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsprBand {
    pub name: &'static str,
    pub low_hz: u64,
    pub high_hz: u64,
}

impl WsprBand {
    const fn new(name: &'static str, low_hz: u64) -> Self {
        Self {
            name,
            low_hz,
            high_hz: low_hz + 200,
        }
    }

    /// Whether a frequency in centihertz lies inside the window
    pub fn contains(&self, freq: Centihertz) -> bool {
        (hz(self.low_hz)..=hz(self.high_hz)).contains(&freq)
    }
}

/// Sub-band windows the tracker may transmit in
pub const BANDS: [WsprBand; 16] = [
    WsprBand::new("2200m", 137_400),
    WsprBand::new("630m", 475_600),
    WsprBand::new("160m", 1_838_000),
    WsprBand::new("80m", 3_570_000),
    WsprBand::new("80m", 3_594_000),
    WsprBand::new("60m", 5_288_600),
    WsprBand::new("60m", 5_366_100),
    WsprBand::new("40m", 7_040_000),
    WsprBand::new("30m", 10_140_100),
    WsprBand::new("20m", 14_097_000),
    WsprBand::new("17m", 18_106_000),
    WsprBand::new("15m", 21_096_000),
    WsprBand::new("12m", 24_926_000),
    WsprBand::new("10m", 28_126_000),
    WsprBand::new("6m", 50_294_400),
    WsprBand::new("2m", 144_490_400),
];

/// Sub-band window containing a carrier given in hertz
pub fn band_for(freq_hz: u64) -> Option<WsprBand> {
    BANDS.iter().copied().find(|b| b.contains(hz(freq_hz)))
}
