//! Balloon telemetry carried in a standard WSPR frame.
//!
//! The telemetry transmission reuses the type-1 fields:
//!
//! ```text
//! callsign: [flight id 1][alt/subsquare][flight id 2][alt/subsquare x3]
//! locator:  temperature, voltage, speed, GPS flags (with power)
//! power:    low-order part of the same value
//! ```
//!
//! The flight-ID characters in positions 1 and 3 are what tell the receiving
//! side that the frame is telemetry rather than a station report.

use super::{Callsign, Locator, PowerLevel, WsprError, WsprMessage, POWER_LEVELS};

/// Altitude step in metres
const ALTITUDE_STEP_M: f32 = 20.0;
const ALTITUDE_STEPS: u32 = 1068;
const TEMP_MIN_C: i32 = -50;
const TEMP_STEPS: u32 = 90;
const VOLTAGE_BASE: f32 = 3.0;
const VOLTAGE_STEP: f32 = 0.05;
const VOLTAGE_STEPS: i32 = 40;
const SPEED_STEPS: u32 = 42;
/// Satellite count reported as "good"
const GOOD_SATELLITES: u8 = 8;

/// Values sampled for one telemetry transmission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryFrame {
    pub altitude_m: f32,
    pub voltage: f32,
    pub temperature_c: f32,
    pub speed_knots: f32,
    pub gps_valid: bool,
    pub satellites: u8,
    /// Fifth and sixth locator characters as indices 0..24
    pub subsquare: (u8, u8),
}

/// Values recovered from a telemetry frame, at telemetry precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedTelemetry {
    pub altitude_m: u32,
    pub voltage: f32,
    pub temperature_c: i32,
    pub speed_knots: u32,
    pub gps_valid: bool,
    pub satellites_good: bool,
    pub subsquare: (u8, u8),
}

impl TelemetryFrame {
    /// Build the telemetry message for the given flight-ID characters
    pub fn encode(&self, first: char, third: char) -> Result<WsprMessage, WsprError> {
        let callsign = self.callsign(first, third)?;
        let (locator, power) = self.locator_and_power()?;
        Ok(WsprMessage::Standard {
            callsign,
            locator,
            power,
        })
    }

    fn callsign(&self, first: char, third: char) -> Result<Callsign, WsprError> {
        let (sub5, sub6) = self.subsquare;
        if sub5 >= 24 || sub6 >= 24 {
            return Err(WsprError::InvalidLocator);
        }

        let altitude = libm::roundf(self.altitude_m / ALTITUDE_STEP_M)
            .clamp(0.0, (ALTITUDE_STEPS - 1) as f32) as u32;
        let value = (sub5 as u32 * 24 + sub6 as u32) * ALTITUDE_STEPS + altitude;

        let id2 = value / 17_576;
        let rest = value % 17_576;
        let raw = [
            b' ',
            alnum(id2),
            b'0',
            b'A' + (rest / 676) as u8,
            b'A' + ((rest / 26) % 26) as u8,
            b'A' + (rest % 26) as u8,
        ];

        // Positions 1 and 3 carry the flight ID
        Callsign::from_raw(raw)?.with_telemetry(first, third)
    }

    fn locator_and_power(&self) -> Result<(Locator, PowerLevel), WsprError> {
        let temp = (libm::roundf(self.temperature_c) as i32)
            .clamp(TEMP_MIN_C, TEMP_MIN_C + TEMP_STEPS as i32 - 1)
            - TEMP_MIN_C;
        let volt_steps = libm::roundf((self.voltage - VOLTAGE_BASE) / VOLTAGE_STEP) as i32;
        let volt = (volt_steps + 20).rem_euclid(VOLTAGE_STEPS);
        let speed = ((self.speed_knots.max(0.0) / 2.0) as u32).min(SPEED_STEPS - 1);

        let mut value = temp as u32;
        value = value * VOLTAGE_STEPS as u32 + volt as u32;
        value = value * SPEED_STEPS + speed;
        value = value * 2 + self.gps_valid as u32;
        value = value * 2 + (self.satellites >= GOOD_SATELLITES) as u32;

        let power = PowerLevel::from_index((value % 19) as usize)?;
        value /= 19;

        let g4 = value % 10;
        value /= 10;
        let g3 = value % 10;
        value /= 10;
        let g2 = value % 18;
        value /= 18;
        let g1 = value;

        let grid = [
            b'A' + g1 as u8,
            b'A' + g2 as u8,
            b'0' + g3 as u8,
            b'0' + g4 as u8,
        ];
        let grid = core::str::from_utf8(&grid).map_err(|_| WsprError::InvalidLocator)?;
        Ok((Locator::parse(grid)?, power))
    }
}

/// Recover the telemetry values from a received telemetry callsign, locator
/// and power
pub fn decode(callsign: &Callsign, locator: &Locator, power: PowerLevel) -> Result<DecodedTelemetry, WsprError> {
    let c = callsign.as_bytes();
    let id2 = alnum_value(c[1]).ok_or(WsprError::InvalidCallsign)?;
    let letters = [c[3], c[4], c[5]];
    if !letters.iter().all(|b| b.is_ascii_uppercase()) {
        return Err(WsprError::InvalidCallsign);
    }
    let value = id2 * 17_576
        + (letters[0] - b'A') as u32 * 676
        + (letters[1] - b'A') as u32 * 26
        + (letters[2] - b'A') as u32;
    let altitude = value % ALTITUDE_STEPS;
    let sub = value / ALTITUDE_STEPS;

    let g = locator.as_bytes();
    let mut value = (g[0] - b'A') as u32;
    value = value * 18 + (g[1] - b'A') as u32;
    value = value * 10 + (g[2] - b'0') as u32;
    value = value * 10 + (g[3] - b'0') as u32;
    let power_index = POWER_LEVELS
        .iter()
        .position(|&p| p == power.dbm())
        .ok_or(WsprError::InvalidPower)?;
    value = value * 19 + power_index as u32;

    let satellites_good = value % 2 == 1;
    value /= 2;
    let gps_valid = value % 2 == 1;
    value /= 2;
    let speed = value % SPEED_STEPS;
    value /= SPEED_STEPS;
    let volt = (value % VOLTAGE_STEPS as u32) as i32;
    value /= VOLTAGE_STEPS as u32;
    let temp = value as i32 + TEMP_MIN_C;

    Ok(DecodedTelemetry {
        altitude_m: altitude * ALTITUDE_STEP_M as u32,
        voltage: VOLTAGE_BASE + ((volt + 20) % VOLTAGE_STEPS) as f32 * VOLTAGE_STEP,
        temperature_c: temp,
        speed_knots: speed * 2,
        gps_valid,
        satellites_good,
        subsquare: ((sub / 24) as u8, (sub % 24) as u8),
    })
}

fn alnum(value: u32) -> u8 {
    if value < 10 {
        b'0' + value as u8
    } else {
        b'A' + (value - 10) as u8
    }
}

fn alnum_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u32),
        b'A'..=b'Z' => Some((c - b'A') as u32 + 10),
        _ => None,
    }
}
