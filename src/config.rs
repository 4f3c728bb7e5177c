//! Tracker configuration
//!
//! Build-time constants for the balloon tracker, grouped by concern, plus the
//! immutable [`TrackerConfig`] assembled from them once at startup.

use core::fmt;

use crc::{Crc, CRC_16_XMODEM};

use crate::morse::MorseEncoder;
use crate::synth::{hz, symbol_tone, Centihertz};
use crate::wspr::{band_for, Callsign, PowerLevel};

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Station identity. Always change this to your own licensed call.
pub mod station {
    pub const CALLSIGN: &str = "MYCALL";
    /// First character of the telemetry callsign (flight ID)
    pub const TELEM_CHAR1: char = '1';
    /// Third character of the telemetry callsign (flight ID)
    pub const TELEM_CHAR2: char = '1';
    /// Reported power in dBm
    pub const POWER_DBM: u8 = 10;
}

/// Transmission minutes within each 10-minute decade
pub mod schedule {
    /// Standard message at minute 04, 14, 24, 34, 44 and 54
    pub const MINUTE_MESSAGE_1: u8 = 4;
    /// Telemetry message at minute 06, 16, 26, 36, 46 and 56
    pub const MINUTE_MESSAGE_2: u8 = 6;
}

/// Symbol timer reload.
///
/// 4 MHz: 2668, 8 MHz: 5336, 16 MHz: 10672.
pub mod timing {
    pub const WSPR_CTC: u16 = 5336;
    pub const CPU_HZ: u32 = 8_000_000;
    pub const PRESCALER: u32 = 1024;
}

/// Carrier and oscillator settings
pub mod radio {
    /// 28_126_124 for 10 m, 14_097_100 for 20 m, 7_040_060 for 40 m
    pub const WSPR_FREQ_HZ: u64 = 14_097_100;
    /// Reference oscillator frequency, 0 for the default 25 MHz crystal
    pub const SI5351_FREQ_HZ: u32 = 0;
    /// Oscillator correction in 1/100 Hz. Negative if the chip transmits low.
    pub const SI5351_CORRECTION: i32 = -12_000;
}

/// Morse fallback when there is no GPS fix
pub mod morse {
    pub const USE_MORSE: bool = true;
    pub const MESSAGE: &str = "MYCALL BALLOON NO GPS";
    pub const SPEED_WPM: u8 = 14;
    /// 200 Hz above the WSPR carrier
    pub const FREQ_HZ: u64 = 14_097_300;
}

/// Status LED
pub mod led {
    /// 0 disables the LED
    pub const PIN: u8 = 13;
    /// Only blink below this altitude in metres
    pub const ALTITUDE_M: u32 = 1000;
    pub const BLINKS: u8 = 2;
    pub const BLINK_MS: u64 = 20;
}

/// GPS serial link
pub mod gps {
    pub const RX_PIN: u8 = 8;
    pub const TX_PIN: u8 = 7;
    pub const BAUD_RATE: u32 = 9600;
}

/// Voltage sensing
pub mod sensors {
    pub const USE_EXTERNAL_VOLTAGE: bool = false;
    /// Internal voltage error correction in volts
    pub const VCC_OFFSET: f32 = 0.00;
    /// External voltage error correction in volts
    pub const EXT_OFFSET: f32 = 0.00;
    pub const EXTERNAL_VOLTAGE_PIN: u8 = 0;
    /// ADC full scale (1024 for 10-bit, 4096 for 12-bit parts)
    pub const SAMPLE_RES: u16 = 1024;
    /// (R1 + R2) / R2, 1.0 without a divider
    pub const DIVIDER_RATIO: f32 = 3.083;
}

/// Power saving
pub mod power {
    pub const USE_DEEPSLEEP: bool = false;
}

/// Configuration errors detected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Callsign does not fit the WSPR type-1 layout
    InvalidCallsign,
    /// Telemetry marker character outside the callsign alphabet
    InvalidTelemetryChar,
    /// Power is not one of the WSPR dBm codes
    InvalidPower,
    /// Minute offsets out of range, odd, or overlapping
    MinuteCollision,
    /// Carrier outside every WSPR sub-band
    FrequencyOutOfBand,
    /// Morse speed is zero, message unencodable, or frequency inside the WSPR window
    InvalidMorse,
    /// Timer reload or clock is zero
    InvalidTimer,
    /// No configuration candidate supplied
    Missing,
    /// Two or more configuration copies disagree
    Ambiguous,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::InvalidCallsign => "callsign is not a valid WSPR type-1 callsign",
            ConfigError::InvalidTelemetryChar => "telemetry character is not usable in a callsign",
            ConfigError::InvalidPower => "power is not a WSPR power level",
            ConfigError::MinuteCollision => "transmission minutes collide",
            ConfigError::FrequencyOutOfBand => "carrier is outside the WSPR sub-band",
            ConfigError::InvalidMorse => "morse fallback settings are invalid",
            ConfigError::InvalidTimer => "symbol timer settings are invalid",
            ConfigError::Missing => "no configuration supplied",
            ConfigError::Ambiguous => "configuration copies disagree",
        };
        f.write_str(msg)
    }
}

/// Who we are on air
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationIdentity {
    pub callsign: &'static str,
    pub telem_char1: char,
    pub telem_char2: char,
    pub power_dbm: u8,
}

/// Offsets inside each 10-minute decade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub minute_message_1: u8,
    pub minute_message_2: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioConfig {
    pub wspr_freq_hz: u64,
    pub si5351_freq_hz: u32,
    pub correction_centihz: i32,
}

impl RadioConfig {
    /// Carrier in centihertz
    pub fn carrier(&self) -> Centihertz {
        hz(self.wspr_freq_hz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub ctc: u16,
    pub cpu_hz: u32,
    pub prescaler: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorseConfig {
    pub enabled: bool,
    pub message: &'static str,
    pub speed_wpm: u8,
    pub freq_hz: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedConfig {
    pub pin: u8,
    pub altitude_m: u32,
    pub blinks: u8,
    pub blink_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsConfig {
    pub rx_pin: u8,
    pub tx_pin: u8,
    pub baud_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    pub use_external_voltage: bool,
    pub vcc_offset: f32,
    pub ext_offset: f32,
    pub external_voltage_pin: u8,
    pub sample_res: u16,
    pub divider_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerConfig {
    pub use_deepsleep: bool,
}

/// Complete tracker configuration.
///
/// Built once at startup and shared by reference; there is no runtime
/// reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub station: StationIdentity,
    pub schedule: ScheduleWindow,
    pub radio: RadioConfig,
    pub timer: TimerConfig,
    pub morse: MorseConfig,
    pub led: LedConfig,
    pub gps: GpsConfig,
    pub sensors: SensorConfig,
    pub power: PowerConfig,
}

impl TrackerConfig {
    /// Assemble the configuration from the build-time constants
    pub const fn from_build() -> Self {
        Self {
            station: StationIdentity {
                callsign: station::CALLSIGN,
                telem_char1: station::TELEM_CHAR1,
                telem_char2: station::TELEM_CHAR2,
                power_dbm: station::POWER_DBM,
            },
            schedule: ScheduleWindow {
                minute_message_1: schedule::MINUTE_MESSAGE_1,
                minute_message_2: schedule::MINUTE_MESSAGE_2,
            },
            radio: RadioConfig {
                wspr_freq_hz: radio::WSPR_FREQ_HZ,
                si5351_freq_hz: radio::SI5351_FREQ_HZ,
                correction_centihz: radio::SI5351_CORRECTION,
            },
            timer: TimerConfig {
                ctc: timing::WSPR_CTC,
                cpu_hz: timing::CPU_HZ,
                prescaler: timing::PRESCALER,
            },
            morse: MorseConfig {
                enabled: morse::USE_MORSE,
                message: morse::MESSAGE,
                speed_wpm: morse::SPEED_WPM,
                freq_hz: morse::FREQ_HZ,
            },
            led: LedConfig {
                pin: led::PIN,
                altitude_m: led::ALTITUDE_M,
                blinks: led::BLINKS,
                blink_ms: led::BLINK_MS,
            },
            gps: GpsConfig {
                rx_pin: gps::RX_PIN,
                tx_pin: gps::TX_PIN,
                baud_rate: gps::BAUD_RATE,
            },
            sensors: SensorConfig {
                use_external_voltage: sensors::USE_EXTERNAL_VOLTAGE,
                vcc_offset: sensors::VCC_OFFSET,
                ext_offset: sensors::EXT_OFFSET,
                external_voltage_pin: sensors::EXTERNAL_VOLTAGE_PIN,
                sample_res: sensors::SAMPLE_RES,
                divider_ratio: sensors::DIVIDER_RATIO,
            },
            power: PowerConfig {
                use_deepsleep: power::USE_DEEPSLEEP,
            },
        }
    }

    /// Check every setting that would produce an illegal or undecodable transmission
    pub fn validate(&self) -> Result<(), ConfigError> {
        let call = Callsign::parse(self.station.callsign).map_err(|_| ConfigError::InvalidCallsign)?;
        call.with_telemetry(self.station.telem_char1, self.station.telem_char2)
            .map_err(|_| ConfigError::InvalidTelemetryChar)?;
        PowerLevel::new(self.station.power_dbm).map_err(|_| ConfigError::InvalidPower)?;

        self.validate_schedule()?;

        let band = band_for(self.radio.wspr_freq_hz).ok_or(ConfigError::FrequencyOutOfBand)?;
        // All four tones have to stay inside the window
        let top = symbol_tone(self.radio.carrier(), 3);
        if !band.contains(top) {
            return Err(ConfigError::FrequencyOutOfBand);
        }

        if self.timer.ctc == 0 || self.timer.cpu_hz == 0 || self.timer.prescaler == 0 {
            return Err(ConfigError::InvalidTimer);
        }

        if self.morse.enabled {
            if self.morse.speed_wpm == 0 || band.contains(hz(self.morse.freq_hz)) {
                return Err(ConfigError::InvalidMorse);
            }
            MorseEncoder::new(self.morse.speed_wpm)
                .encode(self.morse.message)
                .map_err(|_| ConfigError::InvalidMorse)?;
        }

        Ok(())
    }

    fn validate_schedule(&self) -> Result<(), ConfigError> {
        let m1 = self.schedule.minute_message_1;
        let m2 = self.schedule.minute_message_2;
        if m1 > 9 || m2 > 9 || m1 % 2 != 0 || m2 % 2 != 0 {
            return Err(ConfigError::MinuteCollision);
        }
        // A transmission occupies its start minute and the following one
        let distance = (m1 as i8 - m2 as i8).rem_euclid(10);
        if distance < 2 || distance > 8 {
            return Err(ConfigError::MinuteCollision);
        }
        Ok(())
    }

    /// CRC-16 over a canonical rendering of every field.
    ///
    /// Two copies of the configuration with the same fingerprint are treated
    /// as the same configuration.
    pub fn fingerprint(&self) -> u16 {
        let mut digest = CRC.digest();

        digest.update(self.station.callsign.as_bytes());
        digest.update(&[0]);
        digest.update(&(self.station.telem_char1 as u32).to_le_bytes());
        digest.update(&(self.station.telem_char2 as u32).to_le_bytes());
        digest.update(&[self.station.power_dbm]);

        digest.update(&[self.schedule.minute_message_1, self.schedule.minute_message_2]);

        digest.update(&self.radio.wspr_freq_hz.to_le_bytes());
        digest.update(&self.radio.si5351_freq_hz.to_le_bytes());
        digest.update(&self.radio.correction_centihz.to_le_bytes());

        digest.update(&self.timer.ctc.to_le_bytes());
        digest.update(&self.timer.cpu_hz.to_le_bytes());
        digest.update(&self.timer.prescaler.to_le_bytes());

        digest.update(&[self.morse.enabled as u8]);
        digest.update(self.morse.message.as_bytes());
        digest.update(&[0, self.morse.speed_wpm]);
        digest.update(&self.morse.freq_hz.to_le_bytes());

        digest.update(&[self.led.pin, self.led.blinks]);
        digest.update(&self.led.altitude_m.to_le_bytes());
        digest.update(&self.led.blink_ms.to_le_bytes());

        digest.update(&[self.gps.rx_pin, self.gps.tx_pin]);
        digest.update(&self.gps.baud_rate.to_le_bytes());

        digest.update(&[
            self.sensors.use_external_voltage as u8,
            self.sensors.external_voltage_pin,
        ]);
        digest.update(&self.sensors.vcc_offset.to_le_bytes());
        digest.update(&self.sensors.ext_offset.to_le_bytes());
        digest.update(&self.sensors.sample_res.to_le_bytes());
        digest.update(&self.sensors.divider_ratio.to_le_bytes());

        digest.update(&[self.power.use_deepsleep as u8]);

        digest.finalize()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Pick the one configuration out of several copies.
///
/// Diverging copies are rejected instead of silently preferring one.
pub fn resolve(candidates: &[TrackerConfig]) -> Result<&TrackerConfig, ConfigError> {
    let first = candidates.first().ok_or(ConfigError::Missing)?;
    let expected = first.fingerprint();
    if candidates[1..].iter().any(|c| c.fingerprint() != expected) {
        log::warn!("config: {} copies with diverging fingerprints", candidates.len());
        return Err(ConfigError::Ambiguous);
    }
    Ok(first)
}
