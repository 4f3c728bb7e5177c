//! Voltage and temperature sensing collaborator
//!
//! ADC reads and divider scaling happen in the board code; this side only
//! picks which reading goes into telemetry and applies the calibration
//! offsets.

use crate::config::SensorConfig;

/// Sensor readings in volts and degrees Celsius
pub trait Sensors {
    /// Supply voltage as seen by the MCU
    fn read_voltage(&mut self) -> f32;

    /// Voltage on the external divider input, if one is fitted
    fn read_external_voltage(&mut self) -> Option<f32>;

    fn read_temperature(&mut self) -> f32;
}

/// Voltage reported in telemetry, with the configured offset applied.
///
/// Falls back to the supply voltage when the external input is selected but
/// gives no reading.
pub fn telemetry_voltage<S: Sensors>(sensors: &mut S, config: &SensorConfig) -> f32 {
    if config.use_external_voltage {
        if let Some(volts) = sensors.read_external_voltage() {
            return volts + config.ext_offset;
        }
        log::warn!("sensors: external voltage unavailable, using supply voltage");
    }
    sensors.read_voltage() + config.vcc_offset
}

#[cfg(test)]
pub mod mock {
    //! Fixed sensor readings for testing

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct MockSensors {
        pub voltage: f32,
        pub external: Option<f32>,
        pub temperature: f32,
    }

    impl MockSensors {
        pub fn new(voltage: f32, temperature: f32) -> Self {
            Self {
                voltage,
                external: None,
                temperature,
            }
        }
    }

    impl Default for MockSensors {
        fn default() -> Self {
            Self::new(4.1, -20.0)
        }
    }

    impl Sensors for MockSensors {
        fn read_voltage(&mut self) -> f32 {
            self.voltage
        }

        fn read_external_voltage(&mut self) -> Option<f32> {
            self.external
        }

        fn read_temperature(&mut self) -> f32 {
            self.temperature
        }
    }
}
