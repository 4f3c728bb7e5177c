//! Tracker controller
//!
//! Owns the collaborators and turns scheduler decisions into synthesizer
//! activity. Driven from three places:
//!
//! - [`Tracker::on_minute_tick`] at the top of every UTC minute
//! - [`Tracker::on_symbol_ticks`] whenever the symbol clock has fired
//! - [`Tracker::on_morse_unit`] once per Morse unit while the beacon runs
//!
//! Any failure during a transmission keys the output off and gives up on
//! that window. The next window starts from scratch.

use core::fmt;

use crate::config::{ConfigError, TrackerConfig};
use crate::gps::{FixState, GpsSource};
use crate::morse::{MorseEncoder, MorseError, MorseSession, MorseStep};
use crate::scheduler::{Decision, Scheduler, TrackerState};
use crate::sensors::{telemetry_voltage, Sensors};
use crate::synth::{hz, reference_hz, FrequencySynth, SynthError};
use crate::timer::{SymbolSession, SymbolStep, SymbolTimer, TimingError, MAX_TRANSMISSION_DRIFT_NS};
use crate::wspr::{self, Callsign, PowerLevel, TelemetryFrame, WsprError, WsprMessage};

/// Errors surfaced by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    Config(ConfigError),
    Synth(SynthError),
    Wspr(WsprError),
    Morse(MorseError),
    Timing(TimingError),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Config(e) => write!(f, "config: {}", e),
            TrackerError::Synth(e) => write!(f, "synth: {:?}", e),
            TrackerError::Wspr(e) => write!(f, "wspr: {}", e),
            TrackerError::Morse(e) => write!(f, "morse: {}", e),
            TrackerError::Timing(e) => write!(f, "timing: {}", e),
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(e: ConfigError) -> Self {
        TrackerError::Config(e)
    }
}

impl From<SynthError> for TrackerError {
    fn from(e: SynthError) -> Self {
        TrackerError::Synth(e)
    }
}

impl From<WsprError> for TrackerError {
    fn from(e: WsprError) -> Self {
        TrackerError::Wspr(e)
    }
}

impl From<MorseError> for TrackerError {
    fn from(e: MorseError) -> Self {
        TrackerError::Morse(e)
    }
}

impl From<TimingError> for TrackerError {
    fn from(e: TimingError) -> Self {
        TrackerError::Timing(e)
    }
}

/// Subsquare sent when the fix only resolves a four character square
const SQUARE_CENTRE: (u8, u8) = (12, 12);

/// Result of a minute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Nothing sent this minute
    Skipped,
    /// Previous transmission still on air
    Busy,
    Standard,
    Telemetry,
    Morse,
}

enum Session {
    None,
    Wspr(SymbolSession),
    Morse(MorseSession),
}

/// The balloon tracker
pub struct Tracker<'a, S, G, N> {
    config: &'a TrackerConfig,
    callsign: Callsign,
    power: PowerLevel,
    synth: S,
    gps: G,
    sensors: N,
    scheduler: Scheduler,
    session: Session,
}

impl<'a, S, G, N> Tracker<'a, S, G, N>
where
    S: FrequencySynth,
    G: GpsSource,
    N: Sensors,
{
    /// Validate the configuration and build the controller.
    ///
    /// An invalid configuration never reaches the air.
    pub fn new(config: &'a TrackerConfig, synth: S, gps: G, sensors: N) -> Result<Self, TrackerError> {
        config.validate()?;
        let callsign = Callsign::parse(config.station.callsign)?;
        let power = PowerLevel::new(config.station.power_dbm)?;

        let timer = Self::timer_for(config);
        if !timer.within_tolerance(MAX_TRANSMISSION_DRIFT_NS) {
            log::warn!(
                "tracker: symbol timer drifts {} ms per transmission",
                timer.transmission_drift_ns() / 1_000_000
            );
        }

        Ok(Self {
            config,
            callsign,
            power,
            synth,
            gps,
            sensors,
            scheduler: Scheduler::new(config.schedule, config.morse.enabled),
            session: Session::None,
        })
    }

    fn timer_for(config: &TrackerConfig) -> SymbolTimer {
        SymbolTimer::new(config.timer.ctc, config.timer.cpu_hz, config.timer.prescaler)
    }

    /// Symbol timer described by the configuration
    pub fn symbol_timer(&self) -> SymbolTimer {
        Self::timer_for(self.config)
    }

    pub fn state(&self) -> TrackerState {
        self.scheduler.state()
    }

    pub fn is_transmitting(&self) -> bool {
        self.scheduler.state().is_transmitting()
    }

    pub fn config(&self) -> &TrackerConfig {
        self.config
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    /// Current fix as reported by the GPS
    pub fn fix(&self) -> FixState {
        self.gps.current()
    }

    pub fn minutes_until_next_window(&self, utc_minute: u8) -> u8 {
        self.scheduler.minutes_until_next_window(utc_minute)
    }

    /// Initialise the synthesizer against the configured crystal
    pub async fn init_synth(&mut self) -> Result<(), TrackerError> {
        let reference = reference_hz(self.config.radio.si5351_freq_hz);
        log::info!("tracker: synth reference {} Hz", reference);
        self.synth.init(reference).await?;
        Ok(())
    }

    /// Length of one Morse unit
    pub fn morse_unit_ms(&self) -> u32 {
        MorseEncoder::new(self.config.morse.speed_wpm).unit_ms()
    }

    /// Handle the start of a UTC minute
    pub async fn on_minute_tick(&mut self, utc_minute: u8) -> Result<Activity, TrackerError> {
        self.on_minute_tick_at(utc_minute, 0).await
    }

    /// Handle a UTC minute first seen `second` seconds after it began.
    ///
    /// WSPR slots seen too late are skipped.
    pub async fn on_minute_tick_at(&mut self, utc_minute: u8, second: u8) -> Result<Activity, TrackerError> {
        let fix = self.gps.current();
        let result = match self.scheduler.on_minute_tick_at(utc_minute, second, &fix) {
            Decision::Busy => return Ok(Activity::Busy),
            Decision::Skip => return Ok(Activity::Skipped),
            Decision::Standard => {
                let message = WsprMessage::standard(self.callsign, fix.locator, self.power);
                log::info!(
                    "tracker: standard {} {} {}dBm",
                    self.callsign.as_str(),
                    fix.locator.square().as_str(),
                    self.power.dbm()
                );
                self.start_wspr(&message).await.map(|_| Activity::Standard)
            }
            Decision::Telemetry => match self.telemetry_message(&fix) {
                Ok(message) => self.start_wspr(&message).await.map(|_| Activity::Telemetry),
                Err(e) => Err(e),
            },
            Decision::Morse => self.start_morse().await.map(|_| Activity::Morse),
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
        result
    }

    fn telemetry_message(&mut self, fix: &FixState) -> Result<WsprMessage, TrackerError> {
        let subsquare = match fix.locator.subsquare() {
            Some(sub) => sub,
            None => {
                log::warn!(
                    "tracker: fix {} has no subsquare, sending square centre",
                    fix.locator.as_str()
                );
                SQUARE_CENTRE
            }
        };
        let frame = TelemetryFrame {
            altitude_m: fix.altitude_m,
            voltage: telemetry_voltage(&mut self.sensors, &self.config.sensors),
            temperature_c: self.sensors.read_temperature(),
            speed_knots: fix.speed_knots,
            gps_valid: fix.valid,
            satellites: fix.satellites,
            subsquare,
        };
        log::info!(
            "tracker: telemetry alt={}m {}V {}C",
            frame.altitude_m as i32,
            frame.voltage,
            frame.temperature_c
        );
        Ok(frame.encode(self.config.station.telem_char1, self.config.station.telem_char2)?)
    }

    async fn start_wspr(&mut self, message: &WsprMessage) -> Result<(), TrackerError> {
        let stream = wspr::encode(message)?;
        let mut session = SymbolSession::new(stream, self.config.radio.carrier());
        let first = session.start();

        self.synth
            .set_frequency(first, self.config.radio.correction_centihz)
            .await?;
        self.synth.enable_output(true).await?;
        self.session = Session::Wspr(session);
        Ok(())
    }

    async fn start_morse(&mut self) -> Result<(), TrackerError> {
        let morse = &self.config.morse;
        let seq = MorseEncoder::new(morse.speed_wpm).encode(morse.message)?;
        log::info!("tracker: no fix, sending morse \"{}\"", morse.message);

        // Output stays keyed off until the first unit
        self.synth
            .set_frequency(hz(morse.freq_hz), self.config.radio.correction_centihz)
            .await?;
        self.session = Session::Morse(MorseSession::new(seq));
        Ok(())
    }

    /// Feed the symbol clock ticks seen since the last call.
    ///
    /// Returns [`SymbolStep::Idle`] when no WSPR transmission is running.
    pub async fn on_symbol_ticks(&mut self, pending: u32) -> Result<SymbolStep, TrackerError> {
        let step = match &mut self.session {
            Session::Wspr(session) => session.advance(pending),
            _ => return Ok(SymbolStep::Idle),
        };

        let result = match step {
            Ok(SymbolStep::Idle) => Ok(SymbolStep::Idle),
            Ok(SymbolStep::Tone { index, freq }) => self
                .synth
                .set_frequency(freq, self.config.radio.correction_centihz)
                .await
                .map(|_| SymbolStep::Tone { index, freq })
                .map_err(TrackerError::from),
            Ok(SymbolStep::Complete) => self.finish().await.map(|_| SymbolStep::Complete),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            self.fail(e).await;
        }
        result
    }

    /// Advance the Morse beacon by one unit.
    ///
    /// Returns [`MorseStep::Complete`] when no beacon is running.
    pub async fn on_morse_unit(&mut self) -> Result<MorseStep, TrackerError> {
        let step = match &mut self.session {
            Session::Morse(session) => session.tick(),
            _ => return Ok(MorseStep::Complete),
        };

        let result = match step {
            MorseStep::KeyDown => self.synth.enable_output(true).await,
            MorseStep::KeyUp => self.synth.enable_output(false).await,
            MorseStep::Hold => Ok(()),
            MorseStep::Complete => {
                let result = self.finish().await.map(|_| MorseStep::Complete);
                if let Err(e) = result {
                    self.fail(e).await;
                }
                return result;
            }
        };

        match result {
            Ok(()) => Ok(step),
            Err(e) => {
                self.fail(e.into()).await;
                Err(e.into())
            }
        }
    }

    async fn finish(&mut self) -> Result<(), TrackerError> {
        self.session = Session::None;
        self.synth.enable_output(false).await?;
        self.scheduler.complete(&self.gps.current());
        log::info!("tracker: transmission complete");
        Ok(())
    }

    /// Key off and give up on the current window
    async fn fail(&mut self, error: TrackerError) {
        log::error!("tracker: {}", error);
        self.session = Session::None;
        if let Err(e) = self.synth.enable_output(false).await {
            log::error!("tracker: could not key off: {:?}", e);
        }
        self.scheduler.abort(&self.gps.current());
    }
}
