//! Transmission scheduler
//!
//! Decides, once per UTC minute, what the tracker should put on air. The
//! standard report and the telemetry frame each own a minute in every
//! ten-minute decade; without a fix the Morse beacon takes over.
//!
//! ```text
//!            fix, m1             fix, m2            no fix, morse on
//! Idle ---------------> TxStandard / TxTelemetry / TxMorse
//!   ^                         |  complete/abort
//!   +-------------------------+  (AwaitingFix when the fix is gone)
//! ```

use crate::config::ScheduleWindow;
use crate::gps::FixState;
use crate::wspr::LATE_START_S;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    AwaitingFix,
    TransmittingStandard,
    TransmittingTelemetry,
    TransmittingMorse,
}

impl TrackerState {
    pub fn is_transmitting(&self) -> bool {
        matches!(
            self,
            TrackerState::TransmittingStandard
                | TrackerState::TransmittingTelemetry
                | TrackerState::TransmittingMorse
        )
    }
}

/// What to do this minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Standard,
    Telemetry,
    Morse,
    /// Nothing to send
    Skip,
    /// A transmission is still running
    Busy,
}

pub struct Scheduler {
    window: ScheduleWindow,
    morse_enabled: bool,
    state: TrackerState,
}

impl Scheduler {
    pub fn new(window: ScheduleWindow, morse_enabled: bool) -> Self {
        Self {
            window,
            morse_enabled,
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Decide for the minute that just started.
    ///
    /// The standard slot is checked before the telemetry slot, so equal
    /// offsets always send the standard report.
    pub fn on_minute_tick(&mut self, utc_minute: u8, fix: &FixState) -> Decision {
        self.on_minute_tick_at(utc_minute, 0, fix)
    }

    /// Decide for a minute first seen `second` seconds after it began.
    ///
    /// A WSPR slot seen at or after [`LATE_START_S`] is skipped, since a
    /// late start cannot be decoded. The Morse beacon is not slot bound.
    pub fn on_minute_tick_at(&mut self, utc_minute: u8, second: u8, fix: &FixState) -> Decision {
        if self.state.is_transmitting() {
            return Decision::Busy;
        }

        let slot = utc_minute % 10;
        let wspr_slot = slot == self.window.minute_message_1 || slot == self.window.minute_message_2;
        let (state, decision) = if fix.valid && wspr_slot && second >= LATE_START_S {
            log::info!("scheduler: minute {} seen at :{:02}, too late", utc_minute, second);
            (TrackerState::Idle, Decision::Skip)
        } else if fix.valid && slot == self.window.minute_message_1 {
            (TrackerState::TransmittingStandard, Decision::Standard)
        } else if fix.valid && slot == self.window.minute_message_2 {
            (TrackerState::TransmittingTelemetry, Decision::Telemetry)
        } else if !fix.valid && self.morse_enabled {
            (TrackerState::TransmittingMorse, Decision::Morse)
        } else if !fix.valid {
            (TrackerState::AwaitingFix, Decision::Skip)
        } else {
            (TrackerState::Idle, Decision::Skip)
        };

        if state != self.state {
            log::debug!("scheduler: minute {} {:?} -> {:?}", utc_minute, self.state, state);
        }
        self.state = state;
        decision
    }

    /// The running transmission finished normally
    pub fn complete(&mut self, fix: &FixState) {
        self.settle(fix);
    }

    /// The running transmission was cut short
    pub fn abort(&mut self, fix: &FixState) {
        log::warn!("scheduler: {:?} aborted", self.state);
        self.settle(fix);
    }

    fn settle(&mut self, fix: &FixState) {
        self.state = if fix.valid {
            TrackerState::Idle
        } else {
            TrackerState::AwaitingFix
        };
    }

    /// Minutes from `utc_minute` to the next WSPR slot, 0 if this is one.
    ///
    /// Used to decide how long the tracker may sleep.
    pub fn minutes_until_next_window(&self, utc_minute: u8) -> u8 {
        let slot = utc_minute % 10;
        [self.window.minute_message_1, self.window.minute_message_2]
            .iter()
            .map(|&m| (m + 10 - slot) % 10)
            .min()
            .unwrap_or(0)
    }
}
