//! Symbol timing
//!
//! A hardware timer (or an embassy ticker on the host side of things) fires
//! once per WSPR symbol. The interrupt only bumps a [`TickCounter`]; the
//! cooperative loop drains it and moves the [`SymbolSession`] forward, so
//! nothing heavier than an atomic add ever runs in interrupt context.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::synth::{symbol_tone, Centihertz};
use crate::wspr::{SymbolStream, SYMBOL_COUNT, SYMBOL_PERIOD_NS};

/// Drift budget for one full transmission
pub const MAX_TRANSMISSION_DRIFT_NS: u64 = 200_000_000;

/// Timer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingError {
    /// More than one tick arrived before the loop caught up
    MissedTick { symbol: usize, pending: u32 },
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingError::MissedTick { symbol, pending } => {
                write!(f, "missed symbol tick at {} ({} pending)", symbol, pending)
            }
        }
    }
}

/// CTC-mode timer that paces the symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTimer {
    pub ctc: u16,
    pub cpu_hz: u32,
    pub prescaler: u32,
}

impl SymbolTimer {
    pub const fn new(ctc: u16, cpu_hz: u32, prescaler: u32) -> Self {
        Self {
            ctc,
            cpu_hz,
            prescaler,
        }
    }

    /// Interrupt period. The counter runs 0..=ctc, so one period is ctc + 1 counts.
    pub fn period_ns(&self) -> u64 {
        if self.cpu_hz == 0 {
            return 0;
        }
        let counts = (self.ctc as u64 + 1) * self.prescaler as u64;
        counts * 1_000_000_000 / self.cpu_hz as u64
    }

    /// Accumulated error after `symbols` periods, positive when running slow
    pub fn drift_ns(&self, symbols: u32) -> i64 {
        (self.period_ns() as i64 - SYMBOL_PERIOD_NS as i64) * symbols as i64
    }

    /// Drift over one whole transmission
    pub fn transmission_drift_ns(&self) -> i64 {
        self.drift_ns(SYMBOL_COUNT as u32)
    }

    pub fn within_tolerance(&self, limit_ns: u64) -> bool {
        self.transmission_drift_ns().unsigned_abs() < limit_ns
    }
}

/// Tick source shared between the timer interrupt and the main loop
pub struct TickCounter {
    pending: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
        }
    }

    /// Called from the timer interrupt
    pub fn on_tick(&self) {
        self.pending.fetch_add(1, Ordering::Release);
    }

    /// Drain and return the ticks seen since the last call
    pub fn take(&self) -> u32 {
        self.pending.swap(0, Ordering::Acquire)
    }

    /// Drop any ticks left over from a previous transmission
    pub fn reset(&self) {
        self.pending.store(0, Ordering::Release);
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of feeding ticks to a [`SymbolSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStep {
    /// No tick since last time
    Idle,
    /// Move to this tone
    Tone { index: usize, freq: Centihertz },
    /// Last symbol has run its full period
    Complete,
}

/// One transmission in progress
#[derive(Debug, Clone)]
pub struct SymbolSession {
    stream: SymbolStream,
    base: Centihertz,
    next: usize,
}

impl SymbolSession {
    pub fn new(stream: SymbolStream, base: Centihertz) -> Self {
        Self {
            stream,
            base,
            next: 0,
        }
    }

    /// Tone for symbol 0, keyed as soon as the window opens
    pub fn start(&mut self) -> Centihertz {
        self.next = 1;
        self.tone(0)
    }

    /// Consume the pending tick count.
    ///
    /// Exactly one tick moves to the next symbol. Any backlog means a symbol
    /// was held too long and the transmission is no longer decodable.
    pub fn advance(&mut self, pending: u32) -> Result<SymbolStep, TimingError> {
        match pending {
            0 => Ok(SymbolStep::Idle),
            1 if self.next >= SYMBOL_COUNT => Ok(SymbolStep::Complete),
            1 => {
                let index = self.next;
                self.next += 1;
                Ok(SymbolStep::Tone {
                    index,
                    freq: self.tone(index),
                })
            }
            _ => Err(TimingError::MissedTick {
                symbol: self.next,
                pending,
            }),
        }
    }

    /// Symbols keyed so far
    pub fn sent(&self) -> usize {
        self.next
    }

    fn tone(&self, index: usize) -> Centihertz {
        symbol_tone(self.base, self.stream.get(index).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::timing;
    use crate::synth::hz;
    use crate::wspr::{encode, Callsign, Locator, PowerLevel, WsprMessage};

    fn session() -> SymbolSession {
        let msg = WsprMessage::standard(
            Callsign::parse("K1ABC").unwrap(),
            Locator::parse("FN42").unwrap(),
            PowerLevel::new(37).unwrap(),
        );
        SymbolSession::new(encode(&msg).unwrap(), hz(14_097_100))
    }

    #[test]
    fn test_period_8mhz() {
        let timer = SymbolTimer::new(5336, 8_000_000, 1024);
        assert_eq!(timer.period_ns(), 683_136_000);
    }

    #[test]
    fn test_configured_drift_within_budget() {
        let timer = SymbolTimer::new(timing::WSPR_CTC, timing::CPU_HZ, timing::PRESCALER);
        let drift = timer.transmission_drift_ns();
        // About 76 ms slow over 162 symbols
        assert!(drift > 75_000_000 && drift < 77_000_000);
        assert!(timer.within_tolerance(MAX_TRANSMISSION_DRIFT_NS));
    }

    #[test]
    fn test_other_clock_reloads() {
        assert!(SymbolTimer::new(2668, 4_000_000, 1024).within_tolerance(MAX_TRANSMISSION_DRIFT_NS));
        assert!(SymbolTimer::new(10672, 16_000_000, 1024).within_tolerance(MAX_TRANSMISSION_DRIFT_NS));
        // 16 MHz reload on an 8 MHz part runs at half speed
        assert!(!SymbolTimer::new(10672, 8_000_000, 1024).within_tolerance(MAX_TRANSMISSION_DRIFT_NS));
    }

    #[test]
    fn test_zero_clock() {
        assert_eq!(SymbolTimer::new(5336, 0, 1024).period_ns(), 0);
    }

    #[test]
    fn test_tick_counter() {
        let ticks = TickCounter::new();
        assert_eq!(ticks.take(), 0);
        ticks.on_tick();
        ticks.on_tick();
        assert_eq!(ticks.take(), 2);
        assert_eq!(ticks.take(), 0);

        ticks.on_tick();
        ticks.reset();
        assert_eq!(ticks.take(), 0);
    }

    #[test]
    fn test_session_runs_162_symbols() {
        let mut s = session();
        let first = s.start();
        assert!(first >= hz(14_097_100) && first <= hz(14_097_100) + 439);

        let mut tones = 1;
        let mut ticks = 0;
        loop {
            ticks += 1;
            match s.advance(1).unwrap() {
                SymbolStep::Tone { index, .. } => {
                    assert_eq!(index, tones);
                    tones += 1;
                }
                SymbolStep::Complete => break,
                SymbolStep::Idle => panic!("Tick should not be idle"),
            }
        }
        assert_eq!(tones, SYMBOL_COUNT);
        assert_eq!(ticks, SYMBOL_COUNT);
    }

    #[test]
    fn test_no_tick_is_idle() {
        let mut s = session();
        s.start();
        assert_eq!(s.advance(0), Ok(SymbolStep::Idle));
        assert_eq!(s.sent(), 1);
    }

    #[test]
    fn test_missed_tick_is_error() {
        let mut s = session();
        s.start();
        s.advance(1).unwrap();
        assert_eq!(
            s.advance(2),
            Err(TimingError::MissedTick {
                symbol: 2,
                pending: 2
            })
        );
    }

    #[test]
    fn test_tones_follow_symbols() {
        let mut s = session();
        let stream = s.stream;
        let base = hz(14_097_100);
        assert_eq!(s.start(), symbol_tone(base, stream.symbols()[0]));
        match s.advance(1).unwrap() {
            SymbolStep::Tone { index, freq } => {
                assert_eq!(index, 1);
                assert_eq!(freq, symbol_tone(base, stream.symbols()[1]));
            }
            other => panic!("Expected tone, got {:?}", other),
        }
    }
}
