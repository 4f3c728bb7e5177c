//! Symbol clock task
//!
//! Stands in for the CTC timer interrupt: while enabled it bumps the shared
//! [`TickCounter`] once per symbol period and does nothing else.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use crate::timer::{SymbolTimer, TickCounter};

/// Start (`true`) or stop (`false`) the symbol clock
pub type ClockControl = Signal<CriticalSectionRawMutex, bool>;

/// Shared start/stop signal for the symbol clock
pub static CLOCK_CONTROL: ClockControl = Signal::new();

/// Shared tick counter fed by the symbol clock
pub static SYMBOL_TICKS: TickCounter = TickCounter::new();

/// Task that paces WSPR symbols
pub async fn symbol_clock_task(timer: SymbolTimer, ticks: &'static TickCounter, control: &'static ClockControl) {
    let period = Duration::from_nanos(timer.period_ns());
    log::info!("clock: symbol period {} us", period.as_micros());

    loop {
        // Idle until a transmission starts
        while !control.wait().await {}

        ticks.reset();
        let mut ticker = Ticker::every(period);
        loop {
            match select(ticker.next(), control.wait()).await {
                Either::First(()) => ticks.on_tick(),
                Either::Second(true) => {
                    // Restart: align to the new transmission
                    ticks.reset();
                    ticker.reset();
                }
                Either::Second(false) => break,
            }
        }
    }
}
