//! Tracker task: the main cooperative loop
//!
//! Watches the clock for minute rollover, hands each new minute to the
//! controller and then drives whatever transmission it started until it
//! finishes. Minute boundaries come from GPS time once the receiver has a
//! fix and from uptime before that.

use embassy_futures::select::select;
use embassy_time::{Duration, Instant, Ticker, Timer};

use crate::gps::{FixState, SharedFix};
use crate::led::should_blink;
use crate::morse::MorseStep;
use crate::sensors::Sensors;
use crate::synth::FrequencySynth;
use crate::timer::{SymbolStep, TickCounter};
use crate::tracker::{Activity, Tracker};
use crate::wspr::START_DELAY_MS;

use super::clock::ClockControl;
use super::led::{BlinkRequest, LedSender};

/// How often the fix is checked for a minute rollover
const POLL_INTERVAL_MS: u64 = 250;

/// How often pending symbol ticks are drained; well under one symbol
const SYMBOL_POLL_MS: u64 = 20;

/// Minute and second to schedule against
fn clock_for(fix: &FixState) -> (u8, u8) {
    if fix.valid {
        (fix.utc.minute, fix.utc.second)
    } else {
        let secs = Instant::now().as_secs();
        (((secs / 60) % 60) as u8, (secs % 60) as u8)
    }
}

/// Task that runs the tracker
pub async fn tracker_task<S: FrequencySynth, N: Sensors>(
    mut tracker: Tracker<'static, S, &'static SharedFix, N>,
    fix_updates: &'static SharedFix,
    ticks: &'static TickCounter,
    clock: &'static ClockControl,
    led_sender: LedSender,
) {
    log::info!(
        "tracker: {} on {} Hz, slots {}/{}",
        tracker.config().station.callsign,
        tracker.config().radio.wspr_freq_hz,
        tracker.config().schedule.minute_message_1,
        tracker.config().schedule.minute_message_2
    );

    if let Err(e) = tracker.init_synth().await {
        log::error!("tracker: synth init failed: {}", e);
    }

    let mut last_minute: Option<u8> = None;

    loop {
        // Wake on a new fix or after the poll interval, whichever is first
        select(
            Timer::after(Duration::from_millis(POLL_INTERVAL_MS)),
            fix_updates.wait_update(),
        )
        .await;

        let fix = tracker.fix();
        let (minute, second) = clock_for(&fix);
        if last_minute == Some(minute) {
            continue;
        }
        last_minute = Some(minute);

        if should_blink(&fix, &tracker.config().led) {
            let _ = led_sender.try_send(BlinkRequest::from_config(&tracker.config().led));
        }

        // WSPR transmissions start one second into the minute
        let second = if second == 0 {
            Timer::after(Duration::from_millis(START_DELAY_MS)).await;
            (START_DELAY_MS / 1000) as u8
        } else {
            second
        };

        match tracker.on_minute_tick_at(minute, second).await {
            Ok(Activity::Standard) | Ok(Activity::Telemetry) => {
                clock.signal(true);
                run_symbols(&mut tracker, ticks).await;
                clock.signal(false);
            }
            Ok(Activity::Morse) => run_morse(&mut tracker).await,
            Ok(Activity::Skipped) | Ok(Activity::Busy) => {}
            Err(e) => log::error!("tracker: minute {}: {}", minute, e),
        }

        if tracker.config().power.use_deepsleep && !tracker.is_transmitting() {
            let (minute, _) = clock_for(&tracker.fix());
            log::info!(
                "tracker: {} min to next slot, sleep allowed",
                tracker.minutes_until_next_window(minute)
            );
        }
    }
}

async fn run_symbols<S: FrequencySynth, N: Sensors>(
    tracker: &mut Tracker<'static, S, &'static SharedFix, N>,
    ticks: &'static TickCounter,
) {
    loop {
        Timer::after(Duration::from_millis(SYMBOL_POLL_MS)).await;
        match tracker.on_symbol_ticks(ticks.take()).await {
            Ok(SymbolStep::Complete) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("tracker: transmission dropped: {}", e);
                break;
            }
        }
    }
}

async fn run_morse<S: FrequencySynth, N: Sensors>(tracker: &mut Tracker<'static, S, &'static SharedFix, N>) {
    let unit = Duration::from_millis(tracker.morse_unit_ms() as u64);
    let mut ticker = Ticker::every(unit);
    loop {
        match tracker.on_morse_unit().await {
            Ok(MorseStep::Complete) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("tracker: morse dropped: {}", e);
                break;
            }
        }
        ticker.next().await;
    }
}
