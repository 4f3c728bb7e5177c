//! LED task for non-blocking status blinks
//!
//! The tracker loop asks for a blink pattern; this task plays it without
//! holding up symbol timing.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;

use crate::config::LedConfig;

/// A burst of equal blinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkRequest {
    pub blinks: u8,
    pub on_ms: u64,
}

impl BlinkRequest {
    /// The fix-status pattern from the configuration
    pub fn from_config(config: &LedConfig) -> Self {
        Self {
            blinks: config.blinks,
            on_ms: config.blink_ms,
        }
    }
}

/// Type alias for the LED channel sender
pub type LedSender = Sender<'static, CriticalSectionRawMutex, BlinkRequest, 4>;

/// Type alias for the LED channel receiver
pub type LedReceiver = Receiver<'static, CriticalSectionRawMutex, BlinkRequest, 4>;

/// Channel for blink requests
pub static LED_CHANNEL: Channel<CriticalSectionRawMutex, BlinkRequest, 4> = Channel::new();

/// Gap between blinks in one burst
const BLINK_GAP_MS: u64 = 200;

/// Task that plays blink requests on an active-high LED
pub async fn led_task<P: OutputPin>(mut led: P, receiver: LedReceiver) {
    let _ = led.set_low();
    loop {
        let request = receiver.receive().await;

        for i in 0..request.blinks {
            if i > 0 {
                Timer::after(Duration::from_millis(BLINK_GAP_MS)).await;
            }
            let _ = led.set_high();
            Timer::after(Duration::from_millis(request.on_ms)).await;
            let _ = led.set_low();
        }
    }
}
