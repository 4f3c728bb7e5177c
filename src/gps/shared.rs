//! Fix cell shared between the GPS decoder task and the tracker task.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use super::{FixState, GpsSource};

/// Latest fix, protected by a critical section
pub struct SharedFix {
    fix: Mutex<CriticalSectionRawMutex, RefCell<FixState>>,
    updated: Signal<CriticalSectionRawMutex, ()>,
}

impl SharedFix {
    pub const fn new() -> Self {
        Self {
            fix: Mutex::new(RefCell::new(FixState::no_fix())),
            updated: Signal::new(),
        }
    }

    /// Replace the stored fix and wake anyone waiting for an update
    pub fn publish(&self, fix: FixState) {
        self.fix.lock(|cell| {
            cell.replace(fix);
        });
        self.updated.signal(());
    }

    /// Wait until the decoder publishes again
    pub async fn wait_update(&self) {
        self.updated.wait().await
    }
}

impl Default for SharedFix {
    fn default() -> Self {
        Self::new()
    }
}

impl GpsSource for SharedFix {
    fn current(&self) -> FixState {
        self.fix.lock(|cell| *cell.borrow())
    }
}
