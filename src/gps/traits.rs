//! GPS source trait for abstraction and testability

use super::FixState;

/// Read-only view of the most recent fix
pub trait GpsSource {
    /// Snapshot of the current fix. Called once per scheduling decision.
    fn current(&self) -> FixState;
}

impl<T: GpsSource + ?Sized> GpsSource for &T {
    fn current(&self) -> FixState {
        (**self).current()
    }
}

#[cfg(test)]
pub mod mock {
    //! Mock GPS for testing

    use super::*;
    use crate::gps::{Locator, UtcTime};
    use core::cell::{Cell, RefCell};

    /// Mock GPS receiver for unit testing
    pub struct MockGps {
        fix: RefCell<FixState>,
        reads: Cell<u32>,
    }

    impl MockGps {
        /// Mock with no fix yet
        pub fn new() -> Self {
            Self {
                fix: RefCell::new(FixState::no_fix()),
                reads: Cell::new(0),
            }
        }

        /// Mock holding a valid fix in the given locator
        pub fn with_fix(locator: &str, altitude_m: f32) -> Self {
            let gps = Self::new();
            gps.set_fix(FixState {
                valid: true,
                locator: Locator::parse(locator).unwrap(),
                altitude_m,
                utc: UtcTime::new(12, 0, 0),
                satellites: 9,
                speed_knots: 20.0,
            });
            gps
        }

        pub fn set_fix(&self, fix: FixState) {
            *self.fix.borrow_mut() = fix;
        }

        pub fn lose_fix(&self) {
            self.fix.borrow_mut().valid = false;
        }

        /// Number of times the fix was read
        pub fn reads(&self) -> u32 {
            self.reads.get()
        }
    }

    impl Default for MockGps {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GpsSource for MockGps {
        fn current(&self) -> FixState {
            self.reads.set(self.reads.get() + 1);
            *self.fix.borrow()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_fix() {
            let gps = MockGps::with_fix("FN42AX", 1500.0);
            assert!(gps.current().valid);

            gps.lose_fix();
            let fix = gps.current();
            assert!(!fix.valid);
            assert_eq!(fix.locator.as_str(), "FN42AX");
            assert_eq!(gps.reads(), 2);
        }

        #[test]
        fn test_reference_is_a_source() {
            let gps = MockGps::with_fix("JO22", 0.0);
            let by_ref: &MockGps = &gps;
            assert!(GpsSource::current(&by_ref).valid);
        }
    }
}
