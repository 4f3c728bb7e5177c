//! Frequency synthesizer trait for abstraction and testability
//!
//! The tracker only needs to set an output frequency and key the output on
//! and off. Register-level programming of the synthesizer chip belongs to
//! the board-specific implementation.

use super::Centihertz;
use core::future::Future;

/// Errors that can occur while programming the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthError {
    /// Bus communication with the chip failed
    Bus,
    /// Requested frequency cannot be synthesized
    OutOfRange,
    /// Chip has not been initialised
    NotInitialised,
}

/// Abstract synthesizer interface
///
/// Implemented by the board's Si5351 driver on the target and by a mock in
/// tests.
pub trait FrequencySynth {
    /// Bring the chip up against a reference crystal of `reference_hz`.
    ///
    /// Called once before the first transmission.
    fn init(&mut self, reference_hz: u32) -> impl Future<Output = Result<(), SynthError>>;

    /// Program the output frequency.
    ///
    /// `correction_centihz` is the oscillator calibration in 1/100 Hz; the
    /// chip ends up at [`super::corrected_output`] of the two arguments.
    fn set_frequency(
        &mut self,
        freq: Centihertz,
        correction_centihz: i32,
    ) -> impl Future<Output = Result<(), SynthError>>;

    /// Key the RF output on or off
    fn enable_output(&mut self, enabled: bool) -> impl Future<Output = Result<(), SynthError>>;
}

#[cfg(test)]
pub mod mock {
    //! Mock synthesizer for testing

    use super::*;
    use crate::synth::corrected_output;
    use core::cell::RefCell;
    use heapless::Vec;

    /// Mock synthesizer for unit testing
    pub struct MockSynth {
        /// Every frequency actually produced, after correction
        programmed: RefCell<Vec<Centihertz, 512>>,
        /// Every (requested, correction) pair
        requests: RefCell<Vec<(Centihertz, i32), 512>>,
        /// Current output state
        output_enabled: RefCell<bool>,
        /// Number of on/off transitions
        key_changes: RefCell<u32>,
        /// Error to return on next set_frequency
        next_error: RefCell<Option<SynthError>>,
        /// Error to return on next enable_output
        next_key_error: RefCell<Option<SynthError>>,
        /// Crystal frequency passed to init
        reference_hz: RefCell<Option<u32>>,
    }

    impl MockSynth {
        /// Create a new mock synthesizer
        pub fn new() -> Self {
            Self {
                programmed: RefCell::new(Vec::new()),
                requests: RefCell::new(Vec::new()),
                output_enabled: RefCell::new(false),
                key_changes: RefCell::new(0),
                next_error: RefCell::new(None),
                next_key_error: RefCell::new(None),
                reference_hz: RefCell::new(None),
            }
        }

        /// Set an error to be returned by the next set_frequency() call
        pub fn set_next_error(&self, error: SynthError) {
            *self.next_error.borrow_mut() = Some(error);
        }

        /// Set an error to be returned by the next enable_output() call
        pub fn set_next_key_error(&self, error: SynthError) {
            *self.next_key_error.borrow_mut() = Some(error);
        }

        /// Crystal frequency the chip was initialised with
        pub fn reference(&self) -> Option<u32> {
            *self.reference_hz.borrow()
        }

        /// Frequencies produced by the chip, in order
        pub fn programmed(&self) -> Vec<Centihertz, 512> {
            self.programmed.borrow().clone()
        }

        /// Frequencies requested by the caller, in order
        pub fn requests(&self) -> Vec<(Centihertz, i32), 512> {
            self.requests.borrow().clone()
        }

        /// Last frequency produced by the chip
        pub fn last_programmed(&self) -> Option<Centihertz> {
            self.programmed.borrow().last().copied()
        }

        pub fn is_output_enabled(&self) -> bool {
            *self.output_enabled.borrow()
        }

        pub fn key_changes(&self) -> u32 {
            *self.key_changes.borrow()
        }
    }

    impl Default for MockSynth {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FrequencySynth for MockSynth {
        async fn init(&mut self, reference_hz: u32) -> Result<(), SynthError> {
            *self.reference_hz.borrow_mut() = Some(reference_hz);
            Ok(())
        }

        async fn set_frequency(
            &mut self,
            freq: Centihertz,
            correction_centihz: i32,
        ) -> Result<(), SynthError> {
            if let Some(error) = self.next_error.borrow_mut().take() {
                return Err(error);
            }

            let _ = self.requests.borrow_mut().push((freq, correction_centihz));
            let _ = self
                .programmed
                .borrow_mut()
                .push(corrected_output(freq, correction_centihz));
            Ok(())
        }

        async fn enable_output(&mut self, enabled: bool) -> Result<(), SynthError> {
            if let Some(error) = self.next_key_error.borrow_mut().take() {
                return Err(error);
            }

            let mut current = self.output_enabled.borrow_mut();
            if *current != enabled {
                *self.key_changes.borrow_mut() += 1;
            }
            *current = enabled;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::synth::hz;

        #[test]
        fn test_mock_applies_correction() {
            let mut synth = MockSynth::new();

            futures::executor::block_on(async {
                synth.set_frequency(hz(14_097_100), -12_000).await.unwrap();

                assert_eq!(synth.last_programmed(), Some(hz(14_096_980)));
                assert_eq!(synth.requests()[0], (hz(14_097_100), -12_000));
            });
        }

        #[test]
        fn test_mock_error_is_one_shot() {
            let mut synth = MockSynth::new();

            futures::executor::block_on(async {
                synth.set_next_error(SynthError::Bus);
                assert_eq!(synth.set_frequency(hz(7_040_060), 0).await, Err(SynthError::Bus));

                synth.set_frequency(hz(7_040_060), 0).await.unwrap();
                assert_eq!(synth.programmed().len(), 1);
            });
        }

        #[test]
        fn test_mock_counts_key_changes() {
            let mut synth = MockSynth::new();

            futures::executor::block_on(async {
                synth.enable_output(true).await.unwrap();
                synth.enable_output(true).await.unwrap();
                synth.enable_output(false).await.unwrap();

                assert!(!synth.is_output_enabled());
                assert_eq!(synth.key_changes(), 2);
            });
        }

        #[test]
        fn test_mock_key_error_is_one_shot() {
            let mut synth = MockSynth::new();

            futures::executor::block_on(async {
                synth.enable_output(true).await.unwrap();
                synth.set_next_key_error(SynthError::Bus);
                assert_eq!(synth.enable_output(false).await, Err(SynthError::Bus));
                // Failed call leaves the output as it was
                assert!(synth.is_output_enabled());

                synth.enable_output(false).await.unwrap();
                assert!(!synth.is_output_enabled());
            });
        }

        #[test]
        fn test_mock_records_reference() {
            let mut synth = MockSynth::new();
            assert_eq!(synth.reference(), None);

            futures::executor::block_on(async {
                synth.init(25_000_000).await.unwrap();
            });
            assert_eq!(synth.reference(), Some(25_000_000));
        }
    }
}
