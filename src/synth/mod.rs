//! Frequency synthesizer collaborator
//!
//! Frequencies are handled in hundredths of a hertz so the 1.46 Hz WSPR tone
//! spacing and the oscillator correction survive integer arithmetic.

pub mod traits;

pub use traits::{FrequencySynth, SynthError};

/// Frequency in 1/100 Hz
pub type Centihertz = u64;

/// Nominal reference crystal when the configured frequency is 0
pub const DEFAULT_REFERENCE_HZ: u32 = 25_000_000;

/// Convert whole hertz to centihertz
pub const fn hz(freq_hz: u64) -> Centihertz {
    freq_hz * 100
}

/// Reference oscillator frequency, treating 0 as the 25 MHz default
pub fn reference_hz(si5351_freq_hz: u32) -> u32 {
    if si5351_freq_hz == 0 {
        DEFAULT_REFERENCE_HZ
    } else {
        si5351_freq_hz
    }
}

/// Frequency the synthesizer is programmed to once the correction is applied
pub fn corrected_output(freq: Centihertz, correction_centihz: i32) -> Centihertz {
    freq.saturating_add_signed(correction_centihz as i64)
}

/// Tone frequency for a WSPR symbol (0..=3) above the base carrier.
///
/// Spacing is 12000/8192 Hz, rounded to the nearest centihertz.
pub fn symbol_tone(base: Centihertz, symbol: u8) -> Centihertz {
    base + (symbol as u64 * 1_200_000 + 4096) / 8192
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reference() {
        assert_eq!(reference_hz(0), 25_000_000);
        assert_eq!(reference_hz(26_000_000), 26_000_000);
    }

    #[test]
    fn test_correction_moves_output() {
        // -12000 hundredths is 120 Hz low
        let out = corrected_output(hz(14_097_100), -12_000);
        assert_eq!(out, hz(14_096_980));

        let out = corrected_output(hz(7_040_060), 250);
        assert_eq!(out, 704_006_250);
    }

    #[test]
    fn test_correction_saturates() {
        assert_eq!(corrected_output(50, -100), 0);
    }

    #[test]
    fn test_symbol_tones() {
        let base = hz(14_097_100);
        assert_eq!(symbol_tone(base, 0), base);
        assert_eq!(symbol_tone(base, 1), base + 146);
        assert_eq!(symbol_tone(base, 2), base + 293);
        assert_eq!(symbol_tone(base, 3), base + 439);
    }
}
