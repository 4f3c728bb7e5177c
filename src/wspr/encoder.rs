//! Channel coding: convolutional code, interleaver and sync merge
//!
//! Every stage is a pure function over fixed-size arrays so the transmit
//! path never allocates.

use super::{PackedMessage, WsprError, WsprMessage, SYMBOL_COUNT};

/// Convolutional encoder polynomial G1
const POLY_1: u32 = 0xF2D0_5351;

/// Convolutional encoder polynomial G2
const POLY_2: u32 = 0xE461_3C47;

/// Synchronisation vector, one bit per symbol
pub const SYNC_VECTOR: [u8; SYMBOL_COUNT] = [
    1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0,
    0, 1, 0, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 1,
    0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1,
    1, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1,
    0, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0,
    0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1,
    0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1,
    0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0,
    0, 0,
];

/// The 162 channel symbols of one transmission, each 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStream([u8; SYMBOL_COUNT]);

impl SymbolStream {
    pub fn symbols(&self) -> &[u8; SYMBOL_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        SYMBOL_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Rate 1/2, K=32 convolutional code over the 81 source bits
pub fn convolve(packed: &PackedMessage) -> [u8; SYMBOL_COUNT] {
    let mut out = [0u8; SYMBOL_COUNT];
    let mut reg_1: u32 = 0;
    let mut reg_2: u32 = 0;
    let mut count = 0;

    'outer: for &byte in packed {
        for shift in (0..8).rev() {
            let bit = ((byte >> shift) & 1) as u32;
            reg_1 = (reg_1 << 1) | bit;
            reg_2 = (reg_2 << 1) | bit;

            out[count] = ((reg_1 & POLY_1).count_ones() & 1) as u8;
            out[count + 1] = ((reg_2 & POLY_2).count_ones() & 1) as u8;
            count += 2;

            if count >= SYMBOL_COUNT {
                break 'outer;
            }
        }
    }

    out
}

/// Bit-reversal interleaver.
///
/// Walks 0..=255; every index whose 8-bit reversal is below 162 receives the
/// next coded bit.
pub fn interleave(coded: &[u8; SYMBOL_COUNT]) -> [u8; SYMBOL_COUNT] {
    let mut out = [0u8; SYMBOL_COUNT];
    let mut next = 0;

    for j in 0..=255u8 {
        let rev = j.reverse_bits() as usize;
        if rev < SYMBOL_COUNT {
            out[rev] = coded[next];
            next += 1;
            if next >= SYMBOL_COUNT {
                break;
            }
        }
    }

    out
}

/// Combine data bits with the sync vector: `sync + 2 * data`
pub fn merge_sync(data: &[u8; SYMBOL_COUNT]) -> SymbolStream {
    let mut symbols = [0u8; SYMBOL_COUNT];
    for (i, symbol) in symbols.iter_mut().enumerate() {
        *symbol = SYNC_VECTOR[i] + 2 * (data[i] & 1);
    }
    SymbolStream(symbols)
}

/// Full encode of a message into channel symbols
pub fn encode(message: &WsprMessage) -> Result<SymbolStream, WsprError> {
    let packed = message.pack()?;
    Ok(encode_packed(&packed))
}

/// Encode an already packed source block
pub fn encode_packed(packed: &PackedMessage) -> SymbolStream {
    merge_sync(&interleave(&convolve(packed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wspr::{Callsign, Locator, PowerLevel};

    fn message(call: &str, grid: &str, dbm: u8) -> WsprMessage {
        WsprMessage::standard(
            Callsign::parse(call).unwrap(),
            Locator::parse(grid).unwrap(),
            PowerLevel::new(dbm).unwrap(),
        )
    }

    #[test]
    fn test_sync_vector_shape() {
        assert_eq!(SYNC_VECTOR.iter().filter(|&&b| b > 1).count(), 0);
        assert_eq!(SYNC_VECTOR[0], 1);
        assert_eq!(SYNC_VECTOR[161], 0);
    }

    #[test]
    fn test_zero_message_codes_to_zero() {
        let coded = convolve(&[0u8; 11]);
        assert!(coded.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_single_bit_impulse_response() {
        // A lone 1 as the first source bit: both registers hold 1, and both
        // polynomials have their low bit set
        let mut packed = [0u8; 11];
        packed[0] = 0x80;
        let coded = convolve(&packed);
        assert_eq!(&coded[..2], &[1, 1]);
        // Next output pair sees the bit shifted to position 1
        assert_eq!(coded[2], ((POLY_1 >> 1) & 1) as u8);
        assert_eq!(coded[3], ((POLY_2 >> 1) & 1) as u8);
    }

    #[test]
    fn test_interleave_is_a_permutation() {
        let mut coded = [0u8; SYMBOL_COUNT];
        coded[0] = 1;
        let out = interleave(&coded);
        // Index 0 reverses to 0
        assert_eq!(out[0], 1);
        assert_eq!(out.iter().filter(|&&b| b == 1).count(), 1);

        coded = [0u8; SYMBOL_COUNT];
        coded[1] = 1;
        let out = interleave(&coded);
        // j=1 reverses to 128
        assert_eq!(out[128], 1);
        assert_eq!(out.iter().filter(|&&b| b == 1).count(), 1);

        let ones = interleave(&[1u8; SYMBOL_COUNT]);
        assert!(ones.iter().all(|&b| b == 1));
    }

    #[test]
    fn test_symbol_count_and_range() {
        for call in ["K1ABC", "W1AW", "VE3XYZ", "G4A", "2E0ABC"] {
            let stream = encode(&message(call, "FN42", 37)).unwrap();
            assert_eq!(stream.len(), 162);
            assert!(stream.symbols().iter().all(|&s| s <= 3));
        }
    }

    #[test]
    fn test_sync_bit_survives() {
        let stream = encode(&message("K1ABC", "FN42", 37)).unwrap();
        for (i, &s) in stream.symbols().iter().enumerate() {
            assert_eq!(s & 1, SYNC_VECTOR[i]);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode(&message("K1ABC", "FN42", 37)).unwrap();
        let b = encode(&message("K1ABC", "FN42", 37)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inputs_change_symbols() {
        let base = encode(&message("K1ABC", "FN42", 37)).unwrap();
        assert_ne!(base, encode(&message("K1ABD", "FN42", 37)).unwrap());
        assert_ne!(base, encode(&message("K1ABC", "FN43", 37)).unwrap());
        assert_ne!(base, encode(&message("K1ABC", "FN42", 40)).unwrap());
    }

    #[test]
    fn test_data_bits_recoverable() {
        // Undo the merge and interleave, then compare against the coder output
        let msg = message("K1ABC", "FN42", 37);
        let coded = convolve(&msg.pack().unwrap());
        let stream = encode(&msg).unwrap();

        let mut next = 0;
        for j in 0..=255u8 {
            let rev = j.reverse_bits() as usize;
            if rev < SYMBOL_COUNT {
                assert_eq!(stream.get(rev).unwrap() >> 1, coded[next]);
                next += 1;
            }
        }
        assert_eq!(next, SYMBOL_COUNT);
    }

    #[test]
    fn test_reference_symbols() {
        // Channel symbols published for "K1ABC FN42 37"
        const EXPECTED: [u8; SYMBOL_COUNT] = [
            3, 3, 0, 0, 2, 0, 0, 0, 1, 0, 2, 0, 1, 3, 1, 2, 2, 2, 1, 0,
            0, 3, 2, 3, 1, 3, 3, 2, 2, 0, 2, 0, 0, 0, 3, 2, 0, 1, 2, 3,
            2, 2, 0, 0, 2, 2, 3, 2, 1, 1, 0, 2, 3, 3, 2, 1, 0, 2, 2, 1,
            3, 2, 1, 2, 2, 2, 0, 3, 3, 0, 3, 0, 3, 0, 1, 2, 1, 0, 2, 1,
            2, 0, 3, 2, 1, 3, 2, 0, 0, 3, 3, 2, 3, 0, 3, 2, 2, 0, 3, 0,
            2, 0, 2, 0, 1, 0, 2, 3, 0, 2, 1, 1, 1, 2, 3, 3, 0, 2, 3, 1,
            2, 1, 2, 2, 2, 1, 3, 3, 2, 0, 0, 0, 0, 1, 0, 3, 2, 0, 1, 3,
            2, 2, 2, 2, 2, 0, 2, 3, 3, 2, 3, 2, 3, 3, 2, 0, 0, 3, 1, 2,
            2, 2,
        ];
        let stream = encode(&message("K1ABC", "FN42", 37)).unwrap();
        assert_eq!(stream.symbols(), &EXPECTED);
    }
}
