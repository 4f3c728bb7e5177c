//! Type-1 callsign normalisation and packing

use super::WsprError;

/// Callsign normalised to the six-character WSPR type-1 layout.
///
/// Index 2 is always a digit, indices 3..6 are letters or spaces, and the
/// first two positions may hold a letter, digit or space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callsign([u8; 6]);

impl Callsign {
    /// Normalise a callsign of up to six characters.
    ///
    /// Lowercase is folded to uppercase. A call whose digit sits in the
    /// second position ("K1ABC") gets a leading space; everything is right
    /// padded with spaces.
    pub fn parse(call: &str) -> Result<Self, WsprError> {
        let call = call.trim().as_bytes();
        if call.is_empty() || call.len() > 6 {
            return Err(WsprError::InvalidCallsign);
        }

        let mut raw = [b' '; 6];
        let offset = if call.len() > 1 && call[1].is_ascii_digit() && call.len() < 6 {
            1
        } else {
            0
        };
        for (dst, &c) in raw[offset..].iter_mut().zip(call) {
            *dst = c.to_ascii_uppercase();
        }

        Self::from_raw(raw)
    }

    /// Check and wrap an already padded six-byte callsign
    pub fn from_raw(raw: [u8; 6]) -> Result<Self, WsprError> {
        let alnum_or_space = |c: u8| c == b' ' || c.is_ascii_digit() || c.is_ascii_uppercase();
        let letter_or_space = |c: u8| c == b' ' || c.is_ascii_uppercase();

        if !alnum_or_space(raw[0]) || !alnum_or_space(raw[1]) {
            return Err(WsprError::InvalidCallsign);
        }
        if !raw[2].is_ascii_digit() {
            return Err(WsprError::InvalidCallsign);
        }
        if !raw[3..].iter().all(|&c| letter_or_space(c)) {
            return Err(WsprError::InvalidCallsign);
        }
        // A blank may lead the prefix but never sit inside it
        if raw[0] != b' ' && raw[1] == b' ' {
            return Err(WsprError::InvalidCallsign);
        }

        Ok(Self(raw))
    }

    /// Overwrite positions 1 and 3 with the flight-ID characters.
    ///
    /// The result must still be a valid type-1 callsign, so `third` has to be
    /// a digit.
    pub fn with_telemetry(&self, first: char, third: char) -> Result<Self, WsprError> {
        if !first.is_ascii() || !third.is_ascii() {
            return Err(WsprError::InvalidCallsign);
        }
        let mut raw = self.0;
        raw[0] = (first as u8).to_ascii_uppercase();
        raw[2] = third as u8;
        Self::from_raw(raw)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Callsign without padding
    pub fn as_str(&self) -> &str {
        // Only ASCII ever gets stored
        core::str::from_utf8(&self.0).map(str::trim).unwrap_or("")
    }

    /// Pack into the 28-bit callsign field
    pub fn pack(&self) -> u32 {
        let c = &self.0;
        let mut n = char_code(c[0]);
        n = n * 36 + char_code(c[1]);
        n = n * 10 + char_code(c[2]);
        n = n * 27 + (char_code(c[3]) - 10);
        n = n * 27 + (char_code(c[4]) - 10);
        n = n * 27 + (char_code(c[5]) - 10);
        n
    }
}

/// Digits 0-9, letters 10-35, space 36
fn char_code(c: u8) -> u32 {
    match c {
        b'0'..=b'9' => (c - b'0') as u32,
        b'A'..=b'Z' => (c - b'A') as u32 + 10,
        _ => 36,
    }
}
