//! WSPR message types and the 50-bit source packing

use super::{Callsign, Locator, WsprError};

/// Legal WSPR power codes in dBm
pub const POWER_LEVELS: [u8; 19] = [
    0, 3, 7, 10, 13, 17, 20, 23, 27, 30, 33, 37, 40, 43, 47, 50, 53, 57, 60,
];

/// Packed source message: 50 message bits followed by a zero tail, MSB first
pub type PackedMessage = [u8; 11];

/// Transmit power as one of the WSPR dBm codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerLevel(u8);

impl PowerLevel {
    pub fn new(dbm: u8) -> Result<Self, WsprError> {
        if POWER_LEVELS.contains(&dbm) {
            Ok(Self(dbm))
        } else {
            Err(WsprError::InvalidPower)
        }
    }

    /// Power level by its index in [`POWER_LEVELS`]
    pub fn from_index(index: usize) -> Result<Self, WsprError> {
        POWER_LEVELS
            .get(index)
            .map(|&dbm| Self(dbm))
            .ok_or(WsprError::InvalidPower)
    }

    pub fn dbm(&self) -> u8 {
        self.0
    }
}

/// A message ready for channel coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsprMessage {
    /// Type 1: plain callsign, four character locator, power
    Standard {
        callsign: Callsign,
        locator: Locator,
        power: PowerLevel,
    },
    /// Type 3: hashed callsign with a six character locator
    Extended {
        callsign: Callsign,
        locator: Locator,
        power: PowerLevel,
    },
}

impl WsprMessage {
    /// Type-1 message. Only the first four locator characters are sent.
    pub fn standard(callsign: Callsign, locator: Locator, power: PowerLevel) -> Self {
        Self::Standard {
            callsign,
            locator: locator.square(),
            power,
        }
    }

    /// Type-3 message. The locator must have six characters.
    pub fn extended(callsign: Callsign, locator: Locator, power: PowerLevel) -> Result<Self, WsprError> {
        if !locator.has_subsquare() {
            return Err(WsprError::InvalidLocator);
        }
        Ok(Self::Extended {
            callsign,
            locator,
            power,
        })
    }

    /// The 28-bit `n` and 22-bit `m` fields
    pub fn fields(&self) -> Result<(u32, u32), WsprError> {
        match self {
            WsprMessage::Standard {
                callsign,
                locator,
                power,
            } => {
                let n = callsign.pack();
                let m = locator.pack_square() * 128 + power.dbm() as u32 + 64;
                Ok((n, m))
            }
            WsprMessage::Extended {
                callsign,
                locator,
                power,
            } => {
                let rotated = locator.rotated().ok_or(WsprError::InvalidLocator)?;
                let n = Callsign::from_raw(rotated)?.pack();
                let hash = callsign_hash(callsign.as_str().as_bytes()) & 0x7FFF;
                let m = hash * 128 + 64 - (power.dbm() as u32 + 1);
                Ok((n, m))
            }
        }
    }

    /// Pack into the 11-byte source block fed to the convolutional coder
    pub fn pack(&self) -> Result<PackedMessage, WsprError> {
        let (n, m) = self.fields()?;
        Ok(pack_fields(n, m))
    }
}

/// Lay out `n` (28 bits) and `m` (22 bits) MSB first
pub fn pack_fields(n: u32, m: u32) -> PackedMessage {
    let mut c = [0u8; 11];
    c[0] = (n >> 20) as u8;
    c[1] = (n >> 12) as u8;
    c[2] = (n >> 4) as u8;
    c[3] = (((n & 0x0F) << 4) | ((m >> 18) & 0x0F)) as u8;
    c[4] = (m >> 10) as u8;
    c[5] = (m >> 2) as u8;
    c[6] = ((m & 0x03) << 6) as u8;
    c
}

/// Seed used by WSPR when hashing a callsign for type-3 messages
pub const CALLSIGN_HASH_SEED: u32 = 146;

/// Callsign hash carried in type-3 messages, before masking to 15 bits
pub fn callsign_hash(key: &[u8]) -> u32 {
    hashlittle(key, CALLSIGN_HASH_SEED)
}

/// Bob Jenkins' lookup3 `hashlittle`
pub fn hashlittle(key: &[u8], seed: u32) -> u32 {
    let mut a = 0xDEAD_BEEFu32
        .wrapping_add(key.len() as u32)
        .wrapping_add(seed);
    let mut b = a;
    let mut c = a;

    let mut rest = key;
    while rest.len() > 12 {
        a = a.wrapping_add(word(&rest[0..4]));
        b = b.wrapping_add(word(&rest[4..8]));
        c = c.wrapping_add(word(&rest[8..12]));
        mix(&mut a, &mut b, &mut c);
        rest = &rest[12..];
    }

    if rest.is_empty() {
        return c;
    }

    // Short tail: missing bytes count as zero
    let mut tail = [0u8; 12];
    tail[..rest.len()].copy_from_slice(rest);
    a = a.wrapping_add(word(&tail[0..4]));
    b = b.wrapping_add(word(&tail[4..8]));
    c = c.wrapping_add(word(&tail[8..12]));
    finalize(&mut a, &mut b, &mut c);
    c
}

fn word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn finalize(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}
