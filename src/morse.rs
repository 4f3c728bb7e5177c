//! Morse fallback beacon
//!
//! Sent instead of WSPR while there is no GPS fix, so a ground station can
//! still hear the balloon. Timing is expressed in dot units:
//! dot 1, dash 3, gap inside a character 1, between characters 3, between
//! words 7.

use core::fmt;

use heapless::Vec;

/// Maximum number of key intervals in one message
pub const MAX_INTERVALS: usize = 512;

/// PARIS convention: 20 WPM is a 60 ms unit
const PARIS_MS: u32 = 1200;

const TABLE: [(char, &str); 41] = [
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('/', "-..-."),
    ('?', "..--.."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('=', "-...-"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorseError {
    /// Character has no Morse representation
    UnsupportedChar(char),
    /// Message does not fit in the interval buffer
    TooLong,
}

impl fmt::Display for MorseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorseError::UnsupportedChar(c) => write!(f, "no morse code for {:?}", c),
            MorseError::TooLong => write!(f, "morse message too long"),
        }
    }
}

/// Key held down or up for a number of units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub key_down: bool,
    pub units: u8,
}

/// Alternating key-down/key-up intervals for a whole message.
///
/// Starts key-down and ends key-down; there is no trailing gap.
pub type MorseSequence = Vec<Interval, MAX_INTERVALS>;

fn pattern(c: char) -> Option<&'static str> {
    let c = c.to_ascii_uppercase();
    TABLE.iter().find(|(k, _)| *k == c).map(|(_, p)| *p)
}

/// Encodes text at a fixed speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorseEncoder {
    wpm: u8,
}

impl MorseEncoder {
    pub fn new(wpm: u8) -> Self {
        Self { wpm }
    }

    /// Length of one unit in milliseconds, 0 if the speed is 0
    pub fn unit_ms(&self) -> u32 {
        if self.wpm == 0 {
            0
        } else {
            PARIS_MS / self.wpm as u32
        }
    }

    pub fn encode(&self, text: &str) -> Result<MorseSequence, MorseError> {
        let mut seq = MorseSequence::new();
        let mut gap = 0u8;

        for c in text.chars() {
            if c == ' ' {
                // Only between words; leading and repeated blanks collapse
                if !seq.is_empty() {
                    gap = 7;
                }
                continue;
            }

            let code = pattern(c).ok_or(MorseError::UnsupportedChar(c))?;
            if !seq.is_empty() {
                push(&mut seq, false, gap.max(3))?;
            }
            for (i, element) in code.bytes().enumerate() {
                if i > 0 {
                    push(&mut seq, false, 1)?;
                }
                push(&mut seq, true, if element == b'-' { 3 } else { 1 })?;
            }
            gap = 0;
        }

        Ok(seq)
    }

    /// Total transmit time for a message in milliseconds
    pub fn duration_ms(&self, seq: &MorseSequence) -> u32 {
        total_units(seq) * self.unit_ms()
    }
}

fn push(seq: &mut MorseSequence, key_down: bool, units: u8) -> Result<(), MorseError> {
    seq.push(Interval { key_down, units })
        .map_err(|_| MorseError::TooLong)
}

pub fn total_units(seq: &MorseSequence) -> u32 {
    seq.iter().map(|i| i.units as u32).sum()
}

/// What to do with the key on this unit tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorseStep {
    KeyDown,
    KeyUp,
    /// Keep the key where it is
    Hold,
    Complete,
}

/// Plays a [`MorseSequence`] one unit tick at a time
#[derive(Debug, Clone)]
pub struct MorseSession {
    seq: MorseSequence,
    current: usize,
    remaining: u8,
    started: bool,
}

impl MorseSession {
    pub fn new(seq: MorseSequence) -> Self {
        Self {
            seq,
            current: 0,
            remaining: 0,
            started: false,
        }
    }

    pub fn tick(&mut self) -> MorseStep {
        if !self.started {
            self.started = true;
            return self.enter(0);
        }
        if self.current >= self.seq.len() {
            return MorseStep::Complete;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return MorseStep::Hold;
        }
        self.enter(self.current + 1)
    }

    fn enter(&mut self, index: usize) -> MorseStep {
        self.current = index;
        match self.seq.get(index) {
            Some(interval) => {
                self.remaining = interval.units;
                if interval.key_down {
                    MorseStep::KeyDown
                } else {
                    MorseStep::KeyUp
                }
            }
            None => MorseStep::Complete,
        }
    }
}
