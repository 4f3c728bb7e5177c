//! Maidenhead grid locators

use super::WsprError;

/// Maidenhead locator of four or six characters.
///
/// Stored uppercase: field letters A-R, square digits 0-9 and, for six
/// characters, subsquare letters A-X.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    chars: [u8; 6],
    len: u8,
}

impl Locator {
    /// South-west corner of the grid, used before the first fix
    pub const ORIGIN: Locator = Locator {
        chars: *b"AA00AA",
        len: 6,
    };

    /// Parse a 4 or 6 character locator, case-insensitive
    pub fn parse(s: &str) -> Result<Self, WsprError> {
        let s = s.trim().as_bytes();
        if s.len() != 4 && s.len() != 6 {
            return Err(WsprError::InvalidLocator);
        }

        let mut chars = [b' '; 6];
        for (dst, &c) in chars.iter_mut().zip(s) {
            *dst = c.to_ascii_uppercase();
        }

        let field = |c: u8| (b'A'..=b'R').contains(&c);
        let sub = |c: u8| (b'A'..=b'X').contains(&c);
        if !field(chars[0]) || !field(chars[1]) {
            return Err(WsprError::InvalidLocator);
        }
        if !chars[2].is_ascii_digit() || !chars[3].is_ascii_digit() {
            return Err(WsprError::InvalidLocator);
        }
        if s.len() == 6 && (!sub(chars[4]) || !sub(chars[5])) {
            return Err(WsprError::InvalidLocator);
        }

        Ok(Self {
            chars,
            len: s.len() as u8,
        })
    }

    /// Six character locator for a position in decimal degrees.
    ///
    /// Longitude is east-positive, latitude north-positive. Values on the
    /// upper edge are folded into the last cell.
    pub fn from_lat_lon(lat: f64, lon: f64) -> Result<Self, WsprError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(WsprError::InvalidLocator);
        }

        // Work in units of 1/24 of a square (2.5' lat, 5' lon)
        let lon_units = (((lon + 180.0) * 12.0) as u32).min(18 * 10 * 24 - 1);
        let lat_units = (((lat + 90.0) * 24.0) as u32).min(18 * 10 * 24 - 1);

        let chars = [
            b'A' + (lon_units / 240) as u8,
            b'A' + (lat_units / 240) as u8,
            b'0' + ((lon_units / 24) % 10) as u8,
            b'0' + ((lat_units / 24) % 10) as u8,
            b'A' + (lon_units % 24) as u8,
            b'A' + (lat_units % 24) as u8,
        ];

        Ok(Self { chars, len: 6 })
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.chars[..self.len as usize]).unwrap_or("")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.chars[..self.len as usize]
    }

    pub fn has_subsquare(&self) -> bool {
        self.len == 6
    }

    /// Four character grid square
    pub fn square(&self) -> Self {
        Self {
            chars: [
                self.chars[0],
                self.chars[1],
                self.chars[2],
                self.chars[3],
                b' ',
                b' ',
            ],
            len: 4,
        }
    }

    /// Subsquare letters as indices 0..24, if present
    pub fn subsquare(&self) -> Option<(u8, u8)> {
        if self.has_subsquare() {
            Some((self.chars[4] - b'A', self.chars[5] - b'A'))
        } else {
            None
        }
    }

    /// 15-bit locator field of a type-1 message
    pub fn pack_square(&self) -> u32 {
        let c = &self.chars;
        let lon_field = (c[0] - b'A') as u32;
        let lat_field = (c[1] - b'A') as u32;
        let lon_square = (c[2] - b'0') as u32;
        let lat_square = (c[3] - b'0') as u32;
        (179 - 10 * lon_field - lon_square) * 180 + 10 * lat_field + lat_square
    }

    /// Locator rotated left by one, the way a type-3 message carries it in
    /// the callsign field. Requires six characters.
    pub fn rotated(&self) -> Option<[u8; 6]> {
        if !self.has_subsquare() {
            return None;
        }
        let mut out = self.chars;
        out.rotate_left(1);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let loc = Locator::parse("fn42ax").unwrap();
        assert_eq!(loc.as_str(), "FN42AX");
        assert_eq!(loc.square().as_str(), "FN42");
        assert_eq!(loc.subsquare(), Some((0, 23)));
        assert!(Locator::parse("FN42").unwrap().subsquare().is_none());
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(Locator::parse("FN4"), Err(WsprError::InvalidLocator));
        assert_eq!(Locator::parse("ZZ42"), Err(WsprError::InvalidLocator));
        assert_eq!(Locator::parse("FNAB"), Err(WsprError::InvalidLocator));
        assert_eq!(Locator::parse("FN42AZ"), Err(WsprError::InvalidLocator));
    }

    #[test]
    fn test_from_lat_lon() {
        // Newington, CT
        let loc = Locator::from_lat_lon(41.714775, -72.727260).unwrap();
        assert_eq!(loc.as_str(), "FN31PR");

        // Amsterdam
        let loc = Locator::from_lat_lon(52.37, 4.89).unwrap();
        assert_eq!(loc.square().as_str(), "JO22");
    }

    #[test]
    fn test_from_lat_lon_edges() {
        assert_eq!(Locator::from_lat_lon(-90.0, -180.0).unwrap().as_str(), "AA00AA");
        assert_eq!(Locator::from_lat_lon(90.0, 180.0).unwrap().as_str(), "RR99XX");
        assert!(Locator::from_lat_lon(91.0, 0.0).is_err());
    }

    #[test]
    fn test_origin() {
        assert_eq!(Locator::ORIGIN, Locator::parse("AA00AA").unwrap());
    }

    #[test]
    fn test_pack_square() {
        // (179 - 50 - 4) * 180 + 130 + 2
        assert_eq!(Locator::parse("FN42").unwrap().pack_square(), 22_632);
        assert_eq!(Locator::parse("AA00").unwrap().pack_square(), 179 * 180);
    }

    #[test]
    fn test_rotated() {
        let loc = Locator::parse("FN42AX").unwrap();
        assert_eq!(&loc.rotated().unwrap(), b"N42AXF");
        assert!(Locator::parse("FN42").unwrap().rotated().is_none());
    }
}
