//! Camelot wheel notation for harmonic mixing
//!
//! DJs pick key-compatible tracks by wheel position: numbers 1-12 around
//! the circle of fifths, letter A for minor and B for major. Relative
//! major/minor keys share a number.

use std::fmt;

/// A musical key: pitch class of the tonic plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicalKey {
    /// Tonic pitch class, 0 = C .. 11 = B
    pub pitch_class: u8,
    /// Major or minor mode
    pub is_major: bool,
}

/// Note names used for display and fallback key strings
const NOTE_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Camelot wheel numbers for major keys, indexed by pitch class.
/// C major = 8B, G major = 9B, ... (circle of fifths).
const MAJOR_WHEEL: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Camelot wheel numbers for minor keys, indexed by pitch class.
/// A minor = 8A, E minor = 9A, ...
const MINOR_WHEEL: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

impl MusicalKey {
    pub fn new(pitch_class: u8, is_major: bool) -> Self {
        Self {
            pitch_class: pitch_class % 12,
            is_major,
        }
    }

    /// The note name of the tonic ("C", "F#", ...)
    pub fn note_name(&self) -> &'static str {
        NOTE_NAMES[self.pitch_class as usize]
    }

    /// Short musical notation: "C" for C major, "Am" for A minor.
    ///
    /// This is the fallback representation when a key has no Camelot
    /// wheel entry.
    pub fn short_name(&self) -> String {
        if self.is_major {
            self.note_name().to_string()
        } else {
            format!("{}m", self.note_name())
        }
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.note_name(),
            if self.is_major { "major" } else { "minor" }
        )
    }
}

/// Camelot wheel position (1A-12B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotKey {
    /// Position on the wheel (1-12)
    pub number: u8,
    /// true = B (major), false = A (minor)
    pub is_major: bool,
}

impl CamelotKey {
    /// Create a new Camelot key; `number` must be 1-12.
    pub fn new(number: u8, is_major: bool) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self { number, is_major })
    }

    /// Map a musical key onto the wheel.
    pub fn from_musical_key(key: MusicalKey) -> Self {
        let wheel = if key.is_major { &MAJOR_WHEEL } else { &MINOR_WHEEL };
        Self {
            number: wheel[key.pitch_class as usize % 12],
            is_major: key.is_major,
        }
    }

    /// Display string, e.g. "8A" or "12B"
    pub fn display(&self) -> String {
        format!("{}{}", self.number, if self.is_major { 'B' } else { 'A' })
    }

    /// Parse from a string like "8A" or "12B"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() < 2 {
            return None;
        }
        let is_major = match s.chars().last()?.to_ascii_uppercase() {
            'B' => true,
            'A' => false,
            _ => return None,
        };
        let number: u8 = s[..s.len() - 1].parse().ok()?;
        Self::new(number, is_major)
    }

    /// Check harmonic compatibility for mixing.
    ///
    /// Compatible: same key, relative major/minor (same number), or one
    /// step around the wheel in the same mode (wrapping 12 -> 1).
    pub fn is_compatible(&self, other: &CamelotKey) -> bool {
        if self.number == other.number {
            return true;
        }
        if self.is_major == other.is_major {
            let diff = (self.number as i8 - other.number as i8).abs();
            return diff == 1 || diff == 11;
        }
        false
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_mapping_matches_standard_chart() {
        // C major = 8B, A minor = 8A (relative pair)
        assert_eq!(
            CamelotKey::from_musical_key(MusicalKey::new(0, true)).display(),
            "8B"
        );
        assert_eq!(
            CamelotKey::from_musical_key(MusicalKey::new(9, false)).display(),
            "8A"
        );
        // G major = 9B, F minor = 4A
        assert_eq!(
            CamelotKey::from_musical_key(MusicalKey::new(7, true)).display(),
            "9B"
        );
        assert_eq!(
            CamelotKey::from_musical_key(MusicalKey::new(5, false)).display(),
            "4A"
        );
    }

    #[test]
    fn all_24_keys_have_unique_wheel_slots() {
        let mut seen = std::collections::HashSet::new();
        for pc in 0..12 {
            for is_major in [false, true] {
                let c = CamelotKey::from_musical_key(MusicalKey::new(pc, is_major));
                assert!((1..=12).contains(&c.number));
                assert!(seen.insert(c.display()));
            }
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn parse_round_trips() {
        for s in ["1A", "8B", "12A", "12B"] {
            assert_eq!(CamelotKey::parse(s).unwrap().display(), s);
        }
        assert!(CamelotKey::parse("13A").is_none());
        assert!(CamelotKey::parse("0B").is_none());
        assert!(CamelotKey::parse("8C").is_none());
        assert!(CamelotKey::parse("").is_none());
    }

    #[test]
    fn compatibility_rules() {
        let c8a = CamelotKey::parse("8A").unwrap();
        assert!(c8a.is_compatible(&CamelotKey::parse("8A").unwrap()));
        assert!(c8a.is_compatible(&CamelotKey::parse("8B").unwrap()));
        assert!(c8a.is_compatible(&CamelotKey::parse("7A").unwrap()));
        assert!(c8a.is_compatible(&CamelotKey::parse("9A").unwrap()));
        assert!(!c8a.is_compatible(&CamelotKey::parse("10A").unwrap()));
        assert!(!c8a.is_compatible(&CamelotKey::parse("9B").unwrap()));

        // Wheel wraps: 12 and 1 are adjacent
        let c12b = CamelotKey::parse("12B").unwrap();
        assert!(c12b.is_compatible(&CamelotKey::parse("1B").unwrap()));
    }

    #[test]
    fn short_names() {
        assert_eq!(MusicalKey::new(9, false).short_name(), "Am");
        assert_eq!(MusicalKey::new(0, true).short_name(), "C");
        assert_eq!(MusicalKey::new(6, false).short_name(), "F#m");
    }
}
