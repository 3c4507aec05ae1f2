//! Shared control-surface types exchanged between the transition
//! engine and whatever actuates the decks.

use std::fmt;

/// The two deck slots of the mixer surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckId {
    A,
    B,
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckId::A => write!(f, "A"),
            DeckId::B => write!(f, "B"),
        }
    }
}

/// Three-band EQ control values, 0-100 with 50 as unity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqSettings {
    pub hi: f32,
    pub mid: f32,
    pub lo: f32,
}

impl EqSettings {
    pub const NEUTRAL: EqSettings = EqSettings {
        hi: 50.0,
        mid: 50.0,
        lo: 50.0,
    };

    pub fn new(hi: f32, mid: f32, lo: f32) -> Self {
        Self { hi, mid, lo }
    }
}

impl Default for EqSettings {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// One full control-surface frame emitted by a transition tick.
///
/// Deck A is always the outgoing deck, deck B the incoming one.
/// Crossfader and volumes are 0-100, progress is 0-100.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSnapshot {
    pub crossfader: f32,
    pub eq_a: EqSettings,
    pub eq_b: EqSettings,
    pub vol_a: f32,
    pub vol_b: f32,
    pub progress: f32,
    pub status: String,
}

impl ControlSnapshot {
    /// The surface at rest before a transition touches it
    pub fn idle(crossfader: f32) -> Self {
        Self {
            crossfader,
            eq_a: EqSettings::NEUTRAL,
            eq_b: EqSettings::NEUTRAL,
            vol_a: 80.0,
            vol_b: 80.0,
            progress: 0.0,
            status: String::new(),
        }
    }

    /// The surface after a completed transition
    pub fn finished() -> Self {
        Self {
            crossfader: 100.0,
            eq_a: EqSettings::NEUTRAL,
            eq_b: EqSettings::NEUTRAL,
            vol_a: 80.0,
            vol_b: 80.0,
            progress: 100.0,
            status: "Transition complete".to_string(),
        }
    }
}

/// Available transition strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Adaptive: listens to the outgoing deck and reacts to breakdowns
    /// and drops
    Smart,
    Smooth,
    Drop,
    Long,
    Echo,
    Party,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Smart => "smart",
            Strategy::Smooth => "smooth",
            Strategy::Drop => "drop",
            Strategy::Long => "long",
            Strategy::Echo => "echo",
            Strategy::Party => "party",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_eq_is_all_fifty() {
        let eq = EqSettings::default();
        assert_eq!(eq.hi, 50.0);
        assert_eq!(eq.mid, 50.0);
        assert_eq!(eq.lo, 50.0);
    }

    #[test]
    fn finished_snapshot_parks_the_surface() {
        let snap = ControlSnapshot::finished();
        assert_eq!(snap.crossfader, 100.0);
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.eq_b, EqSettings::NEUTRAL);
    }

    #[test]
    fn strategy_names_round_trip_display() {
        assert_eq!(Strategy::Smart.to_string(), "smart");
        assert_eq!(Strategy::Party.to_string(), "party");
    }
}
