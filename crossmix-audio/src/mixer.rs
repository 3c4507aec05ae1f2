//! Crossfader curves and the two-deck summing mixer.
//!
//! Position runs 0-100: 0 is fully deck A, 100 fully deck B. The
//! curve decides how gain is traded across the travel.

use std::f32::consts::PI;

/// Shape of the gain trade across the crossfader travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossfaderCurve {
    /// Straight gain trade, dips to 50% power in the middle
    Linear,
    /// Equal-power cos/sin law, constant perceived loudness
    #[default]
    Smooth,
    /// Both decks at full gain with a snap confined to the outer edges
    Sharp,
}

/// Fraction of travel used for the sharp curve's cutover at each end
const SHARP_EDGE: f32 = 0.08;

/// Gains for deck A and deck B at a crossfader position (0-100)
pub fn crossfade_gains(position: f32, curve: CrossfaderCurve) -> (f32, f32) {
    let p = position.clamp(0.0, 100.0) / 100.0;
    match curve {
        CrossfaderCurve::Linear => (1.0 - p, p),
        CrossfaderCurve::Smooth => {
            let angle = p * PI / 2.0;
            (angle.cos(), angle.sin())
        }
        CrossfaderCurve::Sharp => {
            let a = if p <= 1.0 - SHARP_EDGE {
                1.0
            } else {
                ((p - (1.0 - SHARP_EDGE)) / SHARP_EDGE * PI / 2.0).cos()
            };
            let b = if p >= SHARP_EDGE {
                1.0
            } else {
                (p / SHARP_EDGE * PI / 2.0).sin()
            };
            (a, b)
        }
    }
}

/// Two-deck summing mixer. Deck channels apply their own crossfade
/// gains; this sums the pre-gained buffers under the master volume.
pub struct Mixer {
    position: f32,
    curve: CrossfaderCurve,
    master_volume: f32,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            position: 50.0,
            curve: CrossfaderCurve::default(),
            master_volume: 100.0,
        }
    }

    pub fn set_position(&mut self, position: f32) {
        self.position = position.clamp(0.0, 100.0);
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn set_curve(&mut self, curve: CrossfaderCurve) {
        self.curve = curve;
    }

    pub fn curve(&self) -> CrossfaderCurve {
        self.curve
    }

    /// Master volume, 0-100
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 100.0);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Per-deck gains at the current position and curve
    pub fn gains(&self) -> (f32, f32) {
        crossfade_gains(self.position, self.curve)
    }

    /// Sum two deck buffers into the output under the master volume.
    /// All three buffers must be the same length.
    pub fn mix(&self, deck_a: &[f32], deck_b: &[f32], out: &mut [f32]) {
        let master = self.master_volume / 100.0;
        for ((o, a), b) in out.iter_mut().zip(deck_a).zip(deck_b) {
            *o = (a + b) * master;
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [CrossfaderCurve; 3] = [
        CrossfaderCurve::Linear,
        CrossfaderCurve::Smooth,
        CrossfaderCurve::Sharp,
    ];

    #[test]
    fn endpoints_isolate_each_deck() {
        for curve in CURVES {
            let (a0, b0) = crossfade_gains(0.0, curve);
            assert!((a0 - 1.0).abs() < 1e-6, "{:?}", curve);
            assert!(b0.abs() < 1e-6, "{:?}", curve);

            let (a1, b1) = crossfade_gains(100.0, curve);
            assert!(a1.abs() < 1e-6, "{:?}", curve);
            assert!((b1 - 1.0).abs() < 1e-6, "{:?}", curve);
        }
    }

    #[test]
    fn gains_move_monotonically() {
        for curve in CURVES {
            let mut last_a = f32::MAX;
            let mut last_b = f32::MIN;
            for i in 0..=200 {
                let (a, b) = crossfade_gains(i as f32 / 2.0, curve);
                assert!(a <= last_a + 1e-6, "{:?} deck A at {}", curve, i);
                assert!(b >= last_b - 1e-6, "{:?} deck B at {}", curve, i);
                last_a = a;
                last_b = b;
            }
        }
    }

    #[test]
    fn smooth_curve_is_equal_power() {
        for i in 0..=100 {
            let (a, b) = crossfade_gains(i as f32, CrossfaderCurve::Smooth);
            assert!((a * a + b * b - 1.0).abs() < 1e-5, "position {}", i);
        }
    }

    #[test]
    fn sharp_curve_holds_full_gain_mid_travel() {
        for position in [10.0, 30.0, 50.0, 70.0, 90.0] {
            let (a, b) = crossfade_gains(position, CrossfaderCurve::Sharp);
            assert_eq!(a, 1.0, "position {}", position);
            assert_eq!(b, 1.0, "position {}", position);
        }
    }

    #[test]
    fn linear_curve_crosses_at_half_gain() {
        let (a, b) = crossfade_gains(50.0, CrossfaderCurve::Linear);
        assert!((a - 0.5).abs() < 1e-6);
        assert!((b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mix_sums_under_master_volume() {
        let mut mixer = Mixer::new();
        mixer.set_master_volume(50.0);
        let a = vec![0.2f32; 8];
        let b = vec![0.4f32; 8];
        let mut out = vec![0.0f32; 8];
        mixer.mix(&a, &b, &mut out);
        for &o in &out {
            assert!((o - 0.3).abs() < 1e-6);
        }
    }

    #[test]
    fn position_is_clamped() {
        let mut mixer = Mixer::new();
        mixer.set_position(250.0);
        assert_eq!(mixer.position(), 100.0);
        mixer.set_position(-5.0);
        assert_eq!(mixer.position(), 0.0);
    }
}
