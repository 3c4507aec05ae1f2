//! Three-band DJ EQ: low shelf, peaking mid, high shelf
//!
//! Control values are 0-100 with 50 as unity. The bottom half of the
//! range reaches a -24 dB kill, the top half adds up to +6 dB of boost,
//! which is the asymmetry DJ mixers use for bass swapping. Gain changes
//! ramp with a ~10 ms time constant so EQ moves never click.

use std::f32::consts::PI;

/// Low shelf corner frequency
const LO_FREQ: f32 = 320.0;

/// Peaking mid center frequency
const MID_FREQ: f32 = 1000.0;

/// Peaking mid bandwidth
const MID_Q: f32 = 0.5;

/// High shelf corner frequency
const HI_FREQ: f32 = 3200.0;

/// Parameter smoothing time constant in seconds
const SMOOTH_SECS: f32 = 0.010;

/// Gain delta (dB) below which biquad coefficients are not recomputed
const RECALC_EPSILON_DB: f32 = 0.05;

/// Map a 0-100 EQ control value to gain in dB.
///
/// [0, 50] maps linearly to [-24 dB, 0 dB]; [50, 100] maps linearly to
/// [0 dB, +6 dB]. 50 is always exactly unity.
pub fn eq_gain_db(value: f32) -> f32 {
    let v = value.clamp(0.0, 100.0);
    if v <= 50.0 {
        -24.0 + v / 50.0 * 24.0
    } else {
        (v - 50.0) / 50.0 * 6.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BandKind {
    LowShelf,
    Peaking,
    HighShelf,
}

/// One smoothed biquad band
struct Band {
    kind: BandKind,
    freq: f32,
    q: f32,
    sample_rate: f32,

    target_db: f32,
    current_db: f32,
    applied_db: f32,
    smooth_coeff: f32,

    // Normalized biquad coefficients
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Direct form I state, stereo
    x1_l: f32,
    x2_l: f32,
    y1_l: f32,
    y2_l: f32,
    x1_r: f32,
    x2_r: f32,
    y1_r: f32,
    y2_r: f32,
}

impl Band {
    fn new(kind: BandKind, freq: f32, q: f32, sample_rate: f32) -> Self {
        let mut band = Self {
            kind,
            freq,
            q,
            sample_rate,
            target_db: 0.0,
            current_db: 0.0,
            applied_db: f32::MAX, // force initial coefficient calculation
            smooth_coeff: (-1.0 / (SMOOTH_SECS * sample_rate)).exp(),
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1_l: 0.0,
            x2_l: 0.0,
            y1_l: 0.0,
            y2_l: 0.0,
            x1_r: 0.0,
            x2_r: 0.0,
            y1_r: 0.0,
            y2_r: 0.0,
        };
        band.recalculate(0.0);
        band
    }

    /// RBJ cookbook shelving/peaking coefficients for the given gain
    fn recalculate(&mut self, gain_db: f32) {
        let a = 10.0f32.powf(gain_db / 40.0);
        let omega = 2.0 * PI * self.freq / self.sample_rate;
        let sin_w = omega.sin();
        let cos_w = omega.cos();

        let (b0, b1, b2, a0, a1, a2) = match self.kind {
            BandKind::Peaking => {
                let alpha = sin_w / (2.0 * self.q);
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w,
                    1.0 - alpha / a,
                )
            }
            BandKind::LowShelf => {
                // Shelf slope S = 1
                let alpha = sin_w / 2.0 * 2.0f32.sqrt();
                let sqrt_a = a.sqrt();
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w + 2.0 * sqrt_a * alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                    a * ((a + 1.0) - (a - 1.0) * cos_w - 2.0 * sqrt_a * alpha),
                    (a + 1.0) + (a - 1.0) * cos_w + 2.0 * sqrt_a * alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                    (a + 1.0) + (a - 1.0) * cos_w - 2.0 * sqrt_a * alpha,
                )
            }
            BandKind::HighShelf => {
                let alpha = sin_w / 2.0 * 2.0f32.sqrt();
                let sqrt_a = a.sqrt();
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w + 2.0 * sqrt_a * alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                    a * ((a + 1.0) + (a - 1.0) * cos_w - 2.0 * sqrt_a * alpha),
                    (a + 1.0) - (a - 1.0) * cos_w + 2.0 * sqrt_a * alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                    (a + 1.0) - (a - 1.0) * cos_w - 2.0 * sqrt_a * alpha,
                )
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
        self.applied_db = gain_db;
    }

    fn set_gain_db(&mut self, gain_db: f32) {
        self.target_db = gain_db;
    }

    /// Advance the gain ramp one frame and refresh coefficients when
    /// the smoothed gain has moved far enough to matter
    #[inline]
    fn tick_smoothing(&mut self) {
        self.current_db =
            self.smooth_coeff * self.current_db + (1.0 - self.smooth_coeff) * self.target_db;
        if (self.current_db - self.applied_db).abs() > RECALC_EPSILON_DB {
            let db = self.current_db;
            self.recalculate(db);
        }
    }

    #[inline]
    fn process_sample(&mut self, input: f32, is_right: bool) -> f32 {
        let (x1, x2, y1, y2) = if is_right {
            (
                &mut self.x1_r,
                &mut self.x2_r,
                &mut self.y1_r,
                &mut self.y2_r,
            )
        } else {
            (
                &mut self.x1_l,
                &mut self.x2_l,
                &mut self.y1_l,
                &mut self.y2_l,
            )
        };

        let output =
            self.b0 * input + self.b1 * *x1 + self.b2 * *x2 - self.a1 * *y1 - self.a2 * *y2;
        *x2 = *x1;
        *x1 = input;
        *y2 = *y1;
        *y1 = output;
        output
    }

    fn reset(&mut self) {
        self.x1_l = 0.0;
        self.x2_l = 0.0;
        self.y1_l = 0.0;
        self.y2_l = 0.0;
        self.x1_r = 0.0;
        self.x2_r = 0.0;
        self.y1_r = 0.0;
        self.y2_r = 0.0;
    }
}

/// Three-band EQ processing stereo interleaved audio
pub struct ThreeBandEq {
    lo: Band,
    mid: Band,
    hi: Band,
    /// Last control values as written (0-100)
    lo_value: f32,
    mid_value: f32,
    hi_value: f32,
}

impl ThreeBandEq {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            lo: Band::new(BandKind::LowShelf, LO_FREQ, 0.707, sample_rate),
            mid: Band::new(BandKind::Peaking, MID_FREQ, MID_Q, sample_rate),
            hi: Band::new(BandKind::HighShelf, HI_FREQ, 0.707, sample_rate),
            lo_value: 50.0,
            mid_value: 50.0,
            hi_value: 50.0,
        }
    }

    /// Set the low band control value (0-100, 50 = unity)
    pub fn set_lo(&mut self, value: f32) {
        self.lo_value = value.clamp(0.0, 100.0);
        self.lo.set_gain_db(eq_gain_db(self.lo_value));
    }

    /// Set the mid band control value (0-100, 50 = unity)
    pub fn set_mid(&mut self, value: f32) {
        self.mid_value = value.clamp(0.0, 100.0);
        self.mid.set_gain_db(eq_gain_db(self.mid_value));
    }

    /// Set the high band control value (0-100, 50 = unity)
    pub fn set_hi(&mut self, value: f32) {
        self.hi_value = value.clamp(0.0, 100.0);
        self.hi.set_gain_db(eq_gain_db(self.hi_value));
    }

    pub fn lo(&self) -> f32 {
        self.lo_value
    }

    pub fn mid(&self) -> f32 {
        self.mid_value
    }

    pub fn hi(&self) -> f32 {
        self.hi_value
    }

    /// Process stereo interleaved samples in place: lo -> mid -> hi
    pub fn process(&mut self, samples: &mut [f32]) {
        for frame in samples.chunks_mut(2) {
            self.lo.tick_smoothing();
            self.mid.tick_smoothing();
            self.hi.tick_smoothing();

            for (i, sample) in frame.iter_mut().enumerate() {
                let is_right = i == 1;
                let mut s = *sample;
                s = self.lo.process_sample(s, is_right);
                s = self.mid.process_sample(s, is_right);
                s = self.hi.process_sample(s, is_right);
                *sample = s;
            }
        }
    }

    pub fn reset(&mut self) {
        self.lo.reset();
        self.mid.reset();
        self.hi.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_mapping_endpoints() {
        assert!((eq_gain_db(0.0) - -24.0).abs() < 1e-6);
        assert!((eq_gain_db(50.0)).abs() < 1e-6);
        assert!((eq_gain_db(100.0) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn control_mapping_is_monotone() {
        let mut last = f32::MIN;
        for v in 0..=100 {
            let db = eq_gain_db(v as f32);
            assert!(db >= last);
            last = db;
        }
    }

    #[test]
    fn control_mapping_clamps() {
        assert_eq!(eq_gain_db(-10.0), eq_gain_db(0.0));
        assert_eq!(eq_gain_db(150.0), eq_gain_db(100.0));
    }

    #[test]
    fn unity_settings_pass_audio_through() {
        let mut eq = ThreeBandEq::new(48000.0);
        let mut samples: Vec<f32> = (0..2048)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 48000.0).sin() * 0.5)
            .collect();
        let original = samples.clone();
        eq.process(&mut samples);

        // At 0 dB everywhere the biquads are essentially identity
        let max_err = samples
            .iter()
            .zip(&original)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 0.01, "max error {}", max_err);
    }

    #[test]
    fn bass_kill_attenuates_low_tone() {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_lo(0.0); // -24 dB kill

        // 60 Hz tone, stereo interleaved, long enough for the ramp to settle
        let frames = 48000;
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let s = (2.0 * PI * 60.0 * i as f32 / 48000.0).sin() * 0.5;
            samples.push(s);
            samples.push(s);
        }
        eq.process(&mut samples);

        // Measure the tail, after smoothing has converged
        let tail = &samples[samples.len() / 2..];
        let peak = tail.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        // -24 dB of 0.5 is ~0.032; allow filter slop
        assert!(peak < 0.08, "peak after bass kill {}", peak);
    }

    #[test]
    fn setters_store_clamped_values() {
        let mut eq = ThreeBandEq::new(48000.0);
        eq.set_hi(150.0);
        eq.set_mid(-5.0);
        assert_eq!(eq.hi(), 100.0);
        assert_eq!(eq.mid(), 0.0);
    }
}
