//! Sweepable filter stage (low-pass below center, high-pass above)
//!
//! One knob covers the classic DJ filter sweep: param 0-50 is a
//! low-pass closing down to 200 Hz, 50-100 switches to a high-pass
//! rising toward 5 kHz, with resonance increasing toward the extremes.

use super::{EffectState, WetDryMix};
use std::f32::consts::PI;

/// Filter response selected by the sweep position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepMode {
    #[default]
    LowPass,
    HighPass,
}

/// Biquad sweep filter with wet/dry blending
pub struct SweepFilter {
    state: EffectState,
    mode: SweepMode,
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    mix: WetDryMix,

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

impl SweepFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            state: EffectState::default(),
            mode: SweepMode::LowPass,
            sample_rate,
            cutoff: 20_000.0,
            resonance: 1.0,
            mix: WetDryMix::new(),
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
        filter.calculate_coefficients();
        filter
    }

    /// Apply a control write: enable state, sweep position, wet/dry
    pub fn set_control(&mut self, enabled: bool, param: f32, wet_dry: f32) {
        let param = param.clamp(0.0, 100.0);
        self.state = EffectState {
            enabled,
            wet_dry: wet_dry.clamp(0.0, 100.0),
            param,
        };

        if !enabled {
            self.mix.set_targets(1.0, 0.0);
            return;
        }

        let wet = self.state.wet_dry / 100.0;
        self.mix.set_targets(1.0 - wet, wet);

        // param 0-50: low-pass sweeping 200 Hz -> 20 kHz exponentially;
        // param 50-100: high-pass sweeping 20 Hz -> 5 kHz exponentially
        if param <= 50.0 {
            self.mode = SweepMode::LowPass;
            self.cutoff = (200.0 * 100.0f32.powf(param / 50.0)).min(20_000.0);
        } else {
            self.mode = SweepMode::HighPass;
            self.cutoff = 20.0 * 250.0f32.powf((param - 50.0) / 50.0);
        }
        // Resonance rises toward either extreme of the sweep
        self.resonance = 1.0 + (param - 50.0).abs() / 50.0 * 8.0;

        self.calculate_coefficients();
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn mode(&self) -> SweepMode {
        self.mode
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    pub fn dry_gain(&self) -> f32 {
        self.mix.dry()
    }

    pub fn wet_gain(&self) -> f32 {
        self.mix.wet()
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * (self.cutoff / self.sample_rate).min(0.49);
        let sin_w = omega.sin();
        let cos_w = omega.cos();
        let alpha = sin_w / (2.0 * self.resonance);

        let (b0, b1, b2) = match self.mode {
            SweepMode::LowPass => {
                let b1 = 1.0 - cos_w;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            SweepMode::HighPass => {
                let b1 = -(1.0 + cos_w);
                ((1.0 + cos_w) / 2.0, b1, (1.0 + cos_w) / 2.0)
            }
        };
        let a0 = 1.0 + alpha;
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos_w / a0;
        self.a2 = (1.0 - alpha) / a0;
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

    /// Process stereo interleaved samples in place
    pub fn process(&mut self, samples: &mut [f32]) {
        if self.mix.settled_dry() {
            return;
        }

        for frame in samples.chunks_mut(2) {
            if frame.len() < 2 {
                continue;
            }
            let (dry, wet) = self.mix.tick();
            let wet_l = self.process_sample(frame[0], false);
            let wet_r = self.process_sample(frame[1], true);
            frame[0] = frame[0] * dry + wet_l * wet;
            frame[1] = frame[1] * dry + wet_r * wet;
        }
    }

    pub fn reset(&mut self) {
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
