//! Flanger stage: short modulated delay with feedback
//!
//! A sine LFO sweeps the delay tap around a 5 ms base, producing the
//! characteristic comb sweep. One knob scales LFO rate, sweep depth and
//! feedback together. The LFO phase keeps advancing even while the
//! stage is bypassed, so re-enabling lands mid-sweep instead of
//! restarting from zero.

use super::{EffectState, WetDryMix};
use std::f32::consts::TAU;

/// Center of the modulated delay in seconds
const BASE_DELAY_SECS: f32 = 0.005;

/// Largest supported base + depth excursion in seconds
const MAX_DELAY_SECS: f32 = 0.020;

pub struct Flanger {
    state: EffectState,
    sample_rate: f32,
    /// Stereo interleaved circular buffer
    buffer: Vec<f32>,
    buffer_frames: usize,
    write_pos: usize,
    lfo_phase: f32,
    lfo_rate: f32,
    depth_secs: f32,
    feedback: f32,
    mix: WetDryMix,
}

impl Flanger {
    pub fn new(sample_rate: f32) -> Self {
        let buffer_frames = (sample_rate * MAX_DELAY_SECS) as usize + 2;
        Self {
            state: EffectState::default(),
            sample_rate,
            buffer: vec![0.0; buffer_frames * 2],
            buffer_frames,
            write_pos: 0,
            lfo_phase: 0.0,
            lfo_rate: 0.5,
            depth_secs: 0.002,
            feedback: 0.4,
            mix: WetDryMix::new(),
        }
    }

    /// Apply a control write.
    ///
    /// param maps to LFO rate 0.1-5.1 Hz, sweep depth 1-9 ms and
    /// feedback 0.3-0.8. Enabled dry gain is `1 - wet/2`.
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
        self.mix.set_targets(1.0 - wet * 0.5, wet);

        self.lfo_rate = 0.1 + param / 100.0 * 5.0;
        self.depth_secs = 0.001 + param / 100.0 * 0.008;
        self.feedback = 0.3 + param / 100.0 * 0.5;
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn lfo_rate(&self) -> f32 {
        self.lfo_rate
    }

    pub fn depth_secs(&self) -> f32 {
        self.depth_secs
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn dry_gain(&self) -> f32 {
        self.mix.dry()
    }

    pub fn wet_gain(&self) -> f32 {
        self.mix.wet()
    }

    /// Linear-interpolated read at a fractional delay behind write_pos
    #[inline]
    fn read_fractional(&self, delay_frames: f32, channel: usize) -> f32 {
        let whole = delay_frames as usize;
        let frac = delay_frames - whole as f32;
        let pos_a = (self.write_pos + self.buffer_frames - whole) % self.buffer_frames;
        let pos_b = (pos_a + self.buffer_frames - 1) % self.buffer_frames;
        let a = self.buffer[pos_a * 2 + channel];
        let b = self.buffer[pos_b * 2 + channel];
        a + (b - a) * frac
    }

    /// Process stereo interleaved samples in place
    pub fn process(&mut self, samples: &mut [f32]) {
        let phase_inc = TAU * self.lfo_rate / self.sample_rate;

        if self.mix.settled_dry() {
            // Keep the LFO moving while bypassed
            let frames = samples.len() / 2;
            self.lfo_phase = (self.lfo_phase + phase_inc * frames as f32) % TAU;
            return;
        }

        let max_delay = (self.buffer_frames - 2) as f32;
        for frame in samples.chunks_mut(2) {
            if frame.len() < 2 {
                continue;
            }
            let (dry, wet) = self.mix.tick();

            let sweep = self.lfo_phase.sin() * self.depth_secs * self.sample_rate;
            let delay_frames =
                (BASE_DELAY_SECS * self.sample_rate + sweep).clamp(1.0, max_delay);

            let wet_l = self.read_fractional(delay_frames, 0);
            let wet_r = self.read_fractional(delay_frames, 1);

            let write_idx = self.write_pos * 2;
            self.buffer[write_idx] = frame[0] + wet_l * self.feedback;
            self.buffer[write_idx + 1] = frame[1] + wet_r * self.feedback;

            frame[0] = frame[0] * dry + wet_l * wet;
            frame[1] = frame[1] * dry + wet_r * wet;

            self.write_pos = (self.write_pos + 1) % self.buffer_frames;
            self.lfo_phase = (self.lfo_phase + phase_inc) % TAU;
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.lfo_phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_maps_to_lfo_and_feedback() {
        let mut f = Flanger::new(48000.0);

        f.set_control(true, 0.0, 100.0);
        assert!((f.lfo_rate() - 0.1).abs() < 1e-6);
        assert!((f.depth_secs() - 0.001).abs() < 1e-6);
        assert!((f.feedback() - 0.3).abs() < 1e-6);

        f.set_control(true, 100.0, 100.0);
        assert!((f.lfo_rate() - 5.1).abs() < 1e-6);
        assert!((f.depth_secs() - 0.009).abs() < 1e-6);
        assert!((f.feedback() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn disabled_flanger_is_fully_dry() {
        let mut f = Flanger::new(48000.0);
        f.set_control(false, 50.0, 100.0);
        assert_eq!(f.dry_gain(), 1.0);
        assert_eq!(f.wet_gain(), 0.0);
    }

    #[test]
    fn enabled_flanger_colors_the_signal() {
        let mut f = Flanger::new(48000.0);
        f.set_control(true, 50.0, 100.0);

        let frames = 48000;
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let s = (TAU * 440.0 * i as f32 / 48000.0).sin() * 0.4;
            samples.push(s);
            samples.push(s);
        }
        let original = samples.clone();
        f.process(&mut samples);

        let diff: f32 = samples[9600..]
            .iter()
            .zip(&original[9600..])
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(diff > 1.0, "flanger left the signal untouched");
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn lfo_runs_while_bypassed() {
        let mut f = Flanger::new(48000.0);
        f.set_control(true, 100.0, 100.0);
        f.set_control(false, 100.0, 100.0);
        let before = f.lfo_phase;
        let mut samples = vec![0.0f32; 4096 * 2];
        f.process(&mut samples);
        assert!(f.lfo_phase != before);
    }
}
