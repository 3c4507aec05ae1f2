//! Reverb stage built from a generated noise impulse response
//!
//! The impulse response is exponentially decaying noise. One knob
//! scales both the tail length (0.5 s - 4.5 s) and the decay exponent,
//! so small rooms die fast and large halls bloom. Rendering uses a
//! sparse tap set sampled from the response instead of full
//! convolution, which keeps the per-sample cost flat.

use super::{EffectState, WetDryMix, XorShiftRng};

/// Default noise seed when the caller does not supply one
const DEFAULT_SEED: u64 = 0xC0FF_EE11_D15C_0000;

/// Number of sparse taps rendered from the impulse response
const TAP_COUNT: usize = 64;

/// Longest supported tail in seconds (param = 100)
const MAX_IR_SECS: f32 = 4.5;

/// One rendered tap: delay in frames plus per-channel gain
#[derive(Debug, Clone, Copy)]
struct Tap {
    delay: usize,
    gain_l: f32,
    gain_r: f32,
}

pub struct ConvolutionReverb {
    state: EffectState,
    sample_rate: f32,
    rng: XorShiftRng,
    taps: Vec<Tap>,
    /// Param value the current taps were generated for. None until the
    /// first control write, so first use always regenerates.
    generated_for: Option<f32>,
    ir_secs: f32,
    decay: f32,
    /// Stereo interleaved input history
    buffer: Vec<f32>,
    buffer_frames: usize,
    write_pos: usize,
    mix: WetDryMix,
}

impl ConvolutionReverb {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_seed(sample_rate, DEFAULT_SEED)
    }

    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        let sr = sample_rate as f32;
        let buffer_frames = (sr * MAX_IR_SECS) as usize + 1;
        Self {
            state: EffectState::default(),
            sample_rate: sr,
            rng: XorShiftRng::new(seed),
            taps: Vec::new(),
            generated_for: None,
            ir_secs: 0.0,
            decay: 0.0,
            buffer: vec![0.0; buffer_frames * 2],
            buffer_frames,
            write_pos: 0,
            mix: WetDryMix::new(),
        }
    }

    /// Apply a control write.
    ///
    /// param maps to tail length 0.5-4.5 s and decay exponent 1-4. Taps
    /// are regenerated only when param actually changes, since
    /// generation is the expensive part. Enabled dry gain is
    /// `1 - wet * 0.3`, keeping most of the source under the tail.
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
        self.mix.set_targets(1.0 - wet * 0.3, wet);

        if self.generated_for != Some(param) {
            self.regenerate_taps(param);
            self.generated_for = Some(param);
        }
    }

    /// Build the sparse tap set for the given param: evenly spaced
    /// jittered positions across the tail, noise gains shaped by the
    /// decay envelope `(1 - t/len)^decay`, normalized so the summed
    /// tap gain cannot clip.
    fn regenerate_taps(&mut self, param: f32) {
        self.ir_secs = 0.5 + param / 100.0 * 4.0;
        self.decay = 1.0 + param / 100.0 * 3.0;
        let ir_frames = (self.ir_secs * self.sample_rate) as usize;

        self.taps.clear();
        for t in 0..TAP_COUNT {
            let jitter = self.rng.next_f32();
            let pos = ((t as f32 + jitter) / TAP_COUNT as f32 * ir_frames as f32) as usize;
            let pos = pos.clamp(1, self.buffer_frames - 1);
            let envelope = (1.0 - pos as f32 / ir_frames as f32).max(0.0).powf(self.decay);
            self.taps.push(Tap {
                delay: pos,
                gain_l: self.rng.next_bipolar() * envelope,
                gain_r: self.rng.next_bipolar() * envelope,
            });
        }

        let sum_abs: f32 = self
            .taps
            .iter()
            .map(|t| t.gain_l.abs().max(t.gain_r.abs()))
            .sum();
        if sum_abs > 1e-6 {
            let scale = 1.0 / sum_abs;
            for tap in &mut self.taps {
                tap.gain_l *= scale;
                tap.gain_r *= scale;
            }
        }
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    /// Tail length of the current impulse response in seconds
    pub fn ir_secs(&self) -> f32 {
        self.ir_secs
    }

    /// Decay exponent of the current impulse response
    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn dry_gain(&self) -> f32 {
        self.mix.dry()
    }

    pub fn wet_gain(&self) -> f32 {
        self.mix.wet()
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

            let write_idx = self.write_pos * 2;
            self.buffer[write_idx] = frame[0];
            self.buffer[write_idx + 1] = frame[1];

            let mut wet_l = 0.0;
            let mut wet_r = 0.0;
            for tap in &self.taps {
                let read_pos = (self.write_pos + self.buffer_frames - tap.delay) % self.buffer_frames;
                wet_l += self.buffer[read_pos * 2] * tap.gain_l;
                wet_r += self.buffer[read_pos * 2 + 1] * tap.gain_r;
            }

            frame[0] = frame[0] * dry + wet_l * wet;
            frame[1] = frame[1] * dry + wet_r * wet;

            self.write_pos = (self.write_pos + 1) % self.buffer_frames;
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_maps_to_tail_shape() {
        let mut r = ConvolutionReverb::with_seed(48000, 1);
        r.set_control(true, 0.0, 100.0);
        assert!((r.ir_secs() - 0.5).abs() < 1e-6);
        assert!((r.decay() - 1.0).abs() < 1e-6);

        r.set_control(true, 100.0, 100.0);
        assert!((r.ir_secs() - 4.5).abs() < 1e-6);
        assert!((r.decay() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn enabled_dry_gain_keeps_source() {
        let mut r = ConvolutionReverb::with_seed(48000, 1);
        r.set_control(true, 50.0, 100.0);
        assert!((r.dry_gain() - 0.7).abs() < 1e-6);
        assert!((r.wet_gain() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn disabled_reverb_is_fully_dry() {
        let mut r = ConvolutionReverb::with_seed(48000, 1);
        r.set_control(false, 50.0, 100.0);
        assert_eq!(r.dry_gain(), 1.0);
        assert_eq!(r.wet_gain(), 0.0);
    }

    #[test]
    fn wet_dry_change_does_not_regenerate_taps() {
        let mut r = ConvolutionReverb::with_seed(48000, 9);
        r.set_control(true, 40.0, 100.0);
        let before: Vec<(usize, f32)> = r.taps.iter().map(|t| (t.delay, t.gain_l)).collect();
        r.set_control(true, 40.0, 30.0);
        let after: Vec<(usize, f32)> = r.taps.iter().map(|t| (t.delay, t.gain_l)).collect();
        assert_eq!(before, after);

        r.set_control(true, 41.0, 30.0);
        let changed: Vec<(usize, f32)> = r.taps.iter().map(|t| (t.delay, t.gain_l)).collect();
        assert_ne!(before, changed);
    }

    #[test]
    fn same_seed_gives_identical_output() {
        let mut a = ConvolutionReverb::with_seed(48000, 7);
        let mut b = ConvolutionReverb::with_seed(48000, 7);
        a.set_control(true, 60.0, 100.0);
        b.set_control(true, 60.0, 100.0);

        let make = || -> Vec<f32> { (0..4096).map(|i| (i as f32 * 0.03).sin() * 0.4).collect() };
        let mut x = make();
        let mut y = make();
        a.process(&mut x);
        b.process(&mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn impulse_grows_a_tail() {
        let sr = 48000;
        let mut r = ConvolutionReverb::with_seed(sr, 3);
        r.set_control(true, 50.0, 100.0);

        let frames = sr as usize;
        let mut samples = vec![0.0f32; frames * 2];
        samples[0] = 1.0;
        samples[1] = 1.0;
        r.process(&mut samples);

        let tail_energy: f32 = samples[9600..].iter().map(|s| s.abs()).sum();
        assert!(tail_energy > 0.0);
        assert!(samples.iter().all(|s| s.is_finite()));
    }
}
