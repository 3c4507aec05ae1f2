//! Echo/delay stage with feedback
//!
//! One knob scales both the delay time (60 ms - 760 ms) and the
//! feedback amount, so longer echoes also ring out longer. Delay time
//! changes are smoothed to avoid pitch chirps when the knob moves.

use super::{EffectState, WetDryMix};

/// Longest supported delay in seconds
const MAX_DELAY_SECS: f32 = 1.0;

/// Delay-time smoothing coefficient (very slow, avoids clicks)
const TIME_SMOOTH_COEFF: f32 = 0.9995;

/// Stereo feedback delay
pub struct EchoDelay {
    state: EffectState,
    sample_rate: f32,
    /// Stereo interleaved circular buffer
    buffer: Vec<f32>,
    buffer_frames: usize,
    write_pos: usize,
    /// Current delay in frames (smoothed toward target)
    delay_frames: f32,
    target_frames: f32,
    feedback: f32,
    mix: WetDryMix,
}

impl EchoDelay {
    pub fn new(sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        let buffer_frames = (sr * MAX_DELAY_SECS) as usize;
        Self {
            state: EffectState::default(),
            sample_rate: sr,
            buffer: vec![0.0; buffer_frames * 2],
            buffer_frames,
            write_pos: 0,
            delay_frames: sr * 0.375,
            target_frames: sr * 0.375,
            feedback: 0.4,
            mix: WetDryMix::new(),
        }
    }

    /// Apply a control write.
    ///
    /// param maps linearly to delay time 0.06-0.76 s and feedback
    /// 0.2-0.7. Enabled dry gain is `1 - wet/2` so the echo can sit on
    /// top of the signal without collapsing the source.
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

        let delay_secs = 0.06 + param / 100.0 * 0.7;
        self.target_frames = delay_secs * self.sample_rate;
        self.feedback = 0.2 + param / 100.0 * 0.5;
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    /// Current delay time in seconds (smoothed value)
    pub fn delay_secs(&self) -> f32 {
        self.delay_frames / self.sample_rate
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

    #[inline]
    fn read_delayed(&self, delay: f32) -> (f32, f32) {
        let delay = delay.clamp(1.0, (self.buffer_frames - 1) as f32) as usize;
        let read_pos = (self.write_pos + self.buffer_frames - delay) % self.buffer_frames;
        (self.buffer[read_pos * 2], self.buffer[read_pos * 2 + 1])
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

            self.delay_frames = self.delay_frames * TIME_SMOOTH_COEFF
                + self.target_frames * (1.0 - TIME_SMOOTH_COEFF);

            let (delayed_l, delayed_r) = self.read_delayed(self.delay_frames);

            // Feed input plus echo back into the line. When the stage
            // is disabled the tail keeps circulating at reduced gain
            // until the wet ramp settles.
            let write_idx = self.write_pos * 2;
            if self.state.enabled {
                self.buffer[write_idx] = frame[0] + delayed_l * self.feedback;
                self.buffer[write_idx + 1] = frame[1] + delayed_r * self.feedback;
            } else {
                self.buffer[write_idx] = delayed_l * self.feedback * 0.9;
                self.buffer[write_idx + 1] = delayed_r * self.feedback * 0.9;
            }

            frame[0] = frame[0] * dry + delayed_l * wet;
            frame[1] = frame[1] * dry + delayed_r * wet;

            self.write_pos = (self.write_pos + 1) % self.buffer_frames;
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.delay_frames = self.target_frames;
    }
}
