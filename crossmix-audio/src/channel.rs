//! One deck's processing channel and its control surface.
//!
//! Fixed signal order: EQ -> effects -> volume gain -> crossfade gain,
//! then the processed audio feeds the analysis tap. Volume and
//! crossfade gains ramp with a ~10 ms smoother so control writes never
//! click.

use crossmix_analysis::{band_energy, BandEnergy, SpectrumTap};

use crate::effects::EffectsChain;
use crate::eq::ThreeBandEq;

/// Gain smoothing time constant in seconds
const GAIN_SMOOTH_SECS: f32 = 0.010;

/// FFT size of the per-deck analysis tap (128 bins)
const TAP_FFT_SIZE: usize = 256;

/// Playback rate bounds, +/- one octave
const MIN_RATE: f32 = 0.5;
const MAX_RATE: f32 = 2.0;

pub struct DeckChannel {
    eq: ThreeBandEq,
    effects: EffectsChain,

    volume: f32,
    target_volume_gain: f32,
    current_volume_gain: f32,

    crossfade_gain: f32,
    current_crossfade_gain: f32,

    playback_rate: f32,
    key_lock: bool,

    smooth_coeff: f32,
    tap: SpectrumTap,
    mono_scratch: Vec<f32>,
    last_energy: BandEnergy,
}

impl DeckChannel {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            eq: ThreeBandEq::new(sample_rate as f32),
            effects: EffectsChain::new(sample_rate),
            volume: 80.0,
            target_volume_gain: 0.8,
            current_volume_gain: 0.8,
            crossfade_gain: 1.0,
            current_crossfade_gain: 1.0,
            playback_rate: 1.0,
            key_lock: false,
            smooth_coeff: (-1.0 / (GAIN_SMOOTH_SECS * sample_rate as f32)).exp(),
            tap: SpectrumTap::new(TAP_FFT_SIZE),
            mono_scratch: Vec::new(),
            last_energy: BandEnergy::default(),
        }
    }

    pub fn set_eq_hi(&mut self, value: f32) {
        self.eq.set_hi(value);
    }

    pub fn set_eq_mid(&mut self, value: f32) {
        self.eq.set_mid(value);
    }

    pub fn set_eq_lo(&mut self, value: f32) {
        self.eq.set_lo(value);
    }

    pub fn eq(&self) -> &ThreeBandEq {
        &self.eq
    }

    pub fn effects(&self) -> &EffectsChain {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectsChain {
        &mut self.effects
    }

    /// Deck volume, 0-100
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 100.0);
        self.target_volume_gain = self.volume / 100.0;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Crossfade gain, 0-1, as computed by the mixer's curve
    pub fn set_crossfade_gain(&mut self, gain: f32) {
        self.crossfade_gain = gain.clamp(0.0, 1.0);
    }

    pub fn crossfade_gain(&self) -> f32 {
        self.crossfade_gain
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        self.playback_rate = rate.clamp(MIN_RATE, MAX_RATE);
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn set_key_lock(&mut self, enabled: bool) {
        self.key_lock = enabled;
    }

    pub fn key_lock(&self) -> bool {
        self.key_lock
    }

    /// Pitch correction applied to undo the rate change, in cents.
    /// Zero whenever key-lock is off.
    pub fn detune_cents(&self) -> f32 {
        if self.key_lock {
            -1200.0 * self.playback_rate.log2()
        } else {
            0.0
        }
    }

    /// Band energy of the most recently processed block
    pub fn energy(&self) -> BandEnergy {
        self.last_energy
    }

    /// Process one stereo interleaved block in place
    pub fn process(&mut self, samples: &mut [f32]) {
        self.eq.process(samples);
        self.effects.process(samples);

        for frame in samples.chunks_mut(2) {
            self.current_volume_gain = self.smooth_coeff * self.current_volume_gain
                + (1.0 - self.smooth_coeff) * self.target_volume_gain;
            self.current_crossfade_gain = self.smooth_coeff * self.current_crossfade_gain
                + (1.0 - self.smooth_coeff) * self.crossfade_gain;
            let gain = self.current_volume_gain * self.current_crossfade_gain;
            for sample in frame {
                *sample *= gain;
            }
        }

        self.feed_tap(samples);
    }

    fn feed_tap(&mut self, samples: &[f32]) {
        self.mono_scratch.clear();
        for frame in samples.chunks(2) {
            let sum: f32 = frame.iter().sum();
            self.mono_scratch.push(sum / frame.len() as f32);
        }
        let bins = self.tap.analyze(&self.mono_scratch);
        self.last_energy = band_energy(bins);
    }

    /// Clear all processing state (e.g. on track load)
    pub fn reset(&mut self) {
        self.eq.reset();
        self.effects.reset();
        self.tap.reset();
        self.last_energy = BandEnergy::default();
        self.current_volume_gain = self.target_volume_gain;
        self.current_crossfade_gain = self.crossfade_gain;
    }
}
