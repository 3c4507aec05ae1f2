//! Per-deck effects chain: filter -> delay -> reverb -> flanger
//!
//! Four independently toggleable stages wired in series. Every stage
//! has its own wet/dry gain pair so a disabled stage settles to a
//! transparent dry path while enabled stages blend per their wet/dry
//! control. All gain moves are short smoothed ramps.

mod delay;
mod filter;
mod flanger;
mod reverb;

pub use delay::EchoDelay;
pub use filter::{SweepFilter, SweepMode};
pub use flanger::Flanger;
pub use reverb::ConvolutionReverb;

/// Control state for one effect stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectState {
    pub enabled: bool,
    /// Wet/dry blend, 0 = fully dry, 100 = fully wet
    pub wet_dry: f32,
    /// Effect-specific primary parameter, 0-100
    pub param: f32,
}

impl Default for EffectState {
    fn default() -> Self {
        Self {
            enabled: false,
            wet_dry: 50.0,
            param: 50.0,
        }
    }
}

/// Wet/dry smoothing coefficient, ~10 ms at 48 kHz
const MIX_SMOOTH_COEFF: f32 = 0.9979;

/// Smoothed dry/wet gain node pair for one stage
#[derive(Debug, Clone, Copy)]
pub(crate) struct WetDryMix {
    target_dry: f32,
    target_wet: f32,
    current_dry: f32,
    current_wet: f32,
}

impl WetDryMix {
    /// A new pair starts fully dry (bypassed stage)
    pub(crate) fn new() -> Self {
        Self {
            target_dry: 1.0,
            target_wet: 0.0,
            current_dry: 1.0,
            current_wet: 0.0,
        }
    }

    pub(crate) fn set_targets(&mut self, dry: f32, wet: f32) {
        self.target_dry = dry.clamp(0.0, 1.0);
        self.target_wet = wet.clamp(0.0, 1.0);
    }

    /// Advance the ramps one frame; returns (dry, wet)
    #[inline]
    pub(crate) fn tick(&mut self) -> (f32, f32) {
        self.current_dry =
            MIX_SMOOTH_COEFF * self.current_dry + (1.0 - MIX_SMOOTH_COEFF) * self.target_dry;
        self.current_wet =
            MIX_SMOOTH_COEFF * self.current_wet + (1.0 - MIX_SMOOTH_COEFF) * self.target_wet;
        (self.current_dry, self.current_wet)
    }

    /// Commanded dry gain (ramp target)
    pub(crate) fn dry(&self) -> f32 {
        self.target_dry
    }

    /// Commanded wet gain (ramp target)
    pub(crate) fn wet(&self) -> f32 {
        self.target_wet
    }

    /// True once the wet path carries no signal at all
    pub(crate) fn settled_dry(&self) -> bool {
        self.target_wet == 0.0 && self.current_wet < 1e-4
    }
}

/// Deterministic xorshift64 PRNG for noise-based effect state.
/// Seedable so impulse responses are reproducible in tests.
#[derive(Debug, Clone)]
pub(crate) struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            // Zero would lock the generator
            state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed },
        }
    }

    /// Next value uniform in [0, 1)
    #[inline]
    pub(crate) fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Next value uniform in [-1, 1)
    #[inline]
    pub(crate) fn next_bipolar(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }
}

/// The four-stage chain, in fixed series order
pub struct EffectsChain {
    filter: SweepFilter,
    delay: EchoDelay,
    reverb: ConvolutionReverb,
    flanger: Flanger,
}

impl EffectsChain {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            filter: SweepFilter::new(sample_rate as f32),
            delay: EchoDelay::new(sample_rate),
            reverb: ConvolutionReverb::new(sample_rate),
            flanger: Flanger::new(sample_rate as f32),
        }
    }

    /// Reverb with a caller-supplied noise seed (deterministic IR)
    pub fn with_reverb_seed(sample_rate: u32, seed: u64) -> Self {
        Self {
            filter: SweepFilter::new(sample_rate as f32),
            delay: EchoDelay::new(sample_rate),
            reverb: ConvolutionReverb::with_seed(sample_rate, seed),
            flanger: Flanger::new(sample_rate as f32),
        }
    }

    pub fn set_filter(&mut self, enabled: bool, param: f32, wet_dry: f32) {
        self.filter.set_control(enabled, param, wet_dry);
    }

    pub fn set_delay(&mut self, enabled: bool, param: f32, wet_dry: f32) {
        self.delay.set_control(enabled, param, wet_dry);
    }

    pub fn set_reverb(&mut self, enabled: bool, param: f32, wet_dry: f32) {
        self.reverb.set_control(enabled, param, wet_dry);
    }

    pub fn set_flanger(&mut self, enabled: bool, param: f32, wet_dry: f32) {
        self.flanger.set_control(enabled, param, wet_dry);
    }

    pub fn filter(&self) -> &SweepFilter {
        &self.filter
    }

    pub fn delay(&self) -> &EchoDelay {
        &self.delay
    }

    pub fn reverb(&self) -> &ConvolutionReverb {
        &self.reverb
    }

    pub fn flanger(&self) -> &Flanger {
        &self.flanger
    }

    /// Process stereo interleaved samples through all four stages
    pub fn process(&mut self, samples: &mut [f32]) {
        self.filter.process(samples);
        self.delay.process(samples);
        self.reverb.process(samples);
        self.flanger.process(samples);
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.delay.reset();
        self.reverb.reset();
        self.flanger.reset();
    }
}
