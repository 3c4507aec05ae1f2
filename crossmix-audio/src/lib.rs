//! Signal path model for a two-deck mixer: per-deck EQ and effects,
//! crossfader curves, and the engine facade that enforces control
//! surface precedence during transitions.

pub mod channel;
pub mod effects;
pub mod engine;
pub mod eq;
pub mod mixer;

pub use channel::DeckChannel;
pub use effects::{
    ConvolutionReverb, EchoDelay, EffectState, EffectsChain, Flanger, SweepFilter, SweepMode,
};
pub use engine::{EngineError, EngineHandle, MixerEngine};
pub use eq::{eq_gain_db, ThreeBandEq};
pub use mixer::{crossfade_gains, CrossfaderCurve, Mixer};
