//! Audio analysis for Crossmix
//!
//! Provides the feature-extraction half of the mixer core: tempo
//! detection, musical key detection (with Camelot notation), banded
//! spectral energy, and the live spectrum tap that feeds it.

mod analyzer;
mod camelot;
mod energy;
mod key;
mod tap;
mod tempo;

pub use analyzer::{analyze_track, spawn_analysis, TrackMetadata};
pub use camelot::{CamelotKey, MusicalKey};
pub use energy::{band_energy, BandEnergy, EnergySample};
pub use key::{detect_key, detect_key_name, DetectedKey};
pub use tap::SpectrumTap;
pub use tempo::{detect_tempo, FALLBACK_BPM};
