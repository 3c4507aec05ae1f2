//! The engine facade: both deck channels, the mixer, and the write
//! precedence rules of the control surface.
//!
//! While a transition session owns the surface, user writes to the
//! crossfader, EQ and volume are dropped so the session's gesture is
//! never fought over. Effect and tempo writes always land. Session
//! writes arrive through the `DeckActuator` implementation on
//! `EngineHandle`, which bypasses the precedence check.

use std::sync::Arc;

use crossmix_analysis::BandEnergy;
use crossmix_transition::{DeckActuator, DeckId};
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

use crate::channel::DeckChannel;
use crate::mixer::{CrossfaderCurve, Mixer};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("playback rate {0} is not finite")]
    InvalidRate(f32),
    #[error("deck buffers and output must have equal lengths")]
    BufferSizeMismatch,
}

pub struct MixerEngine {
    deck_a: DeckChannel,
    deck_b: DeckChannel,
    mixer: Mixer,
    session_owned: bool,
}

impl MixerEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            deck_a: DeckChannel::new(sample_rate),
            deck_b: DeckChannel::new(sample_rate),
            mixer: Mixer::new(),
            session_owned: false,
        }
    }

    pub fn deck(&self, deck: DeckId) -> &DeckChannel {
        match deck {
            DeckId::A => &self.deck_a,
            DeckId::B => &self.deck_b,
        }
    }

    fn deck_mut(&mut self, deck: DeckId) -> &mut DeckChannel {
        match deck {
            DeckId::A => &mut self.deck_a,
            DeckId::B => &mut self.deck_b,
        }
    }

    pub fn crossfader(&self) -> f32 {
        self.mixer.position()
    }

    pub fn curve(&self) -> CrossfaderCurve {
        self.mixer.curve()
    }

    pub fn session_owned(&self) -> bool {
        self.session_owned
    }

    /// True when the surface accepts user writes for this control
    fn surface_free(&self, control: &str) -> bool {
        if self.session_owned {
            debug!(control, "ignoring user write while a session owns the surface");
            false
        } else {
            true
        }
    }

    // --- user-facing surface (subject to session precedence) ---

    pub fn set_crossfader(&mut self, position: f32) {
        if self.surface_free("crossfader") {
            self.apply_crossfader(position);
        }
    }

    pub fn set_eq(&mut self, deck: DeckId, hi: f32, mid: f32, lo: f32) {
        if self.surface_free("eq") {
            self.apply_eq(deck, hi, mid, lo);
        }
    }

    pub fn set_volume(&mut self, deck: DeckId, volume: f32) {
        if self.surface_free("volume") {
            self.apply_volume(deck, volume);
        }
    }

    // --- always-available controls ---

    pub fn set_curve(&mut self, curve: CrossfaderCurve) {
        self.mixer.set_curve(curve);
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.set_master_volume(volume);
    }

    pub fn set_filter(&mut self, deck: DeckId, enabled: bool, param: f32, wet_dry: f32) {
        self.deck_mut(deck)
            .effects_mut()
            .set_filter(enabled, param, wet_dry);
    }

    pub fn set_delay(&mut self, deck: DeckId, enabled: bool, param: f32, wet_dry: f32) {
        self.deck_mut(deck)
            .effects_mut()
            .set_delay(enabled, param, wet_dry);
    }

    pub fn set_reverb(&mut self, deck: DeckId, enabled: bool, param: f32, wet_dry: f32) {
        self.deck_mut(deck)
            .effects_mut()
            .set_reverb(enabled, param, wet_dry);
    }

    pub fn set_flanger(&mut self, deck: DeckId, enabled: bool, param: f32, wet_dry: f32) {
        self.deck_mut(deck)
            .effects_mut()
            .set_flanger(enabled, param, wet_dry);
    }

    pub fn set_playback_rate(&mut self, deck: DeckId, rate: f32) -> Result<(), EngineError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EngineError::InvalidRate(rate));
        }
        self.deck_mut(deck).set_playback_rate(rate);
        Ok(())
    }

    pub fn set_key_lock(&mut self, deck: DeckId, enabled: bool) {
        self.deck_mut(deck).set_key_lock(enabled);
    }

    // --- privileged applies, shared by user path and session path ---

    fn apply_crossfader(&mut self, position: f32) {
        self.mixer.set_position(position);
        let (gain_a, gain_b) = self.mixer.gains();
        self.deck_a.set_crossfade_gain(gain_a);
        self.deck_b.set_crossfade_gain(gain_b);
    }

    fn apply_eq(&mut self, deck: DeckId, hi: f32, mid: f32, lo: f32) {
        let channel = self.deck_mut(deck);
        channel.set_eq_hi(hi);
        channel.set_eq_mid(mid);
        channel.set_eq_lo(lo);
    }

    fn apply_volume(&mut self, deck: DeckId, volume: f32) {
        self.deck_mut(deck).set_volume(volume);
    }

    /// Band energy of the given deck's last processed block
    pub fn energy(&self, deck: DeckId) -> BandEnergy {
        self.deck(deck).energy()
    }

    /// Run both deck channels and sum them into the output. Buffers
    /// are stereo interleaved and must all be the same length.
    pub fn process(
        &mut self,
        deck_a: &mut [f32],
        deck_b: &mut [f32],
        out: &mut [f32],
    ) -> Result<(), EngineError> {
        if deck_a.len() != deck_b.len() || deck_a.len() != out.len() {
            return Err(EngineError::BufferSizeMismatch);
        }
        self.deck_a.process(deck_a);
        self.deck_b.process(deck_b);
        self.mixer.mix(deck_a, deck_b, out);
        Ok(())
    }

    /// Park the surface: EQ flat, volumes at 80, no session owner.
    /// Crossfader and effects keep their last values.
    pub fn reset_to_neutral(&mut self) {
        for deck in [DeckId::A, DeckId::B] {
            self.apply_eq(deck, 50.0, 50.0, 50.0);
            self.apply_volume(deck, 80.0);
        }
        self.session_owned = false;
        debug!("surface reset to neutral");
    }
}

/// Cloneable, lockable handle shared between the control loop and
/// callers. The `DeckActuator` implementation routes session writes
/// past the precedence check.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<MixerEngine>>,
}

impl EngineHandle {
    pub fn new(engine: MixerEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, MixerEngine> {
        self.inner.lock()
    }
}

impl DeckActuator for EngineHandle {
    fn begin_session_control(&mut self) {
        let mut engine = self.inner.lock();
        engine.session_owned = true;
        debug!("session took the control surface");
    }

    fn end_session_control(&mut self) {
        let mut engine = self.inner.lock();
        engine.session_owned = false;
        debug!("session released the control surface");
    }

    fn set_crossfader(&mut self, position: f32) {
        self.inner.lock().apply_crossfader(position);
    }

    fn set_eq(&mut self, deck: DeckId, hi: f32, mid: f32, lo: f32) {
        self.inner.lock().apply_eq(deck, hi, mid, lo);
    }

    fn set_volume(&mut self, deck: DeckId, volume: f32) {
        self.inner.lock().apply_volume(deck, volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_writes_land_on_a_free_surface() {
        let mut engine = MixerEngine::new(48000);
        engine.set_crossfader(70.0);
        engine.set_eq(DeckId::A, 40.0, 30.0, 20.0);
        engine.set_volume(DeckId::B, 65.0);

        assert_eq!(engine.crossfader(), 70.0);
        assert_eq!(engine.deck(DeckId::A).eq().hi(), 40.0);
        assert_eq!(engine.deck(DeckId::B).volume(), 65.0);
    }

    #[test]
    fn session_ownership_blocks_user_surface_writes() {
        let mut handle = EngineHandle::new(MixerEngine::new(48000));
        handle.begin_session_control();

        {
            let mut engine = handle.lock();
            engine.set_crossfader(90.0);
            engine.set_eq(DeckId::A, 10.0, 10.0, 10.0);
            engine.set_volume(DeckId::A, 10.0);
            assert_eq!(engine.crossfader(), 50.0);
            assert_eq!(engine.deck(DeckId::A).eq().hi(), 50.0);
            assert_eq!(engine.deck(DeckId::A).volume(), 80.0);
        }

        // Session writes go through
        handle.set_crossfader(35.0);
        assert_eq!(handle.lock().crossfader(), 35.0);
    }

    #[test]
    fn effect_and_tempo_writes_pass_during_a_session() {
        let mut handle = EngineHandle::new(MixerEngine::new(48000));
        handle.begin_session_control();

        let mut engine = handle.lock();
        engine.set_filter(DeckId::A, true, 20.0, 100.0);
        assert!(engine.deck(DeckId::A).effects().filter().state().enabled);

        engine.set_playback_rate(DeckId::B, 1.05).unwrap();
        engine.set_key_lock(DeckId::B, true);
        assert_eq!(engine.deck(DeckId::B).playback_rate(), 1.05);
        assert!(engine.deck(DeckId::B).key_lock());
    }

    #[test]
    fn ending_a_session_keeps_the_last_written_values() {
        let mut handle = EngineHandle::new(MixerEngine::new(48000));
        handle.begin_session_control();
        handle.set_crossfader(82.0);
        handle.set_volume(DeckId::A, 12.0);
        handle.end_session_control();

        let mut engine = handle.lock();
        assert_eq!(engine.crossfader(), 82.0);
        assert_eq!(engine.deck(DeckId::A).volume(), 12.0);

        // Surface is free again
        engine.set_crossfader(40.0);
        assert_eq!(engine.crossfader(), 40.0);
    }

    #[test]
    fn reset_to_neutral_parks_the_surface() {
        let mut handle = EngineHandle::new(MixerEngine::new(48000));
        handle.begin_session_control();
        handle.set_eq(DeckId::B, 0.0, 0.0, 0.0);
        handle.set_volume(DeckId::B, 0.0);

        let mut engine = handle.lock();
        engine.reset_to_neutral();
        assert!(!engine.session_owned());
        assert_eq!(engine.deck(DeckId::B).eq().lo(), 50.0);
        assert_eq!(engine.deck(DeckId::B).volume(), 80.0);
    }

    #[test]
    fn non_finite_rate_is_rejected() {
        let mut engine = MixerEngine::new(48000);
        assert!(matches!(
            engine.set_playback_rate(DeckId::A, f32::NAN),
            Err(EngineError::InvalidRate(_))
        ));
        assert!(matches!(
            engine.set_playback_rate(DeckId::A, -1.0),
            Err(EngineError::InvalidRate(_))
        ));
    }

    #[test]
    fn process_rejects_mismatched_buffers() {
        let mut engine = MixerEngine::new(48000);
        let mut a = vec![0.0f32; 64];
        let mut b = vec![0.0f32; 32];
        let mut out = vec![0.0f32; 64];
        assert!(matches!(
            engine.process(&mut a, &mut b, &mut out),
            Err(EngineError::BufferSizeMismatch)
        ));
    }

    #[test]
    fn process_sums_both_decks() {
        let mut engine = MixerEngine::new(48000);
        engine.set_crossfader(50.0);

        let frames = 4096;
        let mut a: Vec<f32> = (0..frames * 2).map(|i| (i as f32 * 0.01).sin() * 0.2).collect();
        let mut b = a.clone();
        let mut out = vec![0.0f32; frames * 2];
        engine.process(&mut a, &mut b, &mut out).unwrap();

        assert!(out.iter().any(|&s| s.abs() > 0.0));
        assert!(out.iter().all(|s| s.is_finite()));
    }
}
