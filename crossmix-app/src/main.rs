//! Crossmix demo: synthesize two tracks, analyze them in the
//! background, then hand deck A over to deck B with the adaptive
//! transition while a simulated live tap feeds the energy detectors.

use std::f32::consts::PI;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crossmix_analysis::{spawn_analysis, CamelotKey, EnergySample};
use crossmix_audio::{EngineHandle, MixerEngine};
use crossmix_transition::{
    energy_channel, DeckId, SmartConfig, Strategy, TransitionRunner, TICK_INTERVAL,
};
use ringbuf::traits::Producer;

const SAMPLE_RATE: u32 = 44100;

/// Four-on-the-floor kick pattern with a mid-range stab, enough for
/// the tempo detector to lock on
fn synth_beat_track(bpm: f32, secs: f32) -> Vec<f32> {
    let total = (secs * SAMPLE_RATE as f32) as usize;
    let beat_frames = (60.0 / bpm * SAMPLE_RATE as f32) as usize;
    let mut samples = vec![0.0f32; total];

    for (i, sample) in samples.iter_mut().enumerate() {
        let in_beat = i % beat_frames;
        let t = in_beat as f32 / SAMPLE_RATE as f32;
        if in_beat < 4096 {
            // Pitched-down kick thump
            let env = (-t * 40.0).exp();
            *sample += (2.0 * PI * 55.0 * t).sin() * env * 0.8;
        }
        // Quiet stab so the track is not pure silence between kicks
        let gt = i as f32 / SAMPLE_RATE as f32;
        *sample += (2.0 * PI * 440.0 * gt).sin() * 0.05;
    }
    samples
}

/// Sustained C-major chord bed for the key detector
fn synth_chord_track(secs: f32) -> Vec<f32> {
    let total = (secs * SAMPLE_RATE as f32) as usize;
    let freqs = [261.63f32, 329.63, 392.0]; // C4 E4 G4
    (0..total)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            freqs
                .iter()
                .map(|f| (2.0 * PI * f * t).sin())
                .sum::<f32>()
                * 0.2
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("synthesizing demo tracks");
    let track_a = Arc::new(synth_beat_track(128.0, 20.0));
    let track_b = Arc::new(synth_chord_track(20.0));

    // Analyze both decks off the main thread
    let rx_a = spawn_analysis(Arc::clone(&track_a), SAMPLE_RATE);
    let rx_b = spawn_analysis(Arc::clone(&track_b), SAMPLE_RATE);
    let meta_a = rx_a.recv()?;
    let meta_b = rx_b.recv()?;
    info!(bpm = meta_a.bpm, key = %meta_a.key, "deck A analyzed");
    info!(bpm = meta_b.bpm, key = %meta_b.key, "deck B analyzed");

    if let (Some(a), Some(b)) = (
        CamelotKey::parse(&meta_a.key),
        CamelotKey::parse(&meta_b.key),
    ) {
        info!(compatible = a.is_compatible(&b), "harmonic match check");
    }

    // Wire the engine and nudge deck B toward deck A's tempo
    let handle = EngineHandle::new(MixerEngine::new(SAMPLE_RATE));
    {
        let mut engine = handle.lock();
        let rate = meta_a.bpm as f32 / meta_b.bpm as f32;
        engine.set_playback_rate(DeckId::B, rate)?;
        engine.set_key_lock(DeckId::B, true);
        info!(
            rate,
            detune_cents = engine.deck(DeckId::B).detune_cents(),
            "deck B tempo-matched with key-lock"
        );
        engine.set_crossfader(0.0);
    }

    // Run the adaptive transition against a simulated live tap
    let (mut energy_tx, energy_rx) = energy_channel(256);
    let mut runner = TransitionRunner::new();
    let snapshots = runner.start(
        handle.clone(),
        Strategy::Smart,
        meta_a.bpm,
        0.0,
        energy_rx,
        SmartConfig::default(),
    )?;

    let block_frames = 2048usize;
    let mut stereo_a = vec![0.0f32; block_frames * 2];
    let mut stereo_b = vec![0.0f32; block_frames * 2];
    let mut out = vec![0.0f32; block_frames * 2];
    let mut cursor = 0usize;
    let started = Instant::now();
    let mut last_status = String::new();

    while runner.is_active() {
        // Feed the next block of each track through the signal path
        for i in 0..block_frames {
            let a = track_a[(cursor + i) % track_a.len()];
            let b = track_b[(cursor + i) % track_b.len()];
            stereo_a[i * 2] = a;
            stereo_a[i * 2 + 1] = a;
            stereo_b[i * 2] = b;
            stereo_b[i * 2 + 1] = b;
        }
        cursor = (cursor + block_frames) % track_a.len();

        let energy = {
            let mut engine = handle.lock();
            engine.process(&mut stereo_a, &mut stereo_b, &mut out)?;
            engine.energy(DeckId::A)
        };
        let _ = energy_tx.try_push(EnergySample::new(started.elapsed().as_secs_f64(), energy));

        for snap in snapshots.try_iter() {
            if snap.status != last_status {
                info!(
                    crossfader = snap.crossfader,
                    progress = snap.progress,
                    status = %snap.status,
                    "transition"
                );
                last_status = snap.status;
            }
        }

        thread::sleep(TICK_INTERVAL);
    }

    let engine = handle.lock();
    info!(
        crossfader = engine.crossfader(),
        elapsed = ?started.elapsed(),
        "transition finished"
    );
    Ok(())
}
