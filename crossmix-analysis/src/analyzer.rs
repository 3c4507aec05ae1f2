//! Offline track analysis with background delivery
//!
//! Tempo and key extraction are CPU-bound and must stay off the audio
//! callback and render threads. `spawn_analysis` runs the pass on a
//! worker thread and hands the result back over a channel.

use crate::key::detect_key_name;
use crate::tempo::detect_tempo;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Instant;

/// Metadata detected once when a track is loaded. Immutable afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// Detected tempo, normalized to 70-180 bpm
    pub bpm: u32,
    /// Camelot code ("8B") or short musical notation fallback ("Am")
    pub key: String,
    pub duration_seconds: f64,
}

/// Analyze a mono track synchronously. Prefer [`spawn_analysis`] from
/// latency-sensitive threads.
pub fn analyze_track(samples: &[f32], sample_rate: u32) -> TrackMetadata {
    let started = Instant::now();
    let bpm = detect_tempo(samples, sample_rate);
    let key = detect_key_name(samples, sample_rate);
    let duration_seconds = if sample_rate > 0 {
        samples.len() as f64 / sample_rate as f64
    } else {
        0.0
    };

    tracing::debug!(
        bpm,
        key = %key,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "track analysis complete"
    );

    TrackMetadata {
        bpm,
        key,
        duration_seconds,
    }
}

/// Run track analysis on a worker thread; the receiver yields exactly
/// one [`TrackMetadata`] when the pass finishes.
pub fn spawn_analysis(samples: Arc<Vec<f32>>, sample_rate: u32) -> Receiver<TrackMetadata> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let metadata = analyze_track(&samples, sample_rate);
        // Receiver may have been dropped if the track was unloaded
        let _ = tx.send(metadata);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tempo::FALLBACK_BPM;
    use std::time::Duration;

    #[test]
    fn silent_track_gets_safe_defaults() {
        let samples = vec![0.0f32; 44100 * 2];
        let meta = analyze_track(&samples, 44100);
        assert_eq!(meta.bpm, FALLBACK_BPM);
        assert_eq!(meta.key, "Am");
        assert!((meta.duration_seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn background_analysis_delivers_result() {
        let samples = Arc::new(vec![0.0f32; 44100]);
        let rx = spawn_analysis(samples, 44100);
        let meta = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("analysis result");
        assert_eq!(meta.bpm, FALLBACK_BPM);
        assert_eq!(meta.key, "Am");
    }
}
