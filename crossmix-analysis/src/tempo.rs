//! Tempo detection using windowed energy peaks and interval histograms
//!
//! Runs once per loaded track, off the audio thread. The detector is
//! deliberately forgiving: inconclusive input degrades to a fixed
//! fallback tempo instead of an error, so a track load never fails
//! because the music was too ambiguous to analyze.

use std::collections::HashMap;

/// Tempo returned when the input has too little rhythmic structure
pub const FALLBACK_BPM: u32 = 120;

/// Target rate for the decimated analysis signal
const ANALYSIS_RATE: f32 = 11_025.0;

/// Energy window length in decimated samples
const WINDOW_SIZE: usize = 1024;

/// Half-width of the neighborhood used for the local energy average
const LOCAL_WINDOW: usize = 10;

/// A window is a peak when its energy exceeds this multiple of the
/// surrounding neighborhood average
const PEAK_FACTOR: f32 = 1.3;

/// Detect the tempo of a mono sample buffer in beats per minute.
///
/// The result is always in the normalized DJ range [70, 180]. Degenerate
/// input (silence, too short, fewer than two detected beats) returns
/// [`FALLBACK_BPM`].
pub fn detect_tempo(samples: &[f32], sample_rate: u32) -> u32 {
    if samples.is_empty() || sample_rate == 0 {
        return FALLBACK_BPM;
    }

    // Decimate to ~11025 Hz, keeping magnitudes only. Aliasing is fine
    // here: we only care about the energy envelope.
    let step = (sample_rate as f32 / ANALYSIS_RATE).floor().max(1.0) as usize;
    let downsampled: Vec<f32> = samples.iter().step_by(step).map(|s| s.abs()).collect();

    // Energy per fixed-size window
    let energies: Vec<f32> = downsampled
        .chunks(WINDOW_SIZE)
        .map(|w| w.iter().map(|s| s * s).sum())
        .collect();

    // Peaks: windows whose energy stands out against the neighborhood
    let mut peaks: Vec<usize> = Vec::new();
    if energies.len() > LOCAL_WINDOW * 2 {
        for i in LOCAL_WINDOW..energies.len() - LOCAL_WINDOW {
            let local_avg: f32 = energies[i - LOCAL_WINDOW..i + LOCAL_WINDOW]
                .iter()
                .sum::<f32>()
                / (LOCAL_WINDOW * 2) as f32;
            if energies[i] > local_avg * PEAK_FACTOR {
                peaks.push(i);
            }
        }
    }

    if peaks.len() < 2 {
        tracing::debug!(peaks = peaks.len(), "insufficient peaks, using fallback tempo");
        return FALLBACK_BPM;
    }

    // Histogram of integer-quantized inter-peak intervals; the mode is
    // the beat period in windows.
    let mut histogram: HashMap<usize, u32> = HashMap::new();
    for pair in peaks.windows(2) {
        *histogram.entry(pair[1] - pair[0]).or_insert(0) += 1;
    }

    let best_interval = histogram
        .into_iter()
        .max_by_key(|&(interval, count)| (count, std::cmp::Reverse(interval)))
        .map(|(interval, _)| interval)
        .unwrap_or(0);

    if best_interval == 0 {
        return FALLBACK_BPM;
    }

    let seconds_per_window = WINDOW_SIZE as f32 / ANALYSIS_RATE;
    let seconds_per_beat = best_interval as f32 * seconds_per_window;
    let mut bpm = 60.0 / seconds_per_beat;

    // Fold octave errors into the normalized DJ range
    while bpm > 180.0 {
        bpm /= 2.0;
    }
    while bpm < 70.0 {
        bpm *= 2.0;
    }

    bpm.round() as u32
}
