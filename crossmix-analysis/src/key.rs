//! Key detection using chromagram analysis
//!
//! Builds a 12-bin pitch-class chromagram with per-pitch Goertzel
//! filters (cheaper than a full FFT when only 60 frequencies matter),
//! then correlates against the Krumhansl-Kessler key profiles to pick
//! the most likely tonal center.

use crate::camelot::{CamelotKey, MusicalKey};
use std::f32::consts::PI;

/// Krumhansl-Kessler major key profile, index 0 = tonic
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile, index 0 = tonic
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Analysis frame length in samples
const FRAME_SIZE: usize = 8192;

/// Hop between analysis frames (50% overlap)
const HOP_SIZE: usize = FRAME_SIZE / 2;

/// Longest segment analyzed, taken from the middle of the track
const SEGMENT_SECS: f32 = 30.0;

/// C4 reference frequency
const C4_FREQ: f32 = 261.63;

/// Lowest frequency worth probing; below this the frame resolution is
/// too coarse to separate pitch classes
const MIN_FREQ: f32 = 50.0;

/// Detected key for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedKey {
    pub key: MusicalKey,
    /// Camelot wheel position for the detected key
    pub camelot: CamelotKey,
}

/// Detect the musical key of a mono sample buffer.
///
/// Returns `None` for degenerate input (silence, empty buffer, all-zero
/// chromagram); key detection never fails a track load.
pub fn detect_key(samples: &[f32], sample_rate: u32) -> Option<DetectedKey> {
    let chromagram = compute_chromagram(samples, sample_rate);
    let max_val = chromagram.iter().cloned().fold(0.0f32, f32::max);
    if max_val <= 0.0 {
        return None;
    }

    let mut normalized = [0.0f32; 12];
    for (n, c) in normalized.iter_mut().zip(&chromagram) {
        *n = c / max_val;
    }

    let key = match_key_profile(&normalized);
    tracing::debug!(%key, "key detected");
    Some(DetectedKey {
        key,
        camelot: CamelotKey::from_musical_key(key),
    })
}

/// Detect the key and render it as the string the rest of the system
/// uses: a Camelot code like "8B", or "Am" for degenerate input.
pub fn detect_key_name(samples: &[f32], sample_rate: u32) -> String {
    match detect_key(samples, sample_rate) {
        Some(detected) => detected.camelot.display(),
        None => "Am".to_string(),
    }
}

/// Accumulate pitch-class magnitudes over a segment centered on the
/// track midpoint.
fn compute_chromagram(samples: &[f32], sample_rate: u32) -> [f32; 12] {
    let mut chroma = [0.0f32; 12];
    if samples.len() < FRAME_SIZE || sample_rate == 0 {
        return chroma;
    }

    let duration = samples.len() as f32 / sample_rate as f32;
    let segment_secs = SEGMENT_SECS.min(duration);
    let start = ((duration / 2.0 - segment_secs / 2.0).max(0.0) * sample_rate as f32) as usize;
    let end = (start + (segment_secs * sample_rate as f32) as usize).min(samples.len());

    // Pitch-class probe frequencies: C4..B4 across five octave offsets
    let base_freqs: Vec<f32> = (0..12)
        .map(|i| C4_FREQ * 2.0f32.powf(i as f32 / 12.0))
        .collect();
    let nyquist = sample_rate as f32 / 2.0;

    // Hann window, shared across all Goertzel passes of a frame
    let window: Vec<f32> = (0..FRAME_SIZE)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (FRAME_SIZE - 1) as f32).cos()))
        .collect();

    let mut pos = start;
    while pos + FRAME_SIZE < end {
        let frame = &samples[pos..pos + FRAME_SIZE];
        for (pc, &base) in base_freqs.iter().enumerate() {
            for octave in -2i32..=2 {
                let freq = base * 2.0f32.powi(octave);
                if freq < MIN_FREQ || freq > nyquist {
                    continue;
                }
                chroma[pc] += goertzel_magnitude(frame, &window, freq, sample_rate);
            }
        }
        pos += HOP_SIZE;
    }

    chroma
}

/// Single-bin windowed DFT magnitude at `freq` via the Goertzel
/// recurrence.
fn goertzel_magnitude(frame: &[f32], window: &[f32], freq: f32, sample_rate: u32) -> f32 {
    let k = (freq * frame.len() as f32 / sample_rate as f32).round();
    let w = 2.0 * PI * k / frame.len() as f32;
    let cos_w = w.cos();
    let sin_w = w.sin();

    let mut s1 = 0.0f32;
    let mut s2 = 0.0f32;
    for (sample, win) in frame.iter().zip(window) {
        let s0 = sample * win + 2.0 * cos_w * s1 - s2;
        s2 = s1;
        s1 = s0;
    }

    let real = s1 - s2 * cos_w;
    let imag = s2 * sin_w;
    (real * real + imag * imag).sqrt()
}

/// Correlate the normalized chromagram against all 24 rotated key
/// profiles and return the winner.
fn match_key_profile(chroma: &[f32; 12]) -> MusicalKey {
    let mut best_key = MusicalKey::new(0, true);
    let mut best_corr = f32::MIN;

    for root in 0..12u8 {
        let rotated = rotate(chroma, root);
        let major = pearson(&rotated, &MAJOR_PROFILE);
        if major > best_corr {
            best_corr = major;
            best_key = MusicalKey::new(root, true);
        }
        let minor = pearson(&rotated, &MINOR_PROFILE);
        if minor > best_corr {
            best_corr = minor;
            best_key = MusicalKey::new(root, false);
        }
    }

    best_key
}

/// Rotate the chromagram so `root` sits at index 0
fn rotate(chroma: &[f32; 12], root: u8) -> [f32; 12] {
    let mut out = [0.0f32; 12];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = chroma[(i + root as usize) % 12];
    }
    out
}

/// Pearson correlation coefficient between two 12-element vectors
fn pearson(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a: f32 = a.iter().sum::<f32>() / 12.0;
    let mean_b: f32 = b.iter().sum::<f32>() / 12.0;

    let mut num = 0.0f32;
    let mut den_a = 0.0f32;
    let mut den_b = 0.0f32;
    for i in 0..12 {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        num += da * db;
        den_a += da * da;
        den_b += db * db;
    }

    let den = (den_a * den_b).sqrt();
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_falls_back_to_a_minor() {
        let samples = vec![0.0f32; 44100 * 4];
        assert_eq!(detect_key_name(&samples, 44100), "Am");
    }

    #[test]
    fn empty_buffer_falls_back_to_a_minor() {
        assert_eq!(detect_key_name(&[], 44100), "Am");
    }

    #[test]
    fn rotate_shifts_root_to_front() {
        let chroma = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ];
        assert_eq!(rotate(&chroma, 0), chroma);
        let r = rotate(&chroma, 3);
        assert_eq!(r[0], 4.0);
        assert_eq!(r[11], 3.0);
    }

    #[test]
    fn pearson_self_correlation_is_one() {
        let a = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ];
        assert!((pearson(&a, &a) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn pearson_inverse_is_negative() {
        let a = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ];
        let b = [
            12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0,
        ];
        assert!(pearson(&a, &b) < 0.0);
    }

    #[test]
    fn detects_c_major_chord_near_camelot_8() {
        let sample_rate = 44100u32;
        let len = sample_rate as usize * 4;
        let mut samples = vec![0.0f32; len];
        // C4 + E4 + G4
        for (i, s) in samples.iter_mut().enumerate() {
            let t = i as f32 / sample_rate as f32;
            *s = ((2.0 * PI * 261.63 * t).sin()
                + (2.0 * PI * 329.63 * t).sin()
                + (2.0 * PI * 392.0 * t).sin())
                / 3.0;
        }

        let detected = detect_key(&samples, sample_rate).expect("chord should yield a key");
        // Pure tones only approximate real-music profiles; accept the
        // C/Am neighborhood on the wheel.
        assert!(
            (7..=9).contains(&detected.camelot.number),
            "expected wheel position near 8, got {}",
            detected.camelot.display()
        );
    }
}
