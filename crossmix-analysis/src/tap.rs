//! FFT analysis tap producing live magnitude snapshots
//!
//! Stands in for the platform analyser node of a browser audio graph:
//! each call windows the most recent samples, runs a forward FFT, and
//! exposes magnitude-per-bin bytes (0-255) with light temporal
//! smoothing. The banded-energy reader consumes these snapshots.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Smoothing factor carried over from frame to frame (analyser-node
/// style time smoothing)
const SMOOTHING: f32 = 0.5;

/// Real-time spectrum tap for one deck
pub struct SpectrumTap {
    fft_size: usize,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    /// Pre-allocated FFT buffer to avoid allocation per snapshot
    fft_buffer: Vec<Complex<f32>>,
    /// Smoothed magnitudes, one per bin
    magnitudes: Vec<f32>,
    /// Byte view handed out to readers
    snapshot: Vec<u8>,
}

impl SpectrumTap {
    /// Create a tap with the given FFT size; `fft_size / 2` bins are
    /// reported. 256 matches the original deck analyser resolution.
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            fft_size,
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            magnitudes: vec![0.0; fft_size / 2],
            snapshot: vec![0; fft_size / 2],
        }
    }

    /// Number of frequency bins in a snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyze the most recent samples and return the magnitude
    /// snapshot, one byte (0-255) per bin. Shorter input is zero-padded.
    pub fn analyze(&mut self, samples: &[f32]) -> &[u8] {
        let count = samples.len().min(self.fft_size);
        for i in 0..count {
            self.fft_buffer[i] = Complex::new(samples[i] * self.window[i], 0.0);
        }
        for slot in self.fft_buffer.iter_mut().skip(count) {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        // Normalize magnitudes to the window so output level does not
        // depend on FFT size, then smooth across frames.
        let scale = 2.0 / self.fft_size as f32;
        for (i, bin) in self.fft_buffer[..self.fft_size / 2].iter().enumerate() {
            let mag = (bin.norm() * scale).min(1.0);
            self.magnitudes[i] = self.magnitudes[i] * SMOOTHING + mag * (1.0 - SMOOTHING);
            self.snapshot[i] = (self.magnitudes[i] * 255.0) as u8;
        }

        &self.snapshot
    }

    /// Clear smoothing state (e.g. when playback stops)
    pub fn reset(&mut self) {
        self.magnitudes.fill(0.0);
        self.snapshot.fill(0);
    }
}
