//! Banded spectral energy from a live frequency-domain snapshot
//!
//! Band boundaries are proportional to the analysis resolution rather
//! than fixed in Hz, so the same split works for any tap size. With a
//! 256-point tap at 44.1 kHz the bass band covers roughly 0-860 Hz and
//! the mid band 860-3400 Hz.

/// Fraction of bins assigned to the bass band
const BASS_FRACTION: f32 = 0.04;

/// Fraction of bins assigned to bass + mid bands
const MID_FRACTION: f32 = 0.16;

/// Per-band energy reading, each value 0-100
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandEnergy {
    pub total: f32,
    pub bass: f32,
    pub mid: f32,
    pub hi: f32,
}

/// A timestamped energy reading, the element type of the rolling window
/// the adaptive transition strategy consumes. Produced at a fixed
/// cadence while a deck plays; discarded when playback stops.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergySample {
    /// Seconds since some caller-defined epoch
    pub timestamp: f64,
    pub total: f32,
    pub bass: f32,
    pub mid: f32,
    pub hi: f32,
}

impl EnergySample {
    pub fn new(timestamp: f64, energy: BandEnergy) -> Self {
        Self {
            timestamp,
            total: energy.total,
            bass: energy.bass,
            mid: energy.mid,
            hi: energy.hi,
        }
    }
}

/// Split a magnitude-per-bin snapshot (0-255 per bin) into banded
/// energy values 0-100. Side-effect free; callable many times a second.
pub fn band_energy(bins: &[u8]) -> BandEnergy {
    let len = bins.len();
    if len == 0 {
        return BandEnergy::default();
    }

    let bass_end = (len as f32 * BASS_FRACTION).floor() as usize;
    let mid_end = (len as f32 * MID_FRACTION).floor() as usize;

    let mut bass_sum = 0.0f32;
    let mut mid_sum = 0.0f32;
    let mut hi_sum = 0.0f32;
    let mut total = 0.0f32;

    for (i, &bin) in bins.iter().enumerate() {
        let v = bin as f32 / 255.0;
        total += v;
        if i < bass_end {
            bass_sum += v;
        } else if i < mid_end {
            mid_sum += v;
        } else {
            hi_sum += v;
        }
    }

    let mean_pct = |sum: f32, count: usize| {
        if count > 0 {
            sum / count as f32 * 100.0
        } else {
            0.0
        }
    };

    BandEnergy {
        total: total / len as f32 * 100.0,
        bass: mean_pct(bass_sum, bass_end),
        mid: mean_pct(mid_sum, mid_end - bass_end),
        hi: mean_pct(hi_sum, len - mid_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_zero() {
        assert_eq!(band_energy(&[]), BandEnergy::default());
    }

    #[test]
    fn full_scale_snapshot_reads_100_everywhere() {
        let bins = vec![255u8; 128];
        let e = band_energy(&bins);
        assert!((e.total - 100.0).abs() < 0.01);
        assert!((e.bass - 100.0).abs() < 0.01);
        assert!((e.mid - 100.0).abs() < 0.01);
        assert!((e.hi - 100.0).abs() < 0.01);
    }

    #[test]
    fn bass_only_snapshot() {
        // 128 bins: bass band is the first 5 bins (4%)
        let mut bins = vec![0u8; 128];
        for bin in bins.iter_mut().take(5) {
            *bin = 255;
        }
        let e = band_energy(&bins);
        assert!((e.bass - 100.0).abs() < 0.01);
        assert_eq!(e.mid, 0.0);
        assert_eq!(e.hi, 0.0);
        assert!(e.total < 5.0);
    }

    #[test]
    fn band_split_scales_with_resolution() {
        // Same proportional content at two resolutions reads the same
        for len in [64usize, 512] {
            let bass_end = (len as f32 * 0.04).floor() as usize;
            let mut bins = vec![0u8; len];
            for bin in bins.iter_mut().take(bass_end) {
                *bin = 200;
            }
            let e = band_energy(&bins);
            assert!((e.bass - 200.0 / 255.0 * 100.0).abs() < 0.5, "len {}", len);
        }
    }

    #[test]
    fn bands_are_bounded() {
        let bins: Vec<u8> = (0..128).map(|i| (i * 2) as u8).collect();
        let e = band_energy(&bins);
        for v in [e.total, e.bass, e.mid, e.hi] {
            assert!((0.0..=100.0).contains(&v));
        }
    }
}
