//! Beat-aware, energy-reactive adaptive transition.
//!
//! Instead of a fixed countdown, this listens to the outgoing deck's
//! band energy and times its moves musically:
//!   1. All phase durations quantize to bar boundaries of the track bpm
//!   2. A sustained energy dip (breakdown) opens the blend early
//!   3. An energy spike (drop) snaps the bass swap instantly
//!
//! Phase flow:
//!   idle -> teasing -> waiting -> blending -> bass_swap -> dropping
//!        -> fadeout -> done

use std::f32::consts::PI;
use std::fmt;

use crossmix_analysis::EnergySample;
use tracing::debug;

use crate::curve::cosine_ease;
use crate::types::{ControlSnapshot, EqSettings};

/// Detector thresholds and timing limits, tuned for club material.
/// Overridable for tests or unusual program material.
#[derive(Debug, Clone, Copy)]
pub struct SmartConfig {
    /// Breakdown: recent average must fall below rolling * this
    pub breakdown_ratio: f32,
    /// Breakdown: recent bass average must be below this
    pub breakdown_bass_max: f32,
    /// Drop: recent total must exceed prior * this...
    pub drop_total_ratio: f32,
    /// ...together with recent bass exceeding prior bass * this
    pub drop_bass_ratio: f32,
    /// Drop (alternate): bass jumping above this...
    pub drop_bass_high: f32,
    /// ...from below this
    pub drop_bass_low: f32,
    /// Minimum seconds spent in any phase before a detector may end it
    pub min_phase_secs: f64,
    /// Hard ceiling on the whole transition
    pub max_duration_secs: f64,
}

impl Default for SmartConfig {
    fn default() -> Self {
        Self {
            breakdown_ratio: 0.55,
            breakdown_bass_max: 25.0,
            drop_total_ratio: 1.6,
            drop_bass_ratio: 2.0,
            drop_bass_high: 40.0,
            drop_bass_low: 15.0,
            min_phase_secs: 4.0,
            max_duration_secs: 90.0,
        }
    }
}

/// Bounded energy history window: 60 entries = ~3 s at 50 ms cadence
const HISTORY_CAPACITY: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartPhase {
    Idle,
    Teasing,
    Waiting,
    Blending,
    BassSwap,
    Dropping,
    Fadeout,
    Done,
}

impl SmartPhase {
    /// Progress-bar weight window for each phase
    fn progress_window(self) -> (f32, f32) {
        match self {
            SmartPhase::Idle => (0.0, 0.0),
            SmartPhase::Teasing => (0.0, 15.0),
            SmartPhase::Waiting => (15.0, 35.0),
            SmartPhase::Blending => (35.0, 55.0),
            SmartPhase::BassSwap => (55.0, 70.0),
            SmartPhase::Dropping => (70.0, 85.0),
            SmartPhase::Fadeout => (85.0, 100.0),
            SmartPhase::Done => (100.0, 100.0),
        }
    }

    /// Rough expected length, only used for the progress estimate
    fn estimated_secs(self) -> f64 {
        match self {
            SmartPhase::Waiting => 20.0,
            SmartPhase::Teasing => 8.0,
            _ => 10.0,
        }
    }
}

impl fmt::Display for SmartPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SmartPhase::Idle => "idle",
            SmartPhase::Teasing => "teasing",
            SmartPhase::Waiting => "waiting",
            SmartPhase::Blending => "blending",
            SmartPhase::BassSwap => "bass_swap",
            SmartPhase::Dropping => "dropping",
            SmartPhase::Fadeout => "fadeout",
            SmartPhase::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// The adaptive transition state machine. Time is injected into
/// `tick` as seconds so tests can simulate the clock.
pub struct SmartStrategy {
    config: SmartConfig,
    beat_secs: f64,
    bar_secs: f64,
    phrase_secs: f64,
    start_crossfader: f32,
    phase: SmartPhase,
    phase_start: f64,
    start_time: f64,
    history: Vec<EnergySample>,
    rolling_avg: f32,
    peak_energy: f32,
    breakdown_detected: bool,
    drop_detected: bool,
}

impl SmartStrategy {
    pub fn new(bpm: u32, start_crossfader: f32, now: f64, config: SmartConfig) -> Self {
        let bpm = f64::from(bpm).clamp(80.0, 180.0);
        let beat_secs = 60.0 / bpm;
        let bar_secs = beat_secs * 4.0;
        Self {
            config,
            beat_secs,
            bar_secs,
            phrase_secs: bar_secs * 8.0,
            start_crossfader,
            phase: SmartPhase::Teasing,
            phase_start: now,
            start_time: now,
            history: Vec::with_capacity(HISTORY_CAPACITY),
            rolling_avg: 0.0,
            peak_energy: 0.0,
            breakdown_detected: false,
            drop_detected: false,
        }
    }

    pub fn phase(&self) -> SmartPhase {
        self.phase
    }

    pub fn beat_secs(&self) -> f64 {
        self.beat_secs
    }

    pub fn bar_secs(&self) -> f64 {
        self.bar_secs
    }

    pub fn phrase_secs(&self) -> f64 {
        self.phrase_secs
    }

    /// Snap a duration to the nearest bar boundary, at least one bar
    pub fn quantize_to_bar(&self, seconds: f64) -> f64 {
        self.bar_secs
            .max((seconds / self.bar_secs).round() * self.bar_secs)
    }

    /// Record one band-energy measurement of the outgoing deck
    pub fn push_energy(&mut self, sample: EnergySample) {
        self.history.push(sample);
        if self.history.len() > HISTORY_CAPACITY {
            self.history.remove(0);
        }
        if self.history.len() > 5 {
            self.rolling_avg =
                self.history.iter().map(|e| e.total).sum::<f32>() / self.history.len() as f32;
            self.peak_energy = self.peak_energy.max(sample.total);
        }
    }

    /// Sustained low energy with the bass dropped out
    fn is_breakdown(&self) -> bool {
        if self.history.len() < 10 {
            return false;
        }
        let recent = &self.history[self.history.len() - 10..];
        let avg_total = recent.iter().map(|e| e.total).sum::<f32>() / recent.len() as f32;
        let avg_bass = recent.iter().map(|e| e.bass).sum::<f32>() / recent.len() as f32;

        avg_total < self.rolling_avg * self.config.breakdown_ratio
            && avg_bass < self.config.breakdown_bass_max
    }

    /// Sudden energy spike, especially in the bass
    fn is_drop(&self) -> bool {
        let len = self.history.len();
        if len < 5 {
            return false;
        }
        let recent = &self.history[len - 3..];
        let prior = &self.history[len.saturating_sub(8)..len - 3];
        if prior.len() < 3 {
            return false;
        }

        let recent_avg = recent.iter().map(|e| e.total).sum::<f32>() / recent.len() as f32;
        let prior_avg = prior.iter().map(|e| e.total).sum::<f32>() / prior.len() as f32;
        let recent_bass = recent.iter().map(|e| e.bass).sum::<f32>() / recent.len() as f32;
        let prior_bass = prior.iter().map(|e| e.bass).sum::<f32>() / prior.len() as f32;

        (recent_avg > prior_avg * self.config.drop_total_ratio
            && recent_bass > prior_bass * self.config.drop_bass_ratio)
            || (recent_bass > self.config.drop_bass_high
                && prior_bass < self.config.drop_bass_low)
    }

    fn advance_phase(&mut self, next: SmartPhase, now: f64) {
        debug!(from = %self.phase, to = %next, elapsed = now - self.start_time, "phase change");
        self.phase = next;
        self.phase_start = now;
    }

    fn latest_total(&self) -> f32 {
        self.history.last().map(|e| e.total).unwrap_or(0.0)
    }

    /// Advance the state machine. Called on a ~50 ms cadence.
    pub fn tick(&mut self, now: f64) -> ControlSnapshot {
        let elapsed = now - self.phase_start;
        let total_elapsed = now - self.start_time;

        if total_elapsed > self.config.max_duration_secs && self.phase != SmartPhase::Done {
            debug!(total_elapsed, "safety ceiling reached, forcing completion");
            self.phase = SmartPhase::Done;
        }

        let (p_start, p_end) = self.phase.progress_window();
        let phase_progress = (elapsed / self.phase.estimated_secs()).min(1.0) as f32;
        let progress = p_start + (p_end - p_start) * phase_progress;

        let start = self.start_crossfader;
        match self.phase {
            SmartPhase::Teasing => {
                // Quietly introduce the incoming track, highs only.
                // Hold for at least two phrases before listening.
                let min_time = self.quantize_to_bar(self.phrase_secs.max(6.0));
                let p = (elapsed / min_time.max(8.0)).min(1.0) as f32;

                let snap = ControlSnapshot {
                    crossfader: (start + 10.0 * p).min(100.0),
                    eq_a: EqSettings::NEUTRAL,
                    eq_b: EqSettings::new(
                        (15.0 + 20.0 * p).round(),
                        (5.0 + 8.0 * p).round(),
                        0.0,
                    ),
                    vol_a: 80.0,
                    vol_b: (30.0 + 20.0 * p).round(),
                    progress,
                    status: "Listening to the beat... teasing incoming track".to_string(),
                };

                if elapsed >= min_time {
                    self.advance_phase(SmartPhase::Waiting, now);
                }
                snap
            }

            SmartPhase::Waiting => {
                // Listen for a breakdown; force the blend on a bar
                // boundary if none shows up
                let force_after = self.quantize_to_bar((self.phrase_secs * 3.0).max(24.0));
                let p = (elapsed / force_after).min(1.0) as f32;
                let breakdown_now = self.is_breakdown();

                let status = if breakdown_now {
                    "Breakdown detected! Blending in...".to_string()
                } else {
                    format!(
                        "Waiting for breakdown... ({}% energy)",
                        self.latest_total().round()
                    )
                };
                let snap = ControlSnapshot {
                    crossfader: (start + 10.0 + 10.0 * p).min(100.0),
                    eq_a: EqSettings::NEUTRAL,
                    eq_b: EqSettings::new(
                        (35.0 + 5.0 * p).round(),
                        (13.0 + 10.0 * p).round(),
                        0.0,
                    ),
                    vol_a: 80.0,
                    vol_b: (50.0 + 10.0 * p).round(),
                    progress,
                    status,
                };

                if breakdown_now && elapsed > self.config.min_phase_secs {
                    self.breakdown_detected = true;
                    self.advance_phase(SmartPhase::Blending, now);
                } else if elapsed >= force_after {
                    self.advance_phase(SmartPhase::Blending, now);
                }
                snap
            }

            SmartPhase::Blending => {
                let blend_duration = self.quantize_to_bar((self.phrase_secs * 1.5).max(10.0));
                let p = (elapsed / blend_duration).min(1.0) as f32;
                let curve = cosine_ease(p);

                let snap = ControlSnapshot {
                    crossfader: (start + 20.0 + 20.0 * curve).min(100.0),
                    eq_a: EqSettings::new(
                        50.0,
                        (50.0 - 10.0 * curve).round(),
                        (50.0 - 15.0 * curve).round(),
                    ),
                    eq_b: EqSettings::new(
                        50.0,
                        (23.0 + 27.0 * curve).round(),
                        (5.0 + 15.0 * curve).round(),
                    ),
                    vol_a: 80.0,
                    vol_b: (60.0 + 20.0 * curve).round(),
                    progress,
                    status: if self.breakdown_detected {
                        "Blending during breakdown...".to_string()
                    } else {
                        "Opening up the blend...".to_string()
                    },
                };

                if p >= 1.0 {
                    self.advance_phase(SmartPhase::BassSwap, now);
                }
                snap
            }

            SmartPhase::BassSwap => {
                // The critical moment. A detected drop snaps the swap
                // instantly, otherwise it rolls over one or two bars.
                let swap_duration = self.quantize_to_bar((self.bar_secs * 2.0).max(3.0));
                let p = (elapsed / swap_duration).min(1.0) as f32;
                let drop_now = self.is_drop();
                let swap = if drop_now { 1.0 } else { cosine_ease(p) };

                let snap = ControlSnapshot {
                    crossfader: (start + 40.0 + 15.0 * swap).min(100.0),
                    eq_a: EqSettings::new(
                        50.0,
                        (40.0 - 5.0 * swap).round(),
                        (35.0 - 30.0 * swap).round(),
                    ),
                    eq_b: EqSettings::new(50.0, 50.0, (20.0 + 30.0 * swap).round()),
                    vol_a: 80.0,
                    vol_b: 80.0,
                    progress,
                    status: if drop_now {
                        "Drop detected! Bass swap!".to_string()
                    } else {
                        "Swapping bass...".to_string()
                    },
                };

                if drop_now || p >= 1.0 {
                    self.drop_detected = drop_now;
                    self.advance_phase(SmartPhase::Dropping, now);
                }
                snap
            }

            SmartPhase::Dropping => {
                // Commit to the new track: one bar for a real drop, a
                // full phrase for a gradual hand-over
                let drop_duration = if self.drop_detected {
                    self.quantize_to_bar(self.bar_secs)
                } else {
                    self.quantize_to_bar(self.phrase_secs)
                };
                let p = (elapsed / drop_duration.max(2.0)).min(1.0) as f32;
                let snap_amount = if self.drop_detected {
                    (p * 4.0).min(1.0)
                } else {
                    cosine_ease(p)
                };

                let snap = ControlSnapshot {
                    crossfader: (start + 55.0 + 30.0 * snap_amount).min(100.0),
                    eq_a: EqSettings::new(
                        (50.0 - 30.0 * snap_amount).round(),
                        (35.0 - 25.0 * snap_amount).round(),
                        5.0,
                    ),
                    eq_b: EqSettings::NEUTRAL,
                    vol_a: (80.0 - 40.0 * snap_amount).round(),
                    vol_b: 80.0,
                    progress,
                    status: if self.drop_detected {
                        "Riding the drop!".to_string()
                    } else {
                        "Committing to new track...".to_string()
                    },
                };

                if p >= 1.0 {
                    self.advance_phase(SmartPhase::Fadeout, now);
                }
                snap
            }

            SmartPhase::Fadeout => {
                let fade_duration = self.quantize_to_bar((self.phrase_secs * 0.5).max(4.0));
                let p = (elapsed / fade_duration).min(1.0) as f32;
                let fade = 0.5 + 0.5 * (p * PI).cos();

                let snap = ControlSnapshot {
                    crossfader: (start + 85.0 + 15.0 * (1.0 - fade)).min(100.0),
                    eq_a: EqSettings::new(
                        (20.0 * fade).round(),
                        (10.0 * fade).round(),
                        (5.0 * fade).round(),
                    ),
                    eq_b: EqSettings::NEUTRAL,
                    vol_a: (40.0 * fade * fade).round(),
                    vol_b: 80.0,
                    progress,
                    status: "Fading out...".to_string(),
                };

                if p >= 1.0 {
                    self.advance_phase(SmartPhase::Done, now);
                }
                snap
            }

            SmartPhase::Done => ControlSnapshot::finished(),

            SmartPhase::Idle => ControlSnapshot::idle(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, total: f32, bass: f32) -> EnergySample {
        EnergySample {
            timestamp: t,
            total,
            bass,
            mid: total,
            hi: total,
        }
    }

    #[test]
    fn bpm_clamps_and_derives_musical_time() {
        let s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        assert!((s.beat_secs() - 0.46875).abs() < 1e-9);
        assert!((s.bar_secs() - 1.875).abs() < 1e-9);
        assert!((s.phrase_secs() - 15.0).abs() < 1e-9);

        let fast = SmartStrategy::new(300, 0.0, 0.0, SmartConfig::default());
        assert!((fast.beat_secs() - 60.0 / 180.0).abs() < 1e-9);
        let slow = SmartStrategy::new(10, 0.0, 0.0, SmartConfig::default());
        assert!((slow.beat_secs() - 60.0 / 80.0).abs() < 1e-9);
    }

    #[test]
    fn quantize_snaps_to_bar_multiples() {
        let s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        // 6 s at 128 bpm rounds to 3 bars = 5.625 s
        assert!((s.quantize_to_bar(6.0) - 5.625).abs() < 1e-9);
        // Never below one bar
        assert!((s.quantize_to_bar(0.1) - 1.875).abs() < 1e-9);
        assert!((s.quantize_to_bar(15.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn teasing_holds_for_exactly_one_phrase_at_128() {
        // phrase = 15 s at 128 bpm, already bar-aligned
        let mut s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        s.tick(14.95);
        assert_eq!(s.phase(), SmartPhase::Teasing);
        s.tick(15.0);
        assert_eq!(s.phase(), SmartPhase::Waiting);
    }

    #[test]
    fn breakdown_needs_ten_samples() {
        let mut s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        for i in 0..9 {
            s.push_energy(sample(i as f64 * 0.05, 1.0, 1.0));
        }
        assert!(!s.is_breakdown());
    }

    #[test]
    fn sustained_dip_reads_as_breakdown() {
        let mut s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        for i in 0..50 {
            s.push_energy(sample(i as f64 * 0.05, 80.0, 60.0));
        }
        assert!(!s.is_breakdown());
        for i in 50..60 {
            s.push_energy(sample(i as f64 * 0.05, 10.0, 5.0));
        }
        assert!(s.is_breakdown());
    }

    #[test]
    fn energy_spike_reads_as_drop() {
        let mut s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        for i in 0..5 {
            s.push_energy(sample(i as f64 * 0.05, 20.0, 10.0));
        }
        assert!(!s.is_drop());
        for i in 5..8 {
            s.push_energy(sample(i as f64 * 0.05, 60.0, 45.0));
        }
        assert!(s.is_drop());
    }

    #[test]
    fn teasing_snapshot_shape() {
        let mut s = SmartStrategy::new(128, 20.0, 0.0, SmartConfig::default());
        let snap = s.tick(0.0);
        assert_eq!(snap.crossfader, 20.0);
        assert_eq!(snap.eq_b.lo, 0.0);
        assert_eq!(snap.eq_a, EqSettings::NEUTRAL);
        assert_eq!(snap.vol_a, 80.0);
    }

    #[test]
    fn silent_material_finishes_within_the_ceiling() {
        let mut s = SmartStrategy::new(128, 0.0, 0.0, SmartConfig::default());
        let mut t = 0.0;
        while t < 95.0 && s.phase() != SmartPhase::Done {
            s.push_energy(sample(t, 0.0, 0.0));
            s.tick(t);
            t += 0.05;
        }
        assert_eq!(s.phase(), SmartPhase::Done);
        assert!(t <= 90.5, "took {} seconds", t);
        let snap = s.tick(t);
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.crossfader, 100.0);
    }

    #[test]
    fn progress_is_monotone_through_a_full_run() {
        let mut s = SmartStrategy::new(140, 0.0, 0.0, SmartConfig::default());
        let mut t = 0.0;
        let mut last = -1.0f32;
        while s.phase() != SmartPhase::Done {
            let snap = s.tick(t);
            assert!(
                snap.progress >= last - 1e-3,
                "progress reversed at t={}: {} -> {}",
                t,
                last,
                snap.progress
            );
            last = snap.progress;
            t += 0.05;
        }
    }
}
