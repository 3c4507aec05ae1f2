//! A single in-flight transition, scripted or adaptive.
//!
//! Time is injected as f64 seconds rather than read from the clock,
//! so the whole lifecycle can be driven by a simulated clock in tests.
//! Dropping a session mid-flight just stops ticking; the surface keeps
//! whatever values were last written.

use crossmix_analysis::EnergySample;
use tracing::debug;

use crate::scripted::ScriptedProfile;
use crate::smart::{SmartConfig, SmartPhase, SmartStrategy};
use crate::types::{ControlSnapshot, Strategy};

enum SessionKind {
    Scripted(ScriptedProfile),
    Smart(Box<SmartStrategy>),
}

pub struct TransitionSession {
    strategy: Strategy,
    start_crossfader: f32,
    started_at: f64,
    kind: SessionKind,
    done: bool,
}

impl TransitionSession {
    /// Begin a transition at the given clock time (seconds)
    pub fn start(strategy: Strategy, bpm: u32, start_crossfader: f32, now: f64) -> Self {
        Self::start_with_config(strategy, bpm, start_crossfader, now, SmartConfig::default())
    }

    /// Begin a transition with custom adaptive thresholds
    pub fn start_with_config(
        strategy: Strategy,
        bpm: u32,
        start_crossfader: f32,
        now: f64,
        config: SmartConfig,
    ) -> Self {
        let start_crossfader = start_crossfader.clamp(0.0, 100.0);
        let kind = match ScriptedProfile::from_strategy(strategy) {
            Some(profile) => SessionKind::Scripted(profile),
            None => SessionKind::Smart(Box::new(SmartStrategy::new(
                bpm,
                start_crossfader,
                now,
                config,
            ))),
        };
        debug!(%strategy, bpm, start_crossfader, "transition session started");
        Self {
            strategy,
            start_crossfader,
            started_at: now,
            kind,
            done: false,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Feed one band-energy measurement of the outgoing deck. Scripted
    /// profiles ignore these; the adaptive strategy listens.
    pub fn push_energy(&mut self, sample: EnergySample) {
        if let SessionKind::Smart(fsm) = &mut self.kind {
            fsm.push_energy(sample);
        }
    }

    /// Compute the control frame for the given clock time
    pub fn tick(&mut self, now: f64) -> ControlSnapshot {
        match &mut self.kind {
            SessionKind::Scripted(profile) => {
                let t = ((now - self.started_at) / profile.duration_secs()).clamp(0.0, 1.0);
                if t >= 1.0 && !self.done {
                    self.done = true;
                    debug!(strategy = %self.strategy, "transition session complete");
                }
                profile.snapshot(t as f32, self.start_crossfader)
            }
            SessionKind::Smart(fsm) => {
                let snap = fsm.tick(now);
                if fsm.phase() == SmartPhase::Done && !self.done {
                    self.done = true;
                    debug!(strategy = %self.strategy, "transition session complete");
                }
                snap
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}
