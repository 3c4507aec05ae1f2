//! The five deterministic transition profiles.
//!
//! Each profile is a pure function of normalized time: given t in
//! [0, 1] and the crossfader position the transition started from, it
//! returns the full control-surface frame. Deck A is outgoing, deck B
//! incoming. Every profile ends at crossfader 100 with the incoming
//! EQ neutral and the outgoing deck silent.

use crate::curve::{cosine_ease, lerp, quad_ease, smoothstep};
use crate::types::{ControlSnapshot, EqSettings, Strategy};

/// A scripted (non-adaptive) transition shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedProfile {
    Smooth,
    Drop,
    Long,
    Echo,
    Party,
}

impl ScriptedProfile {
    pub fn from_strategy(strategy: Strategy) -> Option<Self> {
        match strategy {
            Strategy::Smart => None,
            Strategy::Smooth => Some(ScriptedProfile::Smooth),
            Strategy::Drop => Some(ScriptedProfile::Drop),
            Strategy::Long => Some(ScriptedProfile::Long),
            Strategy::Echo => Some(ScriptedProfile::Echo),
            Strategy::Party => Some(ScriptedProfile::Party),
        }
    }

    /// Total wall-clock length of the profile
    pub fn duration_secs(self) -> f64 {
        match self {
            ScriptedProfile::Smooth => 30.0,
            ScriptedProfile::Drop => 16.0,
            ScriptedProfile::Long => 45.0,
            ScriptedProfile::Echo => 24.0,
            ScriptedProfile::Party => 12.0,
        }
    }

    /// Control frame at normalized time t
    pub fn snapshot(self, t: f32, start_crossfader: f32) -> ControlSnapshot {
        let t = t.clamp(0.0, 1.0);
        let start = start_crossfader.clamp(0.0, 100.0);
        let travel = 100.0 - start;
        match self {
            ScriptedProfile::Smooth => smooth(t, start, travel),
            ScriptedProfile::Drop => drop_profile(t, start, travel),
            ScriptedProfile::Long => long(t, start, travel),
            ScriptedProfile::Echo => echo(t, start, travel),
            ScriptedProfile::Party => party(t, start, travel),
        }
    }
}

/// Normalized position within the window [a, b)
fn seg(t: f32, a: f32, b: f32) -> f32 {
    ((t - a) / (b - a)).clamp(0.0, 1.0)
}

fn smooth(t: f32, start: f32, travel: f32) -> ControlSnapshot {
    let mut snap = ControlSnapshot::idle(start);
    snap.progress = t * 100.0;

    if t < 0.25 {
        let e = cosine_ease(seg(t, 0.0, 0.25));
        snap.crossfader = start + travel * 0.15 * e;
        snap.eq_b = EqSettings::new(lerp(15.0, 40.0, e), lerp(5.0, 20.0, e), 0.0);
        snap.vol_b = lerp(40.0, 60.0, e);
        snap.status = "Teasing the highs".to_string();
    } else if t < 0.55 {
        let e = cosine_ease(seg(t, 0.25, 0.55));
        snap.crossfader = start + travel * lerp(0.15, 0.45, e);
        snap.eq_a = EqSettings::new(50.0, lerp(50.0, 40.0, e), lerp(50.0, 35.0, e));
        snap.eq_b = EqSettings::new(lerp(40.0, 50.0, e), lerp(20.0, 45.0, e), lerp(0.0, 15.0, e));
        snap.vol_b = lerp(60.0, 75.0, e);
        snap.status = "Blending the mids".to_string();
    } else if t < 0.8 {
        let e = cosine_ease(seg(t, 0.55, 0.8));
        snap.crossfader = start + travel * lerp(0.45, 0.7, e);
        snap.eq_a = EqSettings::new(50.0, 40.0, lerp(35.0, 5.0, e));
        snap.eq_b = EqSettings::new(50.0, lerp(45.0, 50.0, e), lerp(15.0, 50.0, e));
        snap.vol_b = lerp(75.0, 80.0, e);
        snap.status = "Swapping the bass".to_string();
    } else {
        let e = cosine_ease(seg(t, 0.8, 1.0));
        snap.crossfader = start + travel * lerp(0.7, 1.0, e);
        snap.eq_a = EqSettings::new(lerp(50.0, 0.0, e), lerp(40.0, 0.0, e), 5.0);
        snap.vol_a = lerp(80.0, 0.0, e);
        snap.status = "Fading out".to_string();
    }
    snap
}

fn drop_profile(t: f32, start: f32, travel: f32) -> ControlSnapshot {
    let mut snap = ControlSnapshot::idle(start);
    snap.progress = t * 100.0;

    if t < 0.5 {
        let q = quad_ease(seg(t, 0.0, 0.5));
        snap.crossfader = start + travel * 0.3 * q;
        snap.eq_b = EqSettings::new(lerp(0.0, 50.0, q), lerp(0.0, 35.0, q), 0.0);
        snap.vol_b = lerp(40.0, 80.0, q);
        snap.status = "Building tension".to_string();
    } else if t < 0.625 {
        // The cut window is short in absolute time, so a linear ramp
        // here reads as a snap
        let e = seg(t, 0.5, 0.625);
        snap.crossfader = start + travel * lerp(0.3, 0.8, e);
        snap.eq_a = EqSettings::new(50.0, 50.0, lerp(50.0, 5.0, e));
        snap.eq_b = EqSettings::new(50.0, lerp(35.0, 50.0, e), lerp(0.0, 50.0, e));
        snap.status = "Cutting over".to_string();
    } else {
        let q = quad_ease(seg(t, 0.625, 1.0));
        snap.crossfader = start + travel * lerp(0.8, 1.0, q);
        snap.eq_a = EqSettings::new(lerp(50.0, 10.0, q), lerp(50.0, 10.0, q), 5.0);
        snap.vol_a = lerp(80.0, 0.0, q);
        snap.status = "Riding it out".to_string();
    }
    snap
}

fn long(t: f32, start: f32, travel: f32) -> ControlSnapshot {
    let mut snap = ControlSnapshot::idle(start);
    snap.progress = t * 100.0;

    if t < 0.2 {
        let s = smoothstep(seg(t, 0.0, 0.2));
        snap.crossfader = start + travel * 0.15 * s;
        snap.eq_b = EqSettings::new(lerp(10.0, 40.0, s), lerp(5.0, 25.0, s), lerp(0.0, 10.0, s));
        snap.vol_b = lerp(40.0, 65.0, s);
        snap.status = "Easing in".to_string();
    } else if t < 0.8 {
        let s = smoothstep(seg(t, 0.2, 0.8));
        snap.crossfader = start + travel * lerp(0.15, 0.8, s);
        snap.eq_a = EqSettings::new(50.0, lerp(50.0, 35.0, s), lerp(50.0, 10.0, s));
        snap.eq_b = EqSettings::new(lerp(40.0, 50.0, s), lerp(25.0, 50.0, s), lerp(10.0, 50.0, s));
        snap.vol_b = lerp(65.0, 80.0, s);
        snap.status = "Long blend".to_string();
    } else {
        let s = smoothstep(seg(t, 0.8, 1.0));
        snap.crossfader = start + travel * lerp(0.8, 1.0, s);
        snap.eq_a = EqSettings::new(lerp(50.0, 0.0, s), lerp(35.0, 0.0, s), lerp(10.0, 5.0, s));
        snap.vol_a = lerp(80.0, 0.0, s);
        snap.status = "Easing out".to_string();
    }
    snap
}

fn echo(t: f32, start: f32, travel: f32) -> ControlSnapshot {
    let mut snap = ControlSnapshot::idle(start);
    snap.progress = t * 100.0;

    // One continuous gesture: the outgoing deck decays into its echo
    // tail while the incoming deck rises underneath it
    let q = quad_ease(t);
    snap.crossfader = start + travel * q;
    snap.eq_a = EqSettings::new(lerp(50.0, 0.0, q), lerp(50.0, 5.0, q), lerp(50.0, 5.0, q));
    snap.vol_a = 80.0 * (1.0 - q);
    snap.eq_b = EqSettings::new(lerp(20.0, 50.0, q), lerp(15.0, 50.0, q), lerp(10.0, 50.0, q));
    snap.vol_b = lerp(55.0, 80.0, q);
    snap.status = if t < 0.7 {
        "Echo tail".to_string()
    } else {
        "Washing out".to_string()
    };
    snap
}

fn party(t: f32, start: f32, travel: f32) -> ControlSnapshot {
    let mut snap = ControlSnapshot::idle(start);
    snap.progress = t * 100.0;
    // The crossfader commits over the whole window regardless of
    // sub-phase
    snap.crossfader = start + travel * quad_ease(t);

    if t < 0.4 {
        let e = seg(t, 0.0, 0.4);
        snap.eq_b = EqSettings::new(lerp(25.0, 50.0, e), lerp(20.0, 40.0, e), 10.0);
        snap.vol_b = lerp(50.0, 70.0, e);
        snap.status = "Teasing the highs".to_string();
    } else if t < 0.75 {
        let e = seg(t, 0.4, 0.75);
        snap.eq_a = EqSettings::new(50.0, 50.0, lerp(50.0, 5.0, e));
        snap.eq_b = EqSettings::new(50.0, lerp(40.0, 50.0, e), lerp(10.0, 50.0, e));
        snap.vol_b = lerp(70.0, 80.0, e);
        snap.status = "Swapping the bass".to_string();
    } else {
        let e = seg(t, 0.75, 1.0);
        snap.eq_a = EqSettings::new(lerp(50.0, 0.0, e), lerp(50.0, 10.0, e), 5.0);
        snap.vol_a = lerp(80.0, 0.0, e);
        snap.status = "Fading out".to_string();
    }
    snap
}
