//! Easing curves used by the scripted transition profiles.
//!
//! All of these map [0, 1] to [0, 1], are monotone, and hit both
//! endpoints exactly. Inputs outside the unit interval are clamped.

use std::f32::consts::PI;

/// Half-cosine ease: slow in, slow out
pub fn cosine_ease(t: f32) -> f32 {
    // cos(PI) rounds short of -1 in f32, so pin both endpoints
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        0.5 - 0.5 * (t * PI).cos()
    }
}

/// Hermite smoothstep: slightly sharper shoulders than the cosine
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Quadratic ease-in: slow start, committed finish
pub fn quad_ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Linear interpolation between two control values
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
