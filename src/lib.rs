//! Loop Leaks - a small generative-art room
//!
//! The player walks a procedurally placed world, touches stations, and the
//! engine co-writes a poem, steers a fractal and cues music as a pure function
//! of the run seed and the order of those touches.
//!
//! Core modules:
//! - `sim`: Deterministic engine (seeded streams, content pools, placement, state machine)
//! - `audio`: Audio collaborator, cue table, procedural music sequencer
//! - `speech`: Speech collaborator with capability gating
//! - `render`: Renderer collaborator hand-off
//! - `host`: Frame loop that owns the engine and dispatches its effects
//! - `tuning`: Data-driven engine constants
//! - `settings`: User preferences

pub mod audio;
pub mod host;
pub mod render;
pub mod settings;
pub mod sim;
pub mod speech;
pub mod tuning;

pub use host::Host;
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

use serde::{Deserialize, Serialize};

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (the engine was tuned per display frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Signal meter ceiling
    pub const MAX_SIGNAL: u8 = 6;
    /// Non-exit interactions required before the exit object will seal the poem
    pub const REQUIRED_LINES: usize = 2;

    /// Player body radius (world units)
    pub const PLAYER_RADIUS: f32 = 10.0;

    /// Calm focus-view zoom restored whenever focus opens or closes
    pub const FOCUS_ZOOM_DEFAULT: f32 = 0.95;
    pub const FOCUS_ZOOM_MIN: f32 = 0.70;
    pub const FOCUS_ZOOM_MAX: f32 = 3.20;
}

/// Canvas dimensions in pixels, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn half(&self) -> (f32, f32) {
        (self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(960, 540)
    }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.max(0.0).min(1.0)
}

/// Clamp that tolerates inverted bounds (upper bound wins), unlike `f32::clamp`
#[inline]
pub fn constrain(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrain_inverted_bounds() {
        // World narrower than the canvas: upper bound wins, no panic
        assert_eq!(constrain(5.0, 10.0, 2.0), 2.0);
        assert_eq!(constrain(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_lerp_and_clamp01() {
        assert!((lerp(72.0, 90.0, 0.5) - 81.0).abs() < 1e-5);
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(-0.2), 0.0);
    }
}
