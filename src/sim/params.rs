//! Reactive parameter mapping
//!
//! Discrete events move *targets* (base zoom, base warp, iteration count).
//! Every tick the displayed values ease toward those targets, and the full
//! [`ParameterVector`] is rebuilt from the session. Nothing here is persisted.

use glam::Vec2;
use serde::Serialize;

use super::state::{Mode, RunSession};
use super::station::{CoreObject, StationId};
use crate::consts::{FOCUS_ZOOM_DEFAULT, FOCUS_ZOOM_MAX, FOCUS_ZOOM_MIN};
use crate::{CanvasSize, clamp01, constrain, lerp};

pub const BASE_CENTER: Vec2 = Vec2::new(-0.6, 0.0);
pub const BASE_ZOOM: f32 = 2.2;
pub const BASE_WARP: f32 = 0.35;
pub const BASE_ITERATIONS: u32 = 240;

pub const ZOOM_MIN: f32 = 0.6;
pub const ZOOM_MAX: f32 = 18.0;
pub const ITERATIONS_CAP: u32 = 520;

/// Easing factor applied per tick to zoom, center and warp
const EASE: f32 = 0.06;
/// Easing factor for the focus-view zoom
const FOCUS_EASE: f32 = 0.12;
/// Center nudge per unit of player velocity
const MOVE_NUDGE: f32 = 0.000_55;
/// Amplitude of the seed-derived center nudge on a neutral interaction
pub const MIRROR_DRIFT: f32 = 0.08;

/// Fractal targets and their eased display values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FractalState {
    pub base_center: Vec2,
    pub base_zoom: f32,
    pub base_warp: f32,
    pub iterations: u32,

    pub center: Vec2,
    pub zoom: f32,
    pub warp: f32,
}

impl Default for FractalState {
    fn default() -> Self {
        Self {
            base_center: BASE_CENTER,
            base_zoom: BASE_ZOOM,
            base_warp: BASE_WARP,
            iterations: BASE_ITERATIONS,
            center: BASE_CENTER,
            zoom: BASE_ZOOM,
            warp: BASE_WARP,
        }
    }
}

impl FractalState {
    fn zoom_scale(&self) -> f32 {
        self.base_zoom.max(0.001)
    }

    fn scale_zoom(&mut self, factor: f32) {
        self.base_zoom = constrain(self.base_zoom * factor, ZOOM_MIN, ZOOM_MAX);
    }

    fn add_iterations(&mut self, n: u32) {
        self.iterations = (self.iterations + n).min(ITERATIONS_CAP);
    }

    /// Progress object: deeper warp, closer zoom
    pub fn apply_progress(&mut self) {
        self.base_warp = clamp01(self.base_warp + 0.10);
        self.scale_zoom(1.10);
    }

    /// Neutral object that shifts the view; `offset` components lie in
    /// `[-MIRROR_DRIFT, MIRROR_DRIFT)` and are scaled down as zoom grows
    pub fn apply_shift(&mut self, offset: Vec2) {
        self.base_center += offset / self.zoom_scale();
        self.scale_zoom(1.06);
    }

    /// Neutral object that adds detail
    pub fn apply_detail(&mut self) {
        self.add_iterations(28);
        self.scale_zoom(1.06);
    }

    /// One step of signal
    pub fn apply_signal(&mut self) {
        self.base_warp = clamp01(self.base_warp + 0.05);
        self.add_iterations(12);
    }

    /// Walking drags the fractal along
    pub fn nudge(&mut self, velocity: Vec2) {
        self.base_center += velocity * MOVE_NUDGE / self.zoom_scale();
    }

    /// Ease displayed values toward the animated targets at time `t` seconds
    pub fn animate(&mut self, t: f32, profile: &AnimationProfile) {
        let pulse = 1.0 + profile.zoom_pulse * (t * 0.85).sin() * (0.65 + 0.35 * (t * 0.33).sin());
        let drift = profile.drift_amp / self.zoom_scale();
        let dx = drift * (t * profile.drift_speed).cos();
        let dy = drift * (t * profile.drift_speed * 1.17).sin();
        let wp = profile.warp_pulse * (t * 0.72).sin();

        self.zoom = lerp(self.zoom, self.base_zoom * pulse, EASE);
        self.center = self.center.lerp(self.base_center + Vec2::new(dx, dy), EASE);
        self.warp = lerp(self.warp, clamp01(self.base_warp + wp), EASE);
    }
}

/// Idle animation amplitudes ("screensaver" motion)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationProfile {
    pub zoom_pulse: f32,
    pub drift_amp: f32,
    pub drift_speed: f32,
    pub warp_pulse: f32,
    pub palette_speed: f32,
}

impl Default for AnimationProfile {
    fn default() -> Self {
        Self {
            zoom_pulse: 0.18,
            drift_amp: 0.12,
            drift_speed: 0.14,
            warp_pulse: 0.18,
            palette_speed: 0.06,
        }
    }
}

impl AnimationProfile {
    /// Damped amplitudes for reduced motion
    pub fn reduced() -> Self {
        let full = Self::default();
        const DAMP: f32 = 0.35;
        Self {
            zoom_pulse: full.zoom_pulse * DAMP,
            drift_amp: full.drift_amp * DAMP,
            warp_pulse: full.warp_pulse * DAMP,
            ..full
        }
    }

    pub fn for_settings(reduced_motion: bool) -> Self {
        if reduced_motion { Self::reduced() } else { Self::default() }
    }
}

/// Player motion, smoothed for music and trail response
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MotionState {
    pub velocity: Vec2,
    pub moving: bool,
    /// Eases toward 1 while moving and 0 at rest
    pub smoothed: f32,
}

impl MotionState {
    pub fn update(&mut self, velocity: Vec2, moving: bool) {
        self.velocity = velocity;
        self.moving = moving;
        let target = if moving { 1.0 } else { 0.0 };
        self.smoothed = lerp(self.smoothed, target, EASE);
    }
}

/// Zoom of the focus view, reset to a calm default on open and close
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusZoom {
    pub current: f32,
    pub target: f32,
}

impl Default for FocusZoom {
    fn default() -> Self {
        Self {
            current: FOCUS_ZOOM_DEFAULT,
            target: FOCUS_ZOOM_DEFAULT,
        }
    }
}

impl FocusZoom {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Scroll step; positive delta zooms out. Returns true when zooming out.
    pub fn scroll(&mut self, delta: f32) -> bool {
        let step = if delta.abs() > 40.0 { 0.12 } else { 0.06 };
        let out = delta > 0.0;
        self.target += if out { -step } else { step };
        out
    }

    pub fn ease(&mut self) {
        self.target = constrain(self.target, FOCUS_ZOOM_MIN, FOCUS_ZOOM_MAX);
        self.current = lerp(self.current, self.target, FOCUS_EASE);
    }
}

/// Continuous output for the renderer and audio collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterVector {
    pub time: f32,
    pub resolution: [f32; 2],

    // Fractal
    pub center: Vec2,
    pub zoom: f32,
    pub iterations: f32,
    pub warp: f32,
    pub grow: f32,
    pub palette: f32,

    /// Screen UVs of the core objects, in [`CoreObject::ALL`] order
    pub objects: [Vec2; 4],
    pub object_strength: [f32; 4],

    // Post filter
    pub filter_amount: f32,
    pub fractal_mix: f32,
    pub focus_zoom: f32,

    // Guidance overlays
    pub trail_intensity: f32,
    pub ring_radius: f32,
    pub ring_intensity: f32,
    pub door_ring_radius: f32,

    // Music
    pub tempo_bpm: f32,
    pub filter_cutoff: f32,
    pub delay_feedback: f32,
}

/// Value of one named uniform
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Uniform {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
}

impl ParameterVector {
    /// Named uniforms, in a stable order
    pub fn uniforms(&self) -> Vec<(&'static str, Uniform)> {
        let [o1, o2, o3, o4] = self.objects;
        vec![
            ("u_resolution", Uniform::Vec2(self.resolution)),
            ("u_time", Uniform::Float(self.time)),
            ("u_center", Uniform::Vec2(self.center.to_array())),
            ("u_zoom", Uniform::Float(self.zoom)),
            ("u_iter", Uniform::Float(self.iterations)),
            ("u_warp", Uniform::Float(self.warp)),
            ("u_grow", Uniform::Float(self.grow)),
            ("u_palette", Uniform::Float(self.palette)),
            ("u_obj1", Uniform::Vec2(o1.to_array())),
            ("u_obj2", Uniform::Vec2(o2.to_array())),
            ("u_obj3", Uniform::Vec2(o3.to_array())),
            ("u_obj4", Uniform::Vec2(o4.to_array())),
            ("u_objStrength", Uniform::Vec4(self.object_strength)),
            ("u_amount", Uniform::Float(self.filter_amount)),
            ("u_fractMix", Uniform::Float(self.fractal_mix)),
            ("u_focusZoom", Uniform::Float(self.focus_zoom)),
            ("u_trail", Uniform::Float(self.trail_intensity)),
            ("u_ringRadius", Uniform::Float(self.ring_radius)),
            ("u_ring", Uniform::Float(self.ring_intensity)),
            ("u_doorRing", Uniform::Float(self.door_ring_radius)),
            ("u_tempo", Uniform::Float(self.tempo_bpm)),
            ("u_cutoff", Uniform::Float(self.filter_cutoff)),
            ("u_feedback", Uniform::Float(self.delay_feedback)),
        ]
    }
}

/// World point to canvas pixels, given the camera center
pub fn world_to_screen(world: Vec2, camera: Vec2, canvas: CanvasSize) -> Vec2 {
    let (hw, hh) = canvas.half();
    world - camera + Vec2::new(hw, hh)
}

/// Rebuild the parameter vector from the session
pub fn map_parameters(
    session: &RunSession,
    canvas: CanvasSize,
    interact_radius: f32,
    profile: &AnimationProfile,
) -> ParameterVector {
    let signal = session.signal.level() as f32;
    let fractal = &session.fractal;
    let t = session.clock;

    let mut objects = [Vec2::splat(0.5); 4];
    let mut object_strength = [0.0; 4];
    for (slot, obj) in CoreObject::ALL.iter().enumerate() {
        let Some(station) = session.station(StationId::Core(*obj)) else {
            continue;
        };
        let sc = world_to_screen(station.pos, session.camera, canvas);
        let u = clamp01(sc.x / canvas.width.max(1) as f32);
        let v = clamp01(1.0 - sc.y / canvas.height.max(1) as f32);
        objects[slot] = Vec2::new(u, v);

        let d = session.player.distance(station.pos);
        let near = 1.0 - clamp01(d / (interact_radius * 2.2));
        let interacted = if session.history.contains(station.id) { 0.7 } else { 0.0 };
        let base = if obj.is_exit() { 0.35 } else { 0.45 };
        object_strength[slot] = clamp01(base * near + interacted * 0.6);
    }

    let (filter_amount, fractal_mix, trail_boost, focus_amt) = match session.mode {
        Mode::World => (0.0, 0.0, 1.0, 0.0),
        Mode::Focus(_) => (0.78, 0.94, 1.2, 1.0),
        Mode::FinalModal => (0.95, 0.98, 1.4, 1.0),
    };

    let motion = session.motion.smoothed;
    let trail = &session.door_trail;
    let trail_intensity = if trail.ticks == 0 {
        0.0
    } else {
        let base = trail.ticks as f32 / trail.max_ticks.max(1) as f32;
        clamp01(base * (0.75 + 0.25 * motion) * trail_boost)
    };

    let pulse = &session.pulse;
    let max_r = session.world.width.max(session.world.height);
    let ring_intensity = if pulse.active { clamp01(1.0 - pulse.radius / max_r) } else { 0.0 };

    ParameterVector {
        time: t,
        resolution: [canvas.width as f32, canvas.height as f32],
        center: fractal.center,
        zoom: fractal.zoom,
        iterations: (fractal.iterations as f32 + 18.0 * signal).clamp(1.0, 700.0),
        warp: clamp01(fractal.warp + 0.02 * signal),
        grow: (0.92 + 0.045 * signal).clamp(0.92, 1.20),
        palette: (t * profile.palette_speed).rem_euclid(1.0),
        objects,
        object_strength,
        filter_amount,
        fractal_mix,
        focus_zoom: session.focus_zoom.current,
        trail_intensity,
        ring_radius: if pulse.active { pulse.radius } else { 0.0 },
        ring_intensity,
        door_ring_radius: 78.0 + 14.0 * signal,
        tempo_bpm: lerp(72.0, 90.0, motion),
        filter_cutoff: lerp(650.0, 2400.0, motion),
        delay_feedback: lerp(0.34, 0.50, focus_amt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_effects_respect_clamps() {
        let mut f = FractalState::default();
        for _ in 0..60 {
            f.apply_progress();
            f.apply_detail();
        }
        assert_eq!(f.base_warp, 1.0);
        assert_eq!(f.base_zoom, ZOOM_MAX);
        assert_eq!(f.iterations, ITERATIONS_CAP);
    }

    #[test]
    fn test_signal_raises_warp_and_iterations() {
        let mut f = FractalState::default();
        f.apply_signal();
        assert!((f.base_warp - 0.40).abs() < 1e-6);
        assert_eq!(f.iterations, 252);
    }

    #[test]
    fn test_shift_scales_with_zoom() {
        let mut f = FractalState::default();
        f.apply_shift(Vec2::new(0.08, -0.08));
        let moved = f.base_center - BASE_CENTER;
        assert!((moved.x - 0.08 / BASE_ZOOM).abs() < 1e-6);
        assert!((moved.y + 0.08 / BASE_ZOOM).abs() < 1e-6);
        assert!((f.base_zoom - BASE_ZOOM * 1.06).abs() < 1e-5);
    }

    #[test]
    fn test_animation_eases_instead_of_jumping() {
        let mut f = FractalState::default();
        f.apply_progress();
        let target = f.base_warp;
        f.animate(0.0, &AnimationProfile::default());
        // One tick moves 6% of the way
        assert!(f.warp > BASE_WARP && f.warp < target);
        for _ in 0..400 {
            f.animate(0.0, &AnimationProfile::default());
        }
        assert!((f.warp - target).abs() < 1e-3);
    }

    #[test]
    fn test_focus_zoom_steps_and_clamps() {
        let mut z = FocusZoom::default();
        assert!(z.scroll(100.0));
        assert!((z.target - 0.83).abs() < 1e-6);
        assert!(!z.scroll(-10.0));
        assert!((z.target - 0.89).abs() < 1e-6);
        for _ in 0..100 {
            z.scroll(-100.0);
        }
        z.ease();
        assert_eq!(z.target, FOCUS_ZOOM_MAX);
        z.reset();
        assert_eq!(z.current, FOCUS_ZOOM_DEFAULT);
    }

    #[test]
    fn test_motion_smoothing() {
        let mut m = MotionState::default();
        m.update(Vec2::X, true);
        assert!((m.smoothed - 0.06).abs() < 1e-6);
        for _ in 0..500 {
            m.update(Vec2::X, true);
        }
        assert!(m.smoothed > 0.99);
        m.update(Vec2::ZERO, false);
        assert!(m.smoothed < 0.99);
    }

    #[test]
    fn test_reduced_profile_is_calmer() {
        let full = AnimationProfile::default();
        let calm = AnimationProfile::reduced();
        assert!(calm.zoom_pulse < full.zoom_pulse);
        assert!(calm.drift_amp < full.drift_amp);
        assert_eq!(calm.palette_speed, full.palette_speed);
    }
}
