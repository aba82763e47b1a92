//! World generation and station placement
//!
//! Rejection sampling on the layout stream. The spacing guarantee is
//! best-effort: when the attempt budget runs out, the last sampled point is
//! accepted as-is and may sit closer than the minimum distance. That relaxed
//! guarantee is reported through [`Placement::relaxed`] instead of being
//! hidden.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::{SeededStream, glyph_seed};
use super::station::{CoreObject, Station};
use crate::tuning::Tuning;

/// Bounding rectangle of the world, regenerated every run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
    /// Margin kept free of stations along every edge
    pub pad: f32,
}

impl WorldBounds {
    /// Randomized world size drawn from the layout stream
    pub fn generate(stream: &mut SeededStream) -> Self {
        let width = (2400.0 + stream.range(0.0, 1400.0)).floor();
        let height = (1700.0 + stream.range(0.0, 1000.0)).floor();
        let pad = (170.0 + stream.range(0.0, 130.0)).floor();
        Self { width, height, pad }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Uniform point inside the padded area
    pub fn sample(&self, stream: &mut SeededStream) -> Vec2 {
        let x = stream.range(self.pad, self.width - self.pad);
        let y = stream.range(self.pad, self.height - self.pad);
        Vec2::new(x, y)
    }

    /// Keep a body of the given radius inside the world
    pub fn clamp_body(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            crate::constrain(pos.x, radius, self.width - radius),
            crate::constrain(pos.y, radius, self.height - radius),
        )
    }
}

/// Spacing rules for one station kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    /// Minimum distance to every previously accepted point
    pub min_dist: f32,
    /// Minimum distance to the spawn point
    pub avoid_spawn: f32,
}

/// Result of one placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: Vec2,
    /// Attempt budget ran out and the spacing rules may be violated
    pub relaxed: bool,
}

/// Rejection-sample one point
pub fn place_with_spacing(
    stream: &mut SeededStream,
    bounds: &WorldBounds,
    spawn: Vec2,
    spacing: Spacing,
    placed: &[Vec2],
    attempts: u32,
) -> Placement {
    let mut last = bounds.sample(stream);
    for attempt in 0..attempts.max(1) {
        if attempt > 0 {
            last = bounds.sample(stream);
        }
        if last.distance(spawn) < spacing.avoid_spawn {
            continue;
        }
        if placed.iter().any(|p| last.distance(*p) < spacing.min_dist) {
            continue;
        }
        return Placement { pos: last, relaxed: false };
    }
    Placement { pos: last, relaxed: true }
}

/// Place `count` points in sequence, each respecting the ones before it
pub fn plan_positions(
    stream: &mut SeededStream,
    bounds: &WorldBounds,
    spawn: Vec2,
    spacing: Spacing,
    placed: &mut Vec<Vec2>,
    count: usize,
    attempts: u32,
) -> Vec<Placement> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let p = place_with_spacing(stream, bounds, spawn, spacing, placed, attempts);
        placed.push(p.pos);
        out.push(p);
    }
    out
}

/// Lay out the four core objects, then the hidden stations
pub fn generate_stations(
    run_seed: u32,
    stream: &mut SeededStream,
    bounds: &WorldBounds,
    spawn: Vec2,
    tuning: &Tuning,
) -> Vec<Station> {
    let mut placed = Vec::with_capacity(CoreObject::ALL.len() + tuning.hidden_count as usize);
    let mut stations = Vec::with_capacity(placed.capacity());

    let core_spacing = Spacing {
        min_dist: tuning.core_min_dist,
        avoid_spawn: tuning.spawn_avoid_dist,
    };
    let core = plan_positions(
        stream,
        bounds,
        spawn,
        core_spacing,
        &mut placed,
        CoreObject::ALL.len(),
        tuning.placement_attempts,
    );
    for (obj, p) in CoreObject::ALL.iter().zip(&core) {
        if p.relaxed {
            log::warn!("{} placed without full spacing after {} attempts", obj.name(), tuning.placement_attempts);
        }
        stations.push(Station::core(*obj, p.pos, tuning.interact_radius));
    }

    let hidden_spacing = Spacing {
        min_dist: tuning.core_min_dist * tuning.hidden_min_dist_factor,
        avoid_spawn: tuning.spawn_avoid_dist * tuning.hidden_avoid_factor,
    };
    let hidden = plan_positions(
        stream,
        bounds,
        spawn,
        hidden_spacing,
        &mut placed,
        tuning.hidden_count as usize,
        tuning.placement_attempts,
    );
    let reveal_radius = tuning.reveal_radius();
    for (i, p) in hidden.iter().enumerate() {
        if p.relaxed {
            log::warn!("hidden_{i} placed without full spacing");
        }
        let seed = glyph_seed(run_seed, i as u32, p.pos.x, p.pos.y);
        stations.push(Station::hidden(i as u16, p.pos, tuning.interact_radius, reveal_radius, seed));
    }

    stations
}
