//! Stations: the fixed interaction points of a run

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// The four always-visible objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoreObject {
    Lamp,
    Mirror,
    Desk,
    Door,
}

/// What touching a core object does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreRole {
    /// Raises warp, zoom and iteration bias
    Progress,
    /// Nudges the fractal center or depth
    Neutral,
    /// Gatekeeper of the final poem
    Exit,
}

impl CoreObject {
    /// Placement order; also the order of the `u_obj1..4` renderer slots
    pub const ALL: [CoreObject; 4] = [
        CoreObject::Lamp,
        CoreObject::Mirror,
        CoreObject::Desk,
        CoreObject::Door,
    ];

    /// Sprites hidden stations borrow for their detail view
    pub const SPRITE_POOL: [CoreObject; 3] = [CoreObject::Lamp, CoreObject::Mirror, CoreObject::Desk];

    pub fn role(self) -> CoreRole {
        match self {
            CoreObject::Lamp => CoreRole::Progress,
            CoreObject::Mirror | CoreObject::Desk => CoreRole::Neutral,
            CoreObject::Door => CoreRole::Exit,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CoreObject::Lamp => "lamp",
            CoreObject::Mirror => "mirror",
            CoreObject::Desk => "desk",
            CoreObject::Door => "door",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CoreObject::Lamp => "LAMP",
            CoreObject::Mirror => "MIRROR",
            CoreObject::Desk => "DESK",
            CoreObject::Door => "DOOR",
        }
    }

    pub fn is_exit(self) -> bool {
        self.role() == CoreRole::Exit
    }
}

/// Stable station identity, logged in the interaction history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StationId {
    Core(CoreObject),
    Hidden(u16),
}

impl StationId {
    pub const EXIT: StationId = StationId::Core(CoreObject::Door);

    pub fn is_exit(self) -> bool {
        matches!(self, StationId::Core(obj) if obj.is_exit())
    }

    pub fn kind(self) -> StationKind {
        match self {
            StationId::Core(_) => StationKind::Core,
            StationId::Hidden(_) => StationKind::Hidden,
        }
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationId::Core(obj) => f.write_str(obj.name()),
            StationId::Hidden(i) => write!(f, "hidden_{i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    Core,
    Hidden,
}

/// A placed station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    /// World-space position
    pub pos: Vec2,
    pub interact_radius: f32,
    /// Proximity radius that reveals a hidden station (unused for core)
    pub reveal_radius: f32,
    /// Core stations are always revealed; hidden ones flip once and stay
    pub revealed: bool,
    /// Procedural identity of a hidden station (0 for core)
    pub glyph_seed: u32,
    /// Sprite used when the station is viewed in focus
    pub sprite: CoreObject,
}

impl Station {
    pub fn core(obj: CoreObject, pos: Vec2, interact_radius: f32) -> Self {
        Self {
            id: StationId::Core(obj),
            pos,
            interact_radius,
            reveal_radius: 0.0,
            revealed: true,
            glyph_seed: 0,
            sprite: obj,
        }
    }

    pub fn hidden(index: u16, pos: Vec2, interact_radius: f32, reveal_radius: f32, glyph_seed: u32) -> Self {
        let sprite = CoreObject::SPRITE_POOL[index as usize % CoreObject::SPRITE_POOL.len()];
        Self {
            id: StationId::Hidden(index),
            pos,
            interact_radius,
            reveal_radius,
            revealed: false,
            glyph_seed,
            sprite,
        }
    }

    pub fn kind(&self) -> StationKind {
        self.id.kind()
    }

    pub fn label(&self) -> &'static str {
        match self.id {
            StationId::Core(obj) => obj.label(),
            StationId::Hidden(_) => "SIG",
        }
    }

    /// Reveal if the point is inside the reveal radius; returns true on the flip
    pub fn try_reveal(&mut self, point: Vec2) -> bool {
        if self.revealed || self.kind() != StationKind::Hidden {
            return false;
        }
        if self.pos.distance(point) <= self.reveal_radius {
            self.revealed = true;
            return true;
        }
        false
    }
}
