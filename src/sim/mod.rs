//! Deterministic session engine
//!
//! All content, layout and state-machine logic lives here. This module must
//! stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded streams only (see `rng` for the derivation formulas)
//! - No rendering, audio or platform dependencies

pub mod content;
pub mod glyph;
pub mod history;
pub mod params;
pub mod placement;
pub mod poem;
pub mod rng;
pub mod signal;
pub mod state;
pub mod station;
pub mod tick;
pub mod typewriter;

pub use content::{Pool, UsedLines, pick_unique_line};
pub use glyph::{FocusCard, FocusCardCache, glyph_points};
pub use history::{InteractionHistory, can_finalize};
pub use params::{AnimationProfile, FractalState, MotionState, ParameterVector, Uniform};
pub use placement::{WorldBounds, generate_stations, place_with_spacing};
pub use rng::{SeedSource, SeededStream};
pub use signal::SignalMeter;
pub use state::{Mode, RunSession};
pub use station::{CoreObject, CoreRole, Station, StationId, StationKind};
pub use tick::{Cue, Direction, Display, Effect, Engine, Frame, InputEvent, InputQueue, MoveKeys, TickInput};
