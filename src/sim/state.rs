//! Run session and core simulation types
//!
//! Everything a playthrough mutates lives in one [`RunSession`]. A restart
//! builds a fresh session and drops the old one whole.

use glam::Vec2;
use serde::Serialize;

use super::content::{Pool, UsedLines, pick_unique_line};
use super::history::InteractionHistory;
use super::params::{FocusZoom, FractalState, MotionState};
use super::placement::{WorldBounds, generate_stations};
use super::poem::{INTRO, run_title};
use super::rng::{SeededStream, chance, content_stream, layout_stream};
use super::signal::SignalMeter;
use super::station::{Station, StationId, StationKind};
use super::typewriter::Typewriter;
use crate::tuning::Tuning;

/// Interaction mode. Pause is tracked separately on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Walking the world
    World,
    /// Inspecting one station
    Focus(StationId),
    /// Sealed poem on screen (always paused)
    FinalModal,
}

impl Mode {
    pub fn focused(&self) -> Option<StationId> {
        match self {
            Mode::Focus(id) => Some(*id),
            _ => None,
        }
    }
}

/// Expanding ring launched by a ping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pulse {
    pub active: bool,
    pub radius: f32,
    /// World units per tick
    pub speed: f32,
    /// Ring already reached the exit this ping
    pub hit: bool,
}

impl Pulse {
    pub const BASE_SPEED: f32 = 18.0;

    pub fn launch(&mut self) {
        self.active = true;
        self.radius = 0.0;
        self.hit = false;
    }
}

impl Default for Pulse {
    fn default() -> Self {
        Self {
            active: false,
            radius: 0.0,
            speed: Self::BASE_SPEED,
            hit: false,
        }
    }
}

/// Line drawn from the player to the exit, fading over `max_ticks`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoorTrail {
    pub ticks: u32,
    pub max_ticks: u32,
}

impl DoorTrail {
    pub const BASE_TICKS: u32 = 260;

    /// Light the trail for at least `ticks`
    pub fn extend(&mut self, ticks: u32) {
        self.ticks = self.ticks.max(ticks);
    }
}

impl Default for DoorTrail {
    fn default() -> Self {
        Self {
            ticks: 0,
            max_ticks: Self::BASE_TICKS,
        }
    }
}

/// One playthrough
#[derive(Debug, Clone)]
pub struct RunSession {
    /// Fixed for the run's lifetime
    pub seed: u32,
    pub history: InteractionHistory,
    pub used_lines: UsedLines,
    pub signal: SignalMeter,
    pub mode: Mode,
    pub paused: bool,
    pub finalized: bool,
    pub final_poem: Option<String>,
    /// Shown above the poem
    pub title: String,

    pub world: WorldBounds,
    pub player: Vec2,
    pub camera: Vec2,
    pub stations: Vec<Station>,

    pub fractal: FractalState,
    pub focus_zoom: FocusZoom,
    pub motion: MotionState,
    pub pulse: Pulse,
    pub door_trail: DoorTrail,
    pub typewriter: Typewriter,

    /// Every content-pool line emitted this run, in order
    pub transcript: Vec<&'static str>,
    /// Simulated seconds since the run started
    pub clock: f32,
    pub ticks: u64,
    /// Station in range on the previous world tick
    pub last_near: Option<StationId>,
    pub step_timer: u32,
    /// Music accents fired so far (varies the accent stream)
    pub accents: u32,
}

impl RunSession {
    pub fn new(seed: u32, tuning: &Tuning) -> Self {
        let mut layout = layout_stream(seed);
        let world = WorldBounds::generate(&mut layout);
        let spawn = world.center();
        let stations = generate_stations(seed, &mut layout, &world, spawn, tuning);

        let mut typewriter = Typewriter::new(tuning.type_delay_ms, tuning.cursor_blink_ticks);
        for line in INTRO {
            typewriter.queue(line);
        }

        Self {
            seed,
            history: InteractionHistory::new(),
            used_lines: UsedLines::new(),
            signal: SignalMeter::new(),
            mode: Mode::World,
            paused: false,
            finalized: false,
            final_poem: None,
            title: run_title(seed),
            world,
            player: spawn,
            camera: spawn,
            stations,
            fractal: FractalState::default(),
            focus_zoom: FocusZoom::default(),
            motion: MotionState::default(),
            pulse: Pulse::default(),
            door_trail: DoorTrail::default(),
            typewriter,
            transcript: Vec::new(),
            clock: 0.0,
            ticks: 0,
            last_near: None,
            step_timer: 0,
            accents: 0,
        }
    }

    /// Walking is simulated only here
    pub fn in_world_play(&self) -> bool {
        self.mode == Mode::World && !self.paused
    }

    /// Short label for the HUD
    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            Mode::FinalModal => "FINAL",
            _ if self.paused => "PAUSED",
            Mode::World => "WORLD",
            Mode::Focus(_) => "FOCUS",
        }
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn exit(&self) -> Option<&Station> {
        self.station(StationId::EXIT)
    }

    /// Nearest station the player can see, with its distance
    pub fn nearest_revealed(&self) -> Option<(&Station, f32)> {
        self.stations
            .iter()
            .filter(|s| s.revealed)
            .map(|s| (s, s.pos.distance(self.player)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Station the interact key would touch
    pub fn in_range(&self) -> Option<StationId> {
        self.nearest_revealed()
            .filter(|(s, d)| *d <= s.interact_radius)
            .map(|(s, _)| s.id)
    }

    /// Where the compass points: the exit once the player is ready for it,
    /// otherwise the nearest unfinished core object
    pub fn compass_target(&self) -> Option<StationId> {
        if self.history.can_approach_exit() || self.signal.level() >= 2 {
            return self.exit().map(|s| s.id);
        }
        self.stations
            .iter()
            .filter(|s| s.kind() == StationKind::Core && !s.id.is_exit())
            .min_by(|a, b| a.pos.distance(self.player).total_cmp(&b.pos.distance(self.player)))
            .map(|s| s.id)
    }

    /// Content stream for the current history length
    pub fn stream(&self, salt: u32) -> SeededStream {
        content_stream(self.seed, self.history.len(), salt)
    }

    /// Seed-derived [0, 1) roll for a probabilistic line
    pub fn roll(&self, salt: u32) -> f64 {
        chance(self.seed, self.history.len(), salt)
    }

    /// Pick a unique line, queue it for typing and record it
    pub fn emit(&mut self, pool: Pool, salt: u32, max_draws: u32) -> &'static str {
        let stream = self.stream(salt);
        let line = pick_unique_line(pool.lines(), stream, &mut self.used_lines, max_draws);
        log::debug!("{pool:?} line at history {}: {line}", self.history.len());
        self.typewriter.queue(line);
        self.transcript.push(line);
        line
    }

    /// Sealed final poem, built once
    pub fn seal(&mut self) -> &str {
        if self.final_poem.is_none() {
            let text = super::poem::build_final_poem(self.seed, &self.history, self.signal.level());
            log::info!("poem sealed for seed {} after {} visits", self.seed, self.history.len());
            self.final_poem = Some(text);
        }
        self.finalized = true;
        self.final_poem.as_deref().unwrap_or_default()
    }
}
