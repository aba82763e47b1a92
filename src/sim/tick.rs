//! Fixed timestep session tick
//!
//! One call per frame: drain input events, walk the player (world play only),
//! advance animations, then rebuild the parameter vector and display strings.
//! Side effects for audio and speech are returned, never performed here.

use glam::Vec2;
use serde::Serialize;

use super::content::{Pool, salts};
use super::glyph::{FocusCard, FocusCardCache};
use super::params::{AnimationProfile, MIRROR_DRIFT, ParameterVector, map_parameters};
use super::poem;
use super::rng::SeedSource;
use super::state::{Mode, RunSession};
use super::station::{CoreObject, StationId, StationKind};
use super::typewriter::TICK_EVERY;
use crate::consts::{MAX_SIGNAL, PLAYER_RADIUS};
use crate::tuning::Tuning;
use crate::{CanvasSize, constrain};

/// Ticks between footstep cues while walking
const STEP_CADENCE: u32 = 18;
/// Camera easing per tick
const CAMERA_EASE: f32 = 0.10;
/// Scale degrees an accent note may land on
const ACCENT_DEGREES: usize = 10;

/// Discrete key actions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Interact,
    /// Launch a guidance pulse toward the exit
    Ping,
    /// Close focus or the final poem, otherwise toggle pause
    Escape,
    Restart,
    SpeakToggle,
    /// Wheel delta; positive zooms the focus view out
    Scroll(f32),
}

/// Held direction keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Direction key identity, for hosts that track key up/down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl MoveKeys {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }

    pub fn set(&mut self, dir: Direction, down: bool) {
        match dir {
            Direction::Left => self.left = down,
            Direction::Right => self.right = down,
            Direction::Up => self.up = down,
            Direction::Down => self.down = down,
        }
    }

    /// Unit vector (or zero); diagonals are not faster than straight lines
    pub fn vector(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub moves: MoveKeys,
    /// Discrete actions in arrival order
    pub events: Vec<InputEvent>,
    /// Teleport onto a station before anything else (debug/scripted replay)
    pub warp_to: Option<StationId>,
}

impl TickInput {
    pub fn event(event: InputEvent) -> Self {
        Self {
            events: vec![event],
            ..Default::default()
        }
    }
}

/// Events accumulated between ticks by the host's callbacks
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
    moves: MoveKeys,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn set_direction(&mut self, dir: Direction, down: bool) {
        self.moves.set(dir, down);
    }

    /// Release every held key (focus lost)
    pub fn release_all(&mut self) {
        self.moves = MoveKeys::default();
    }

    /// Take everything queued since the last tick; held keys persist
    pub fn drain(&mut self) -> TickInput {
        TickInput {
            moves: self.moves,
            events: std::mem::take(&mut self.events),
            warp_to: None,
        }
    }
}

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cue {
    Step,
    Proximity,
    Tap,
    Denied,
    InteractHigh,
    InteractMid,
    InteractLow,
    DoorRumble,
    FocusOpen,
    FocusClose,
    ZoomTick { out: bool },
    Ping,
    PulseHit,
    /// `index` is the 1-based character position just typed
    TypeTick { index: usize },
}

/// Fire-and-forget commands for the host's collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Effect {
    Cue(Cue),
    /// Short lead note on the given scale degree
    MusicAccent { degree: u32 },
    /// Speak the text, or stop if already speaking
    ToggleSpeech(String),
    StopSpeech,
    RunStarted { seed: u32 },
}

/// Read-only strings for the UI collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Display {
    pub prompt: String,
    /// Prompt should be styled as a warning
    pub urgent: bool,
    pub title: String,
    pub subtitle: String,
    pub signal_line: String,
    /// Typed portion of the current poem line
    pub poem_line: String,
    pub cursor_on: bool,
    pub signal: u8,
    pub signal_max: u8,
    pub mode_label: &'static str,
    /// "VIEWING: LAMP" while in focus
    pub viewing: Option<String>,
    pub final_poem: Option<String>,
    pub final_hint: Option<&'static str>,
    pub compass: Option<StationId>,
}

impl Display {
    /// Poem panel contents, one entry per line
    pub fn poem_text(&self) -> String {
        let cursor = if self.cursor_on { '\u{2588}' } else { ' ' };
        format!(
            "{}\n{}\n{}\n\n{}{}",
            self.title, self.subtitle, self.signal_line, self.poem_line, cursor
        )
    }
}

/// Everything one tick hands back to the host
#[derive(Debug, Clone)]
pub struct Frame {
    pub params: ParameterVector,
    pub display: Display,
    pub effects: Vec<Effect>,
}

/// Session state machine
///
/// Owns the live [`RunSession`], the seed source for restarts and the
/// focus-card cache. All session mutation happens inside [`Engine::tick`].
#[derive(Debug)]
pub struct Engine {
    tuning: Tuning,
    seeds: SeedSource,
    session: RunSession,
    canvas: CanvasSize,
    cards: FocusCardCache,
    profile: AnimationProfile,
    speech_available: bool,
}

impl Engine {
    /// A pinned seed in `tuning` overrides `seeds`
    pub fn new(tuning: Tuning, seeds: SeedSource, canvas: CanvasSize) -> Self {
        let mut seeds = match tuning.pinned_seed {
            Some(seed) => SeedSource::pinned(seed),
            None => seeds,
        };
        let seed = seeds.next_seed();
        log::info!("run started with seed {seed}");
        let session = RunSession::new(seed, &tuning);
        let mut cards = FocusCardCache::new();
        cards.set_canvas(canvas);
        Self {
            tuning,
            seeds,
            session,
            canvas,
            cards,
            profile: AnimationProfile::default(),
            speech_available: false,
        }
    }

    /// Speech capability, detected once by the host
    pub fn with_speech(mut self, available: bool) -> Self {
        self.speech_available = available;
        self
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.profile = AnimationProfile::for_settings(reduced);
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
        self.cards.set_canvas(canvas);
    }

    /// Detail view of the focused hidden station
    pub fn focus_card(&mut self) -> Option<&FocusCard> {
        let id = self.session.mode.focused()?;
        let station = self.session.station(id)?;
        if station.kind() != StationKind::Hidden {
            return None;
        }
        let (seed, sprite) = (station.glyph_seed, station.sprite);
        Some(self.cards.get(seed, sprite, self.canvas))
    }

    /// Replace the session with a fresh run
    pub fn restart(&mut self) -> Vec<Effect> {
        let seed = self.seeds.next_seed();
        log::info!("restart: seed {} -> {}", self.session.seed, seed);
        self.session = RunSession::new(seed, &self.tuning);
        vec![Effect::StopSpeech, Effect::RunStarted { seed }]
    }

    /// Advance one fixed step of `dt` seconds
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Frame {
        let mut fx = Vec::new();

        if let Some(id) = input.warp_to {
            self.warp(id, &mut fx);
        }

        for event in &input.events {
            self.handle_event(*event, &mut fx);
        }

        let velocity = if self.session.in_world_play() {
            self.walk(&input.moves, &mut fx)
        } else {
            Vec2::ZERO
        };
        self.session.motion.update(velocity, input.moves.any());

        self.update_pulse(&mut fx);
        self.animate(dt, &mut fx);
        self.update_proximity(&mut fx);

        let params = map_parameters(&self.session, self.canvas, self.tuning.interact_radius, &self.profile);
        let display = self.display();
        Frame { params, display, effects: fx }
    }

    fn handle_event(&mut self, event: InputEvent, fx: &mut Vec<Effect>) {
        if self.session.mode == Mode::FinalModal {
            match event {
                InputEvent::SpeakToggle if self.speech_available => {
                    if let Some(text) = &self.session.final_poem {
                        fx.push(Effect::ToggleSpeech(text.clone()));
                    }
                }
                InputEvent::Escape => self.close_final(fx),
                InputEvent::Restart => fx.extend(self.restart()),
                _ => {}
            }
            return;
        }

        match event {
            InputEvent::Escape => {
                if self.session.mode.focused().is_some() {
                    self.exit_focus(fx);
                } else {
                    self.session.paused = !self.session.paused;
                    log::debug!("paused: {}", self.session.paused);
                }
            }
            InputEvent::Restart => fx.extend(self.restart()),
            InputEvent::Ping => {
                if self.session.in_world_play() {
                    self.session.pulse.launch();
                    fx.push(Effect::Cue(Cue::Ping));
                }
            }
            InputEvent::Interact => {
                if self.session.paused {
                    return;
                }
                match self.session.mode.focused() {
                    Some(id) if id.is_exit() => self.interact_exit_focus(fx),
                    Some(_) => self.exit_focus(fx),
                    None => match self.session.in_range() {
                        Some(id) => self.visit(id, fx),
                        None => fx.push(Effect::Cue(Cue::Tap)),
                    },
                }
            }
            InputEvent::Scroll(delta) => {
                if self.session.mode.focused().is_some() {
                    let out = self.session.focus_zoom.scroll(delta);
                    fx.push(Effect::Cue(Cue::ZoomTick { out }));
                }
            }
            InputEvent::SpeakToggle => {}
        }
    }

    /// World -> Focus. The visit is logged before anything else happens.
    fn visit(&mut self, id: StationId, fx: &mut Vec<Effect>) {
        log::debug!("visit {id} (history {})", self.session.history.len());
        self.session.history.push(id);

        match id {
            StationId::Hidden(_) => {
                self.gain_signal(fx);
                self.emit(Pool::Hidden, salts::HIDDEN);
                fx.push(Effect::Cue(Cue::InteractMid));
                self.session.mode = Mode::Focus(id);
                self.session.focus_zoom.reset();
            }
            StationId::Core(obj) => {
                self.core_poetry(id);
                if obj.is_exit() {
                    self.approach_exit(fx);
                } else {
                    self.core_effect(obj, fx);
                }
                self.enter_focus(id, fx);
            }
        }
    }

    /// Connector, own line and glitch for any core object
    fn core_poetry(&mut self, id: StationId) {
        if self.session.history.len() >= 2 && self.session.roll(salts::ROLL_CONNECTOR) < self.tuning.connector_chance as f64 {
            self.emit(Pool::Connector, salts::CONNECTOR);
        }
        self.emit(Pool::for_station(id), salts::station(id));
        if self.session.roll(salts::ROLL_GLITCH) < self.tuning.glitch_chance as f64 {
            self.emit(Pool::Glitch, salts::INTERACT_GLITCH);
        }
    }

    fn core_effect(&mut self, obj: CoreObject, fx: &mut Vec<Effect>) {
        let cue = match obj {
            CoreObject::Lamp => {
                self.session.fractal.apply_progress();
                Cue::InteractHigh
            }
            CoreObject::Mirror => {
                let mut stream = self.session.stream(salts::MIRROR_DRIFT);
                let offset = Vec2::new(
                    stream.range(-MIRROR_DRIFT, MIRROR_DRIFT),
                    stream.range(-MIRROR_DRIFT, MIRROR_DRIFT),
                );
                self.session.fractal.apply_shift(offset);
                Cue::InteractMid
            }
            CoreObject::Desk => {
                self.session.fractal.apply_detail();
                Cue::InteractLow
            }
            CoreObject::Door => return,
        };
        fx.push(Effect::Cue(cue));
    }

    /// First contact with the exit from the world
    fn approach_exit(&mut self, fx: &mut Vec<Effect>) {
        if self.session.history.can_approach_exit() {
            let level = self.session.signal.level() as u32;
            self.session.door_trail.extend(190 + 35 * level);
            fx.push(Effect::Cue(Cue::DoorRumble));
        } else {
            self.deny(fx);
        }
    }

    /// Interact while inspecting the exit: seal, or log the attempt and refuse
    fn interact_exit_focus(&mut self, fx: &mut Vec<Effect>) {
        if self.session.history.can_finalize() {
            self.session.seal();
            self.session.mode = Mode::FinalModal;
            self.session.paused = true;
            self.session.focus_zoom.reset();
            fx.push(Effect::Cue(Cue::FocusClose));
            return;
        }
        self.session.history.push(StationId::EXIT);
        log::debug!("exit refused, {} line(s) missing", self.session.history.lines_needed());
        self.deny(fx);
    }

    fn deny(&mut self, fx: &mut Vec<Effect>) {
        self.emit(Pool::Denied, salts::DENIED);
        fx.push(Effect::Cue(Cue::Denied));
    }

    fn enter_focus(&mut self, id: StationId, fx: &mut Vec<Effect>) {
        self.session.mode = Mode::Focus(id);
        self.session.focus_zoom.reset();
        fx.push(Effect::Cue(Cue::FocusOpen));
    }

    fn exit_focus(&mut self, fx: &mut Vec<Effect>) {
        self.session.mode = Mode::World;
        self.session.focus_zoom.reset();
        fx.push(Effect::Cue(Cue::FocusClose));
    }

    fn close_final(&mut self, fx: &mut Vec<Effect>) {
        fx.push(Effect::StopSpeech);
        self.session.mode = Mode::World;
        self.session.paused = false;
        self.session.focus_zoom.reset();
    }

    /// Raise signal by one; silent at saturation
    fn gain_signal(&mut self, fx: &mut Vec<Effect>) {
        let Some(level) = self.session.signal.gain() else {
            return;
        };
        log::debug!("signal {level}/{MAX_SIGNAL}");
        let level = level as u32;
        self.session.door_trail.max_ticks = 260 + 50 * level;
        self.session.pulse.speed = 18.0 + 2.0 * level as f32;

        self.emit(Pool::Signal, salts::SIGNAL);
        if self.session.roll(salts::ROLL_MUTATION_A) < self.tuning.mutation_chance as f64 {
            self.emit(Pool::Mutation, salts::MUTATION);
        }
        if self.session.roll(salts::ROLL_MUTATION_B) < self.tuning.mutation_chance_extra as f64 {
            self.emit(Pool::Mutation, salts::MUTATION);
        }
        self.session.fractal.apply_signal();
        self.accent(fx);
    }

    fn emit(&mut self, pool: Pool, salt: u32) -> &'static str {
        self.session.emit(pool, salt, self.tuning.unique_draws)
    }

    fn accent(&mut self, fx: &mut Vec<Effect>) {
        let salt = salts::ACCENT ^ self.session.accents;
        self.session.accents += 1;
        let degree = self.session.stream(salt).index(ACCENT_DEGREES) as u32;
        fx.push(Effect::MusicAccent { degree });
    }

    fn warp(&mut self, id: StationId, fx: &mut Vec<Effect>) {
        let Some(pos) = self.session.station(id).map(|s| s.pos) else {
            log::warn!("warp target {id} does not exist");
            return;
        };
        self.session.player = self.session.world.clamp_body(pos, PLAYER_RADIUS);
        self.reveal_nearby(fx);
    }

    /// Integrate one step of walking; returns the applied velocity
    fn walk(&mut self, moves: &MoveKeys, fx: &mut Vec<Effect>) -> Vec2 {
        let velocity = moves.vector() * self.tuning.player_speed;
        let session = &mut self.session;
        session.player = session.world.clamp_body(session.player + velocity, PLAYER_RADIUS);
        session.fractal.nudge(velocity);
        self.reveal_nearby(fx);

        if moves.any() {
            self.session.step_timer += 1;
            if self.session.step_timer >= STEP_CADENCE {
                self.session.step_timer = 0;
                fx.push(Effect::Cue(Cue::Step));
            }
        } else {
            self.session.step_timer = 0;
        }
        velocity
    }

    /// Reveal hidden stations around the player; revealing never grants signal
    fn reveal_nearby(&mut self, fx: &mut Vec<Effect>) {
        let player = self.session.player;
        let mut revealed = 0;
        for station in &mut self.session.stations {
            if station.try_reveal(player) {
                log::debug!("revealed {}", station.id);
                revealed += 1;
            }
        }
        for _ in 0..revealed {
            fx.push(Effect::Cue(Cue::Proximity));
            self.emit(Pool::Glitch, salts::REVEAL_GLITCH);
        }
    }

    fn update_pulse(&mut self, fx: &mut Vec<Effect>) {
        let session = &mut self.session;
        if !session.pulse.active {
            return;
        }
        session.pulse.radius += session.pulse.speed;
        let Some(door) = session.stations.iter().find(|s| s.id.is_exit()).map(|s| s.pos) else {
            session.pulse.active = false;
            return;
        };
        if session.pulse.radius > session.world.width.max(session.world.height) {
            session.pulse.active = false;
            return;
        }
        if !session.pulse.hit && session.pulse.radius >= session.player.distance(door) {
            session.pulse.hit = true;
            session.door_trail.ticks = session.door_trail.max_ticks;
            fx.push(Effect::Cue(Cue::PulseHit));
        }
    }

    /// Clock, easing, camera and typewriter. Runs in every mode.
    fn animate(&mut self, dt: f32, fx: &mut Vec<Effect>) {
        let canvas = self.canvas;
        let session = &mut self.session;
        session.clock += dt;
        session.ticks += 1;

        if session.mode == Mode::World {
            session.door_trail.ticks = session.door_trail.ticks.saturating_sub(1);
        }

        session.fractal.animate(session.clock, &self.profile);
        session.focus_zoom.ease();

        let (hw, hh) = canvas.half();
        let cam = session.camera.lerp(session.player, CAMERA_EASE);
        session.camera = Vec2::new(
            constrain(cam.x, hw, session.world.width - hw),
            constrain(cam.y, hh, session.world.height - hh),
        );

        if let Some(index) = session.typewriter.update(dt * 1000.0) {
            if session.mode != Mode::FinalModal {
                debug_assert_eq!(index % TICK_EVERY, 0);
                fx.push(Effect::Cue(Cue::TypeTick { index }));
            }
        }
    }

    /// Cue and accent when a new station comes into range
    fn update_proximity(&mut self, fx: &mut Vec<Effect>) {
        if !self.session.in_world_play() {
            return;
        }
        let near = self.session.in_range();
        if near.is_some() && near != self.session.last_near {
            fx.push(Effect::Cue(Cue::Proximity));
            self.accent(fx);
        }
        self.session.last_near = near;
    }

    fn display(&self) -> Display {
        let session = &self.session;
        let history = &session.history;
        let need = history.lines_needed();

        let calm = |text: &str| (text.to_string(), false);
        let (prompt, urgent) = match session.mode {
            Mode::FinalModal => calm("Final poem. ESC closes. R restarts. Space speaks."),
            Mode::Focus(id) if id.is_exit() && history.can_finalize() => {
                calm("Door ready. Press E to seal. Mouse wheel zoom.")
            }
            Mode::Focus(_) => calm("Focus view. Mouse wheel zoom. E or ESC closes. Q pings door."),
            Mode::World if session.paused => calm("Paused. ESC returns. R restarts."),
            Mode::World => match session.in_range() {
                Some(id) if id.is_exit() && need > 0 => {
                    (format!("The door wants more input. Find {need} more object(s)."), true)
                }
                Some(_) => calm("Press E to interact. Q pings the door."),
                None if need > 0 => {
                    let plural = if need > 1 { "S." } else { "." };
                    (format!("EXPLORE. FIND {need} MORE OBJECT{plural} Hidden SIG nodes deepen SIGNAL."), true)
                }
                None if !history.has_exit() => calm("You have enough lines. Find the door. Press Q to ping it."),
                None => calm("Return to the door. View it and press E to seal."),
            },
        };

        let viewing = session
            .mode
            .focused()
            .and_then(|id| session.station(id))
            .map(|s| format!("VIEWING: {}", s.label()));

        let final_open = session.mode == Mode::FinalModal;
        let final_hint = final_open.then_some(if self.speech_available {
            "SPACE: SPEAK OR STOP   ESC: CLOSE   R: RESTART"
        } else {
            "ESC: CLOSE   R: RESTART"
        });

        Display {
            prompt,
            urgent,
            title: session.title.clone(),
            subtitle: poem::subtitle(history),
            signal_line: poem::signal_line(session.signal.level()),
            poem_line: session.typewriter.held().to_string(),
            cursor_on: session.typewriter.cursor_on(),
            signal: session.signal.level(),
            signal_max: MAX_SIGNAL,
            mode_label: session.mode_label(),
            viewing,
            final_poem: if final_open { session.final_poem.clone() } else { None },
            final_hint,
            compass: if session.mode == Mode::World { session.compass_target() } else { None },
        }
    }
}
