//! Frame loop
//!
//! [`Host`] owns the engine and its collaborators. Platform code feeds it
//! input and wall-clock deltas; it runs fixed ticks and dispatches whatever
//! effects each tick returns.

use crate::CanvasSize;
use crate::audio::{AudioEngine, AudioOut, MusicFrame};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::render::{Renderer, SceneView};
use crate::settings::{Settings, Toggle};
use crate::sim::{Direction, Effect, Engine, Frame, InputEvent, InputQueue, SeedSource, TickInput};
use crate::speech::{Speech, SpeechEngine};
use crate::tuning::Tuning;

/// Longest wall-clock step accepted per frame, in seconds
const MAX_FRAME_DT: f32 = 0.1;

pub struct Host<A: AudioEngine, S: SpeechEngine, R: Renderer> {
    engine: Engine,
    audio: AudioOut<A>,
    speech: Speech<S>,
    renderer: R,
    settings: Settings,
    input: InputQueue,
    accumulator: f32,
    last_frame: Option<Frame>,
}

impl<A: AudioEngine, S: SpeechEngine, R: Renderer> Host<A, S, R> {
    /// A seed pinned in `tuning` wins over one pinned in `settings`
    pub fn new(
        tuning: Tuning,
        settings: &Settings,
        seeds: SeedSource,
        canvas: CanvasSize,
        audio: A,
        speech: S,
        renderer: R,
    ) -> Self {
        let tuning = match (tuning.pinned_seed, settings.pinned_seed) {
            (None, Some(seed)) => tuning.with_pinned_seed(seed),
            _ => tuning,
        };
        let speech = Speech::new(speech, settings.speech_enabled);
        let mut engine = Engine::new(tuning, seeds, canvas).with_speech(speech.is_available());
        engine.set_reduced_motion(settings.reduced_motion);

        Self {
            engine,
            audio: AudioOut::new(audio, settings),
            speech,
            renderer,
            settings: settings.clone(),
            input: InputQueue::new(),
            accumulator: 0.0,
            last_frame: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn audio(&self) -> &AudioOut<A> {
        &self.audio
    }

    pub fn speech(&self) -> &Speech<S> {
        &self.speech
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Takes effect on the next tick. Speech and the pinned seed are fixed
    /// at construction and ignored here.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.audio.apply_settings(&settings);
        self.engine.set_reduced_motion(settings.reduced_motion);
        self.settings = settings;
    }

    /// Flip a preference mid-run; returns the new settings for saving
    pub fn toggle_setting(&mut self, toggle: Toggle) -> &Settings {
        let mut next = self.settings.clone();
        next.toggle(toggle);
        log::info!("{toggle:?} toggled");
        self.apply_settings(next);
        &self.settings
    }

    pub fn resize(&mut self, canvas: CanvasSize) {
        if canvas != self.engine.canvas() {
            log::debug!("resize to {}x{}", canvas.width, canvas.height);
            self.engine.set_canvas(canvas);
        }
    }

    /// Queue a discrete action. Any user input arms audio.
    pub fn push(&mut self, event: InputEvent) {
        self.audio.arm();
        self.input.push(event);
    }

    pub fn set_direction(&mut self, dir: Direction, down: bool) {
        if down {
            self.audio.arm();
        }
        self.input.set_direction(dir, down);
    }

    /// Focus lost: forget held keys
    pub fn release_all(&mut self) {
        self.input.release_all();
    }

    /// Advance by a wall-clock delta; returns how many ticks ran
    pub fn frame(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            // Events go to the first substep only; held keys persist
            let input = self.input.drain();
            self.step(&input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        if substeps > 0 {
            self.present();
        }
        substeps
    }

    /// One fixed tick with explicit input, effects dispatched
    pub fn step(&mut self, input: &TickInput) -> &Frame {
        let frame = self.engine.tick(input, SIM_DT);
        self.dispatch(&frame);
        self.last_frame.insert(frame)
    }

    fn dispatch(&mut self, frame: &Frame) {
        for effect in &frame.effects {
            match effect {
                Effect::Cue(cue) => self.audio.play(*cue),
                Effect::MusicAccent { degree } => self.audio.accent(*degree),
                Effect::ToggleSpeech(text) => self.speech.toggle(text),
                Effect::StopSpeech => self.speech.stop(),
                Effect::RunStarted { seed } => log::info!("new run, seed {seed}"),
            }
        }

        let session = self.engine.session();
        let music = MusicFrame {
            bpm: frame.params.tempo_bpm,
            cutoff: frame.params.filter_cutoff,
            feedback: frame.params.delay_feedback,
            motion: session.motion.smoothed,
            history_len: session.history.len(),
        };
        self.audio.update_music(SIM_DT * 1000.0, music);
    }

    /// Hand the latest frame to the renderer
    fn present(&mut self) {
        let Some(frame) = &self.last_frame else { return };
        let canvas = self.engine.canvas();
        let card = self.engine.focus_card().cloned();
        let scene = SceneView::build(self.engine.session(), canvas, &frame.display, card.as_ref());
        self.renderer.draw_scene(&scene);
        self.renderer.render(&frame.params, canvas);
    }
}
