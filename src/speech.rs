//! Speech collaborator
//!
//! Reads the sealed poem aloud. Whether the platform can speak is decided
//! once, when the [`Speech`] controller is built; without a voice every call
//! is a no-op.

use std::cell::Cell;
use std::rc::Rc;

/// Shared "currently speaking" flag; backends clear it from their
/// completion callbacks
#[derive(Debug, Clone, Default)]
pub struct SpeakingFlag(Rc<Cell<bool>>);

impl SpeakingFlag {
    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, speaking: bool) {
        self.0.set(speaking);
    }
}

/// Text-to-speech backend
pub trait SpeechEngine {
    /// Capability check, asked once
    fn available(&self) -> bool;

    /// Start an utterance. Completion or failure must clear `done`.
    fn speak(&mut self, text: &str, done: SpeakingFlag);

    /// Cancel anything queued or playing
    fn stop(&mut self);
}

/// Backend with no voice
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeech;

impl SpeechEngine for NoSpeech {
    fn available(&self) -> bool {
        false
    }

    fn speak(&mut self, _text: &str, _done: SpeakingFlag) {}

    fn stop(&mut self) {}
}

/// Capability-gated speech controller
#[derive(Debug)]
pub struct Speech<S: SpeechEngine> {
    engine: Option<S>,
    speaking: SpeakingFlag,
}

impl<S: SpeechEngine> Speech<S> {
    /// `enabled` is the user preference; a missing voice disables speech too
    pub fn new(engine: S, enabled: bool) -> Self {
        let engine = if !enabled {
            log::info!("speech disabled in settings");
            None
        } else if !engine.available() {
            log::warn!("speech synthesis unavailable - speech disabled");
            None
        } else {
            Some(engine)
        };
        Self {
            engine,
            speaking: SpeakingFlag::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.get()
    }

    /// Speak `text`, or stop if already speaking
    pub fn toggle(&mut self, text: &str) {
        let Some(engine) = &mut self.engine else { return };
        if self.speaking.get() {
            engine.stop();
            self.speaking.set(false);
            return;
        }
        engine.stop();
        self.speaking.set(true);
        engine.speak(text, self.speaking.clone());
    }

    pub fn stop(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.stop();
            self.speaking.set(false);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebSpeech;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance};

    use super::{SpeakingFlag, SpeechEngine};

    /// Web Speech backend
    pub struct WebSpeech {
        synth: Option<SpeechSynthesis>,
    }

    impl Default for WebSpeech {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebSpeech {
        pub fn new() -> Self {
            let synth = web_sys::window().and_then(|w| w.speech_synthesis().ok());
            Self { synth }
        }
    }

    impl SpeechEngine for WebSpeech {
        fn available(&self) -> bool {
            self.synth.is_some()
        }

        fn speak(&mut self, text: &str, done: SpeakingFlag) {
            let Some(synth) = &self.synth else { return };
            let Ok(utter) = SpeechSynthesisUtterance::new_with_text(text) else {
                log::warn!("could not build utterance");
                done.set(false);
                return;
            };
            utter.set_rate(0.95);
            utter.set_pitch(1.0);
            utter.set_volume(1.0);

            let on_end = done.clone();
            let end = Closure::once_into_js(move || on_end.set(false));
            let fail = Closure::once_into_js(move || done.set(false));
            utter.set_onend(Some(end.unchecked_ref()));
            utter.set_onerror(Some(fail.unchecked_ref()));

            synth.speak(&utter);
        }

        fn stop(&mut self) {
            if let Some(synth) = &self.synth {
                synth.cancel();
            }
        }
    }
}
