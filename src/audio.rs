//! Audio: cue table, arming gate and procedural music
//!
//! Every sound is procedural. The engine only ever calls
//! [`AudioEngine::trigger`] with a voice name, a frequency and an envelope;
//! what a backend does with that is its own business.

use serde::Serialize;

use crate::lerp;
use crate::settings::Settings;
use crate::sim::Cue;

/// Attack/release envelope. Times in seconds, peak amplitude in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Envelope {
    pub attack: f32,
    pub release: f32,
    pub amp: f32,
}

impl Envelope {
    pub const fn new(attack: f32, release: f32, amp: f32) -> Self {
        Self { attack, release, amp }
    }

    /// Noise bursts all share the same near-instant attack
    pub const fn burst(dur: f32, amp: f32) -> Self {
        Self::new(0.001, dur, amp)
    }

    pub fn scaled(self, gain: f32) -> Self {
        Self {
            amp: self.amp * gain,
            ..self
        }
    }
}

/// Sound source a trigger is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoiceKind {
    /// Triangle oscillator for effects
    Blip,
    /// Filtered noise for effects; frequency is the filter cutoff
    Noise,
    Lead,
    Bass,
    Hat,
}

impl VoiceKind {
    /// Name passed to `trigger`
    pub fn name(&self) -> &'static str {
        match self {
            VoiceKind::Blip => "blip",
            VoiceKind::Noise => "noise",
            VoiceKind::Lead => "lead",
            VoiceKind::Bass => "bass",
            VoiceKind::Hat => "hat",
        }
    }
}

/// One scheduled sound
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Voice {
    pub kind: VoiceKind,
    pub freq: f32,
    pub env: Envelope,
}

const fn blip(freq: f32, release: f32, amp: f32) -> Voice {
    Voice {
        kind: VoiceKind::Blip,
        freq,
        env: Envelope::new(0.001, release, amp),
    }
}

const fn noise(freq: f32, dur: f32, amp: f32) -> Voice {
    Voice {
        kind: VoiceKind::Noise,
        freq,
        env: Envelope::burst(dur, amp),
    }
}

/// Voices making up a cue
pub fn cue_voices(cue: Cue) -> Vec<Voice> {
    match cue {
        Cue::Step => vec![noise(520.0, 0.018, 0.10)],
        Cue::Proximity => vec![blip(720.0, 0.04, 0.28)],
        Cue::Tap => vec![blip(220.0, 0.05, 0.28)],
        Cue::Denied => vec![blip(150.0, 0.08, 0.36), noise(320.0, 0.06, 0.22)],
        Cue::InteractHigh => vec![blip(880.0, 0.06, 0.38), noise(1200.0, 0.08, 0.22)],
        Cue::InteractMid => vec![blip(520.0, 0.07, 0.36), noise(950.0, 0.08, 0.22)],
        Cue::InteractLow => vec![blip(260.0, 0.08, 0.34), noise(750.0, 0.10, 0.22)],
        Cue::DoorRumble => vec![noise(180.0, 0.30, 0.30), blip(90.0, 0.18, 0.30)],
        Cue::FocusOpen => vec![blip(980.0, 0.08, 0.28), noise(1400.0, 0.10, 0.18)],
        Cue::FocusClose => vec![blip(360.0, 0.08, 0.28), noise(700.0, 0.08, 0.18)],
        Cue::ZoomTick { out } => vec![blip(if out { 300.0 } else { 520.0 }, 0.04, 0.22)],
        Cue::Ping => vec![blip(420.0, 0.06, 0.30)],
        Cue::PulseHit => vec![blip(820.0, 0.08, 0.38), noise(1200.0, 0.06, 0.24)],
        Cue::TypeTick { index } => vec![blip(420.0 + (index % 9) as f32 * 12.0, 0.02, 0.10)],
    }
}

/// Sound backend
pub trait AudioEngine {
    fn trigger(&mut self, name: &str, frequency: f32, envelope: Envelope);

    /// Music bus filter cutoff (Hz) and delay feedback; optional
    fn shape_music(&mut self, _cutoff: f32, _feedback: f32) {}

    /// First user gesture arrived; browsers only start audio after one
    fn resume(&mut self) {}
}

/// Backend that makes no sound (headless host, missing audio device)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioEngine for NullAudio {
    fn trigger(&mut self, _name: &str, _frequency: f32, _envelope: Envelope) {}
}

// === Music ===

/// Minor-ish scale, semitones above the root
const SCALE: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];
/// Scale degree per step; `None` is a rest
const LEAD_PATTERN: [Option<u32>; 16] = [
    Some(0),
    None,
    Some(3),
    None,
    Some(5),
    None,
    Some(3),
    None,
    Some(7),
    None,
    Some(5),
    None,
    Some(3),
    None,
    Some(2),
    None,
];
const STEPS: usize = LEAD_PATTERN.len();
/// A4 in MIDI
const ACCENT_ROOT: i32 = 57;

pub fn midi_to_freq(note: i32) -> f32 {
    440.0 * 2f32.powf((note - 69) as f32 / 12.0)
}

/// MIDI note for a scale degree; degrees past the scale climb octaves
pub fn scale_note(root: i32, degree: u32) -> i32 {
    let len = SCALE.len() as u32;
    root + SCALE[(degree % len) as usize] + (degree / len) as i32 * 12
}

/// Root shifts with the length of the interaction history
pub fn music_root(history_len: usize) -> i32 {
    ACCENT_ROOT + (history_len % 3) as i32 * 2
}

/// Short lead note on a scale degree
pub fn accent_voice(degree: u32) -> Voice {
    Voice {
        kind: VoiceKind::Lead,
        freq: midi_to_freq(scale_note(ACCENT_ROOT, degree)),
        env: Envelope::new(0.002, 0.08, 0.16),
    }
}

/// 16-step sequencer driven by simulated milliseconds
#[derive(Debug, Clone, Default)]
pub struct MusicSequencer {
    step: usize,
    since_step_ms: f32,
}

impl MusicSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sixteenth-note length at `bpm`
    pub fn step_ms(bpm: f32) -> f32 {
        1000.0 / (bpm / 60.0 * 4.0)
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Advance time; returns the voices of every step boundary crossed
    pub fn advance(&mut self, dt_ms: f32, bpm: f32, history_len: usize, motion: f32, cutoff: f32) -> Vec<Voice> {
        let step_ms = Self::step_ms(bpm.max(1.0));
        let root = music_root(history_len);
        self.since_step_ms += dt_ms;

        let mut out = Vec::new();
        while self.since_step_ms >= step_ms {
            self.since_step_ms -= step_ms;
            self.step = (self.step + 1) % STEPS;
            out.extend(Self::step_voices(self.step, root, motion, cutoff));
        }
        out
    }

    fn step_voices(step: usize, root: i32, motion: f32, cutoff: f32) -> Vec<Voice> {
        let mut voices = Vec::with_capacity(3);
        if let Some(degree) = LEAD_PATTERN[step] {
            voices.push(Voice {
                kind: VoiceKind::Lead,
                freq: midi_to_freq(scale_note(root, degree)),
                env: Envelope::new(0.004, 0.12, lerp(0.10, 0.20, motion)),
            });
        }
        if step % 4 == 0 {
            voices.push(Voice {
                kind: VoiceKind::Bass,
                freq: midi_to_freq(scale_note(root - 12, 0)),
                env: Envelope::new(0.002, 0.18, 0.22),
            });
        }
        if step % 2 == 1 {
            // Hat is unpitched; it rides the music filter
            voices.push(Voice {
                kind: VoiceKind::Hat,
                freq: cutoff,
                env: Envelope::new(0.001, 0.03, 0.10),
            });
        }
        voices
    }
}

// === Output gate ===

/// Continuous music inputs for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicFrame {
    pub bpm: f32,
    pub cutoff: f32,
    pub feedback: f32,
    /// Smoothed movement amount in [0, 1]
    pub motion: f32,
    pub history_len: usize,
}

/// Volume-scaled, arm-gated front for an [`AudioEngine`]
///
/// Nothing reaches the backend before [`AudioOut::arm`]. Dropped calls are
/// not queued for later.
#[derive(Debug)]
pub struct AudioOut<A: AudioEngine> {
    engine: A,
    armed: bool,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    music_on: bool,
    sequencer: MusicSequencer,
}

impl<A: AudioEngine> AudioOut<A> {
    pub fn new(engine: A, settings: &Settings) -> Self {
        let mut out = Self {
            engine,
            armed: false,
            master_volume: 0.0,
            sfx_volume: 0.0,
            music_volume: 0.0,
            music_on: true,
            sequencer: MusicSequencer::new(),
        };
        out.apply_settings(settings);
        out
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.master_volume = settings.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = settings.music_volume.clamp(0.0, 1.0);
        self.music_on = settings.music_on;
    }

    /// Idempotent; later calls do nothing
    pub fn arm(&mut self) {
        if self.armed {
            return;
        }
        self.armed = true;
        self.sequencer = MusicSequencer::new();
        self.engine.resume();
        log::info!("audio armed");
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn engine(&self) -> &A {
        &self.engine
    }

    pub fn play(&mut self, cue: Cue) {
        let gain = self.master_volume * self.sfx_volume;
        for voice in cue_voices(cue) {
            self.send(voice, gain);
        }
    }

    pub fn accent(&mut self, degree: u32) {
        if self.music_on {
            self.send(accent_voice(degree), self.master_volume * self.music_volume);
        }
    }

    /// Step the sequencer by `dt_ms` of simulated time
    pub fn update_music(&mut self, dt_ms: f32, frame: MusicFrame) {
        if !self.armed || !self.music_on {
            return;
        }
        self.engine.shape_music(frame.cutoff, frame.feedback);
        let voices = self
            .sequencer
            .advance(dt_ms, frame.bpm, frame.history_len, frame.motion, frame.cutoff);
        let gain = self.master_volume * self.music_volume;
        for voice in voices {
            self.send(voice, gain);
        }
    }

    fn send(&mut self, voice: Voice, gain: f32) {
        if !self.armed || gain <= 0.0 {
            return;
        }
        self.engine.trigger(voice.kind.name(), voice.freq, voice.env.scaled(gain));
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{
        AudioContext, AudioNode, BiquadFilterNode, BiquadFilterType, DelayNode, GainNode, OscillatorNode,
        OscillatorType,
    };

    use super::{AudioEngine, Envelope};

    /// Music bus: filter -> destination, plus a feedback delay send
    struct MusicBus {
        filter: BiquadFilterNode,
        feedback: GainNode,
    }

    /// Web Audio backend
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        music: Option<MusicBus>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            let music = ctx.as_ref().and_then(Self::music_bus);
            Self { ctx, music }
        }

        fn music_bus(ctx: &AudioContext) -> Option<MusicBus> {
            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(1200.0);
            filter.q().set_value(3.0);

            let delay: DelayNode = ctx.create_delay().ok()?;
            delay.delay_time().set_value(0.22);
            let feedback = ctx.create_gain().ok()?;
            feedback.gain().set_value(0.42);

            let out = ctx.destination();
            filter.connect_with_audio_node(&out).ok()?;
            filter.connect_with_audio_node(&delay).ok()?;
            delay.connect_with_audio_node(&feedback).ok()?;
            feedback.connect_with_audio_node(&delay).ok()?;
            delay.connect_with_audio_node(&out).ok()?;

            Some(MusicBus { filter, feedback })
        }

        /// Oscillator with a gain stage, wired to `dest`
        fn create_osc(
            ctx: &AudioContext,
            dest: &AudioNode,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(dest).ok()?;

            Some((osc, gain))
        }

        /// Noise stand-in: a buzzy oscillator through a lowpass at `cutoff`
        fn create_noise(ctx: &AudioContext, dest: &AudioNode, cutoff: f32) -> Option<(OscillatorNode, GainNode)> {
            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(cutoff);
            filter.q().set_value(6.0);
            filter.connect_with_audio_node(dest).ok()?;
            Self::create_osc(ctx, &filter, cutoff * 0.5, OscillatorType::Sawtooth)
        }
    }

    impl AudioEngine for WebAudio {
        fn trigger(&mut self, name: &str, frequency: f32, env: Envelope) {
            let Some(ctx) = &self.ctx else { return };
            let destination = ctx.destination();
            let dest: &AudioNode = match (&self.music, name) {
                (Some(bus), "lead" | "bass" | "hat") => &*bus.filter,
                _ => &*destination,
            };

            let nodes = match name {
                "noise" => Self::create_noise(ctx, dest, frequency),
                "hat" => Self::create_noise(ctx, dest, 6000.0),
                "bass" => Self::create_osc(ctx, dest, frequency, OscillatorType::Sine),
                "blip" | "lead" => Self::create_osc(ctx, dest, frequency, OscillatorType::Triangle),
                _ => {
                    log::debug!("unknown voice {name}");
                    None
                }
            };
            let Some((osc, gain)) = nodes else { return };

            let t = ctx.current_time();
            let peak = t + env.attack as f64;
            let end = peak + env.release as f64;
            gain.gain().set_value_at_time(0.0001, t).ok();
            gain.gain().linear_ramp_to_value_at_time(env.amp.max(0.0001), peak).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.0001, end).ok();

            osc.start().ok();
            osc.stop_with_when(end + 0.02).ok();
        }

        fn shape_music(&mut self, cutoff: f32, feedback: f32) {
            if let Some(bus) = &self.music {
                bus.filter.frequency().set_value(cutoff);
                bus.feedback.gain().set_value(feedback);
            }
        }

        fn resume(&mut self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend that records every trigger
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<(String, f32, Envelope)>,
        shaped: Option<(f32, f32)>,
        resumed: u32,
    }

    impl AudioEngine for Recorder {
        fn trigger(&mut self, name: &str, frequency: f32, envelope: Envelope) {
            self.calls.push((name.to_string(), frequency, envelope));
        }

        fn shape_music(&mut self, cutoff: f32, feedback: f32) {
            self.shaped = Some((cutoff, feedback));
        }

        fn resume(&mut self) {
            self.resumed += 1;
        }
    }

    fn full_volume() -> Settings {
        Settings {
            master_volume: 1.0,
            sfx_volume: 1.0,
            music_volume: 1.0,
            ..Settings::default()
        }
    }

    fn frame(bpm: f32) -> MusicFrame {
        MusicFrame {
            bpm,
            cutoff: 650.0,
            feedback: 0.34,
            motion: 0.0,
            history_len: 0,
        }
    }

    #[test]
    fn test_cues_before_arming_are_dropped() {
        let mut out = AudioOut::new(Recorder::default(), &full_volume());
        out.play(Cue::Tap);
        out.accent(3);
        out.update_music(1000.0, frame(72.0));
        assert!(out.engine().calls.is_empty());

        out.arm();
        out.arm();
        assert_eq!(out.engine().resumed, 1);
        // Nothing from before arming was queued
        assert!(out.engine().calls.is_empty());

        out.play(Cue::Tap);
        let calls = &out.engine().calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "blip");
        assert_eq!(calls[0].1, 220.0);
        assert!((calls[0].2.amp - 0.28).abs() < 1e-6);
    }

    #[test]
    fn test_volume_scales_amplitude() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            ..Settings::default()
        };
        let mut out = AudioOut::new(Recorder::default(), &settings);
        out.arm();
        out.play(Cue::Ping);
        assert!((out.engine().calls[0].2.amp - 0.30 * 0.25).abs() < 1e-6);

        out.apply_settings(&Settings {
            master_volume: 0.0,
            ..Settings::default()
        });
        out.play(Cue::Ping);
        assert_eq!(out.engine().calls.len(), 1);
    }

    #[test]
    fn test_cue_table_layers() {
        let denied = cue_voices(Cue::Denied);
        assert_eq!(denied.len(), 2);
        assert_eq!(denied[0].kind, VoiceKind::Blip);
        assert_eq!(denied[1].kind, VoiceKind::Noise);
        assert_eq!(cue_voices(Cue::ZoomTick { out: true })[0].freq, 300.0);
        assert_eq!(cue_voices(Cue::ZoomTick { out: false })[0].freq, 520.0);
        assert_eq!(cue_voices(Cue::TypeTick { index: 4 })[0].freq, 468.0);
        assert_eq!(cue_voices(Cue::TypeTick { index: 9 })[0].freq, 420.0);
    }

    #[test]
    fn test_scale_and_pitch() {
        assert_eq!(midi_to_freq(69), 440.0);
        assert!((midi_to_freq(57) - 220.0).abs() < 1e-3);
        assert_eq!(scale_note(57, 0), 57);
        assert_eq!(scale_note(57, 4), 64);
        assert_eq!(scale_note(57, 7), 69);
        assert_eq!(scale_note(57, 9), 72);
        assert_eq!(music_root(0), 57);
        assert_eq!(music_root(1), 59);
        assert_eq!(music_root(5), 61);
        assert_eq!(music_root(6), 57);
    }

    #[test]
    fn test_sequencer_steps_at_tempo() {
        // 75 bpm -> 200 ms per sixteenth
        assert!((MusicSequencer::step_ms(75.0) - 200.0).abs() < 1e-3);

        let mut seq = MusicSequencer::new();
        assert!(seq.advance(199.0, 75.0, 0, 0.0, 650.0).is_empty());

        // Step 1: rest on the lead, hat only
        let voices = seq.advance(1.0, 75.0, 0, 0.0, 650.0);
        assert_eq!(seq.step(), 1);
        assert_eq!(voices.iter().map(|v| v.kind).collect::<Vec<_>>(), vec![VoiceKind::Hat]);

        // Steps 2..=4; step 4 has lead and bass
        let voices = seq.advance(600.0, 75.0, 0, 1.0, 650.0);
        assert_eq!(seq.step(), 4);
        let bass: Vec<_> = voices.iter().filter(|v| v.kind == VoiceKind::Bass).collect();
        assert_eq!(bass.len(), 1);
        assert_eq!(bass[0].freq, midi_to_freq(45));
        let lead = voices.iter().filter(|v| v.kind == VoiceKind::Lead).last().unwrap();
        assert_eq!(lead.freq, midi_to_freq(scale_note(57, 5)));
        assert!((lead.env.amp - 0.20).abs() < 1e-6);
    }

    #[test]
    fn test_sequencer_wraps_after_sixteen_steps() {
        let mut seq = MusicSequencer::new();
        seq.advance(MusicSequencer::step_ms(90.0) * 16.0 + 0.5, 90.0, 0, 0.0, 650.0);
        assert_eq!(seq.step(), 0);
    }

    #[test]
    fn test_music_respects_toggle_and_shapes_bus() {
        let mut out = AudioOut::new(Recorder::default(), &full_volume());
        out.arm();
        out.update_music(250.0, frame(72.0));
        assert_eq!(out.engine().shaped, Some((650.0, 0.34)));
        assert!(out.engine().calls.iter().all(|c| ["lead", "bass", "hat"].contains(&c.0.as_str())));
        assert!(!out.engine().calls.is_empty());

        let mut quiet = AudioOut::new(
            Recorder::default(),
            &Settings {
                music_on: false,
                ..full_volume()
            },
        );
        quiet.arm();
        quiet.update_music(1000.0, frame(72.0));
        quiet.accent(2);
        assert!(quiet.engine().calls.is_empty());
    }

    #[test]
    fn test_accent_degree_maps_to_lead() {
        let v = accent_voice(9);
        assert_eq!(v.kind, VoiceKind::Lead);
        assert_eq!(v.freq, midi_to_freq(72));
    }
}
