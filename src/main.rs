//! Loop Leaks entry point
//!
//! Browser: wires DOM events into the host and runs the frame loop.
//! Native: headless scripted walk through one room, logging the poem.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, WheelEvent};

    use loop_leaks::audio::WebAudio;
    use loop_leaks::render::JsBridgeRenderer;
    use loop_leaks::sim::{Direction, InputEvent, SeedSource};
    use loop_leaks::settings::Toggle;
    use loop_leaks::speech::WebSpeech;
    use loop_leaks::{CanvasSize, Host, Settings, Tuning};

    type WebHost = Host<WebAudio, WebSpeech, JsBridgeRenderer>;

    struct App {
        host: WebHost,
        canvas: HtmlCanvasElement,
        document: Document,
        last_time: f64,
    }

    impl App {
        fn canvas_size(&self) -> CanvasSize {
            CanvasSize::new(self.canvas.client_width().max(1) as u32, self.canvas.client_height().max(1) as u32)
        }

        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                loop_leaks::consts::SIM_DT
            };
            self.last_time = time;

            let size = self.canvas_size();
            if self.canvas.width() != size.width || self.canvas.height() != size.height {
                self.canvas.set_width(size.width);
                self.canvas.set_height(size.height);
            }
            self.host.resize(size);

            if self.host.frame(dt) > 0 {
                self.update_text();
            }
        }

        /// Prompt, mode and poem panels
        fn update_text(&self) {
            let Some(frame) = self.host.last_frame() else { return };
            let display = &frame.display;

            if let Some(el) = self.document.get_element_by_id("prompt") {
                el.set_text_content(Some(&display.prompt));
                let class = if display.urgent { "urgent" } else { "" };
                let _ = el.set_attribute("class", class);
            }
            if let Some(el) = self.document.get_element_by_id("mode") {
                el.set_text_content(Some(display.mode_label));
            }
            if let Some(el) = self.document.get_element_by_id("poem") {
                let text = match (&display.final_poem, display.final_hint) {
                    (Some(poem), Some(hint)) => format!("{poem}\n\n{hint}"),
                    (Some(poem), None) => poem.clone(),
                    _ => display.poem_text(),
                };
                el.set_text_content(Some(&text));
            }
        }
    }

    fn direction(key: &str) -> Option<Direction> {
        match key {
            "a" | "A" | "ArrowLeft" => Some(Direction::Left),
            "d" | "D" | "ArrowRight" => Some(Direction::Right),
            "w" | "W" | "ArrowUp" => Some(Direction::Up),
            "s" | "S" | "ArrowDown" => Some(Direction::Down),
            _ => None,
        }
    }

    fn action(key: &str) -> Option<InputEvent> {
        match key {
            "e" | "E" => Some(InputEvent::Interact),
            "q" | "Q" => Some(InputEvent::Ping),
            "Escape" => Some(InputEvent::Escape),
            "r" | "R" => Some(InputEvent::Restart),
            " " => Some(InputEvent::SpeakToggle),
            _ => None,
        }
    }

    /// Preference keys; changes are saved straight away
    fn setting_toggle(key: &str) -> Option<Toggle> {
        match key {
            "m" | "M" => Some(Toggle::Music),
            "v" | "V" => Some(Toggle::ReducedMotion),
            _ => None,
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialized".into());
        }

        log::info!("Loop Leaks starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let settings = Settings::load();
        let seeds = SeedSource::from_master(js_sys::Date::now() as u64);
        let size = CanvasSize::new(canvas.client_width().max(1) as u32, canvas.client_height().max(1) as u32);
        let host = Host::new(
            Tuning::default(),
            &settings,
            seeds,
            size,
            WebAudio::new(),
            WebSpeech::new(),
            JsBridgeRenderer::new(),
        );

        let app = Rc::new(RefCell::new(App {
            host,
            canvas: canvas.clone(),
            document,
            last_time: 0.0,
        }));

        setup_input_handlers(&canvas, app.clone());
        request_animation_frame(app);

        log::info!("Loop Leaks running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };

        // Key down: held directions and one-shot actions
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let mut a = app.borrow_mut();
                if let Some(toggle) = setting_toggle(&key) {
                    if !event.repeat() {
                        a.host.toggle_setting(toggle).save();
                    }
                } else if let Some(dir) = direction(&key) {
                    a.host.set_direction(dir, true);
                    event.prevent_default();
                } else if let Some(ev) = action(&key) {
                    if event.repeat() {
                        return;
                    }
                    a.host.push(ev);
                    event.prevent_default();
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(dir) = direction(&event.key()) {
                    app.borrow_mut().host.set_direction(dir, false);
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Wheel zooms the focus view
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                app.borrow_mut().host.push(InputEvent::Scroll(event.delta_y() as f32));
            });
            let _ = canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: drop held keys so the player doesn't keep walking
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().host.release_all();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().update(time);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_host::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    use loop_leaks::audio::NullAudio;
    use loop_leaks::consts::SIM_DT;
    use loop_leaks::render::NullRenderer;
    use loop_leaks::sim::{CoreObject, InputEvent, SeedSource, StationId, TickInput};
    use loop_leaks::speech::NoSpeech;
    use loop_leaks::{CanvasSize, Host, Settings, Tuning};

    type HeadlessHost = Host<NullAudio, NoSpeech, NullRenderer>;

    /// Idle ticks between scripted actions, enough for the typewriter
    const SETTLE_TICKS: u32 = 240;

    fn settle(host: &mut HeadlessHost) {
        for _ in 0..SETTLE_TICKS {
            host.frame(SIM_DT);
        }
    }

    fn visit(host: &mut HeadlessHost, id: StationId) {
        host.step(&TickInput {
            warp_to: Some(id),
            events: vec![InputEvent::Interact],
            ..Default::default()
        });
        settle(host);
    }

    fn close(host: &mut HeadlessHost) {
        host.step(&TickInput::event(InputEvent::Escape));
    }

    /// Lamp, one hidden node, desk, then the door; returns the sealed poem
    pub fn run(tuning: Tuning, seeds: SeedSource) -> Option<String> {
        let mut host = Host::new(
            tuning,
            &Settings::load(),
            seeds,
            CanvasSize::default(),
            NullAudio,
            NoSpeech,
            NullRenderer,
        );
        log::info!("{}", host.engine().session().title);
        settle(&mut host);

        for id in [
            StationId::Core(CoreObject::Lamp),
            StationId::Hidden(0),
            StationId::Core(CoreObject::Desk),
        ] {
            visit(&mut host, id);
            close(&mut host);
        }
        visit(&mut host, StationId::EXIT);
        host.step(&TickInput::event(InputEvent::Interact));

        let session = host.engine().session();
        for line in &session.transcript {
            log::info!("  {line}");
        }
        session.final_poem.clone()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use loop_leaks::Tuning;
    use loop_leaks::sim::SeedSource;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Loop Leaks (native) starting...");

    // Usage: loop-leaks [seed] [tuning.json]
    let mut args = std::env::args().skip(1);
    let seeds = match args.next().map(|s| s.parse::<u32>()) {
        Some(Ok(seed)) => SeedSource::pinned(seed),
        Some(Err(e)) => {
            log::error!("seed must be an unsigned integer: {e}");
            return std::process::ExitCode::FAILURE;
        }
        None => SeedSource::from_entropy(),
    };
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("bad tuning file {path}: {e}");
                return std::process::ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    match replay::run(tuning, seeds) {
        Some(poem) => {
            println!("{poem}");
            std::process::ExitCode::SUCCESS
        }
        None => {
            log::warn!("scripted walk ended without a sealed poem");
            std::process::ExitCode::FAILURE
        }
    }
}
