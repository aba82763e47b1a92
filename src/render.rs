//! Renderer hand-off
//!
//! The engine never draws. Once per frame the host hands the parameter vector
//! and canvas size to a [`Renderer`], plus a screen-space [`SceneView`] of
//! the things a 2D overlay would draw. Renderers ignore names they don't know.

use glam::Vec2;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::CanvasSize;
use crate::sim::glyph::{FocusCard, GLYPH_BASE_RADIUS, WORLD_GLYPH_POINTS, glyph_points};
use crate::sim::params::world_to_screen;
use crate::sim::{Display, ParameterVector, RunSession, StationId, StationKind};

/// Render backend
pub trait Renderer {
    fn render(&mut self, params: &ParameterVector, canvas: CanvasSize);

    /// Overlay geometry; renderers without an overlay skip it
    fn draw_scene(&mut self, _scene: &SceneView) {}
}

/// Renderer that draws nothing (headless host)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _params: &ParameterVector, _canvas: CanvasSize) {}
}

/// One station as seen on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationView {
    pub id: StationId,
    pub label: &'static str,
    pub pos: Vec2,
    pub in_range: bool,
    /// Glyph outline for hidden stations, empty for core objects
    pub glyph: Vec<Vec2>,
}

/// Screen-space overlay for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneView {
    pub player: Vec2,
    /// Revealed stations only
    pub stations: Vec<StationView>,
    /// Player-to-exit guide line and its opacity
    pub trail: Option<(Vec2, Vec2, f32)>,
    pub compass: Option<Vec2>,
    pub focus_card: Option<FocusCard>,
    pub display: Display,
}

impl SceneView {
    pub fn build(session: &RunSession, canvas: CanvasSize, display: &Display, card: Option<&FocusCard>) -> Self {
        let to_screen = |p: Vec2| world_to_screen(p, session.camera, canvas);
        let near = session.in_range();

        let stations = session
            .stations
            .iter()
            .filter(|s| s.revealed)
            .map(|s| {
                let pos = to_screen(s.pos);
                let glyph = if s.kind() == StationKind::Hidden {
                    glyph_points(s.glyph_seed, WORLD_GLYPH_POINTS, GLYPH_BASE_RADIUS)
                        .into_iter()
                        .map(|p| pos + p)
                        .collect()
                } else {
                    Vec::new()
                };
                StationView {
                    id: s.id,
                    label: s.label(),
                    pos,
                    in_range: near == Some(s.id),
                    glyph,
                }
            })
            .collect();

        let player = to_screen(session.player);
        let trail = session.exit().filter(|_| session.door_trail.ticks > 0).map(|exit| {
            let alpha = session.door_trail.ticks as f32 / session.door_trail.max_ticks.max(1) as f32;
            (player, to_screen(exit.pos), alpha.min(1.0))
        });
        let compass = display
            .compass
            .and_then(|id| session.station(id))
            .map(|s| to_screen(s.pos));

        Self {
            player,
            stations,
            trail,
            compass,
            focus_card: card.cloned(),
            display: display.clone(),
        }
    }
}

/// Named uniforms as one JSON object
pub fn uniforms_json(params: &ParameterVector) -> Value {
    let map: Map<String, Value> = params
        .uniforms()
        .into_iter()
        .filter_map(|(name, value)| serde_json::to_value(value).ok().map(|v| (name.to_string(), v)))
        .collect();
    Value::Object(map)
}

/// Payload handed to a page-side renderer
pub fn frame_payload(params: &ParameterVector, canvas: CanvasSize, scene: Option<&SceneView>) -> Value {
    let mut payload = json!({
        "canvas": canvas,
        "uniforms": uniforms_json(params),
    });
    if let (Some(scene), Some(obj)) = (scene, payload.as_object_mut()) {
        if let Ok(v) = serde_json::to_value(scene) {
            obj.insert("scene".to_string(), v);
        }
    }
    payload
}

#[cfg(target_arch = "wasm32")]
pub use web::JsBridgeRenderer;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::{JsCast, JsValue};

    use super::{Renderer, SceneView, frame_payload};
    use crate::CanvasSize;
    use crate::sim::ParameterVector;

    /// Name of the page-provided hook
    const HOOK: &str = "loopLeaksRender";

    /// Sends each frame as a JSON string to `window.loopLeaksRender`
    #[derive(Default)]
    pub struct JsBridgeRenderer {
        scene: Option<SceneView>,
        warned: bool,
    }

    impl JsBridgeRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        fn hook(&mut self) -> Option<js_sys::Function> {
            let window = web_sys::window()?;
            let hook = js_sys::Reflect::get(&window, &JsValue::from_str(HOOK)).ok()?;
            let hook = hook.dyn_into::<js_sys::Function>().ok();
            if hook.is_none() && !self.warned {
                log::warn!("window.{HOOK} is not a function - frames dropped");
                self.warned = true;
            }
            hook
        }
    }

    impl Renderer for JsBridgeRenderer {
        fn draw_scene(&mut self, scene: &SceneView) {
            self.scene = Some(scene.clone());
        }

        fn render(&mut self, params: &ParameterVector, canvas: CanvasSize) {
            let Some(hook) = self.hook() else { return };
            let payload = frame_payload(params, canvas, self.scene.take().as_ref());
            hook.call1(&JsValue::NULL, &JsValue::from_str(&payload.to_string())).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::params::{AnimationProfile, map_parameters};
    use crate::sim::{CoreObject, Engine, SeedSource, TickInput};
    use crate::tuning::Tuning;

    fn engine() -> Engine {
        Engine::new(Tuning::default(), SeedSource::pinned(77), CanvasSize::default())
    }

    #[test]
    fn test_uniforms_json_names_every_uniform() {
        let e = engine();
        let params = map_parameters(e.session(), e.canvas(), 92.0, &AnimationProfile::default());
        let json = uniforms_json(&params);
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), params.uniforms().len());
        assert_eq!(obj["u_zoom"].as_f64().unwrap() as f32, params.zoom);
        assert_eq!(obj["u_center"].as_array().unwrap().len(), 2);
        assert_eq!(obj["u_objStrength"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_payload_carries_canvas_and_optional_scene() {
        let mut e = engine();
        let frame = e.tick(&TickInput::default(), crate::consts::SIM_DT);
        let bare = frame_payload(&frame.params, e.canvas(), None);
        assert_eq!(bare["canvas"]["width"], 960);
        assert!(bare.get("scene").is_none());

        let scene = SceneView::build(e.session(), e.canvas(), &frame.display, None);
        let full = frame_payload(&frame.params, e.canvas(), Some(&scene));
        assert!(full["scene"]["stations"].is_array());
    }

    #[test]
    fn test_scene_lists_revealed_stations_only() {
        let mut e = engine();
        let frame = e.tick(&TickInput::default(), crate::consts::SIM_DT);
        let scene = SceneView::build(e.session(), e.canvas(), &frame.display, None);
        let revealed = e.session().stations.iter().filter(|s| s.revealed).count();
        assert_eq!(scene.stations.len(), revealed);
        assert!(scene.stations.iter().any(|s| s.id == StationId::Core(CoreObject::Door)));
        assert!(scene.trail.is_none());
    }

    #[test]
    fn test_hidden_station_carries_glyph() {
        let mut e = engine();
        let hidden = StationId::Hidden(0);
        let frame = e.tick(
            &TickInput {
                warp_to: Some(hidden),
                ..Default::default()
            },
            crate::consts::SIM_DT,
        );
        let scene = SceneView::build(e.session(), e.canvas(), &frame.display, None);
        let view = scene.stations.iter().find(|s| s.id == hidden).unwrap();
        assert_eq!(view.glyph.len(), WORLD_GLYPH_POINTS);
        assert!(view.in_range);
    }
}
