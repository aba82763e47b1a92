//! Hidden-station glyphs and the focus-card cache
//!
//! A hidden station stores only its glyph seed. Its shape and its detail view
//! are re-derived on demand; the detail view is memoized per canvas size.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;
use serde::Serialize;

use super::rng::SeededStream;
use super::station::CoreObject;
use crate::CanvasSize;

/// Glyph radius at reference scale
pub const GLYPH_BASE_RADIUS: f32 = 22.0;
/// Vertices of the glyph on the world map
pub const WORLD_GLYPH_POINTS: usize = 8;
/// Vertices of the glyph on the focus card
pub const CARD_GLYPH_POINTS: usize = 10;

/// Closed polygon around the origin, fully determined by the seed
pub fn glyph_points(seed: u32, count: usize, base_radius: f32) -> Vec<Vec2> {
    let mut stream = SeededStream::new(seed);
    (0..count)
        .map(|i| {
            let ang = i as f32 / count as f32 * TAU + stream.range(0.0, 0.35);
            let r = base_radius * (0.75 + stream.range(0.0, 0.75));
            Vec2::new(ang.cos(), ang.sin()) * r
        })
        .collect()
}

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Layout of a hidden station's detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusCard {
    pub title: &'static str,
    pub caption: &'static str,
    pub footer: &'static str,
    pub panel: Rect,
    pub sprite: CoreObject,
    pub sprite_box: Rect,
    pub glyph_center: Vec2,
    pub glyph_ring_radius: f32,
    /// Glyph polygon in canvas pixels
    pub glyph: Vec<Vec2>,
}

impl FocusCard {
    pub fn build(glyph_seed: u32, sprite: CoreObject, canvas: CanvasSize) -> Self {
        let (w, h) = (canvas.width as f32, canvas.height as f32);
        let s = (h / 540.0).max(0.5);
        let pad = 28.0 * s;
        let box_size = 240.0 * s;
        let glyph_center = Vec2::new(w * 0.5, h * 0.78);
        let glyph = glyph_points(glyph_seed, CARD_GLYPH_POINTS, GLYPH_BASE_RADIUS * s)
            .into_iter()
            .map(|p| glyph_center + p * 3.0)
            .collect();

        Self {
            title: "SIG NODE",
            caption: "A withheld word from the machine layer.",
            footer: "SIGNAL deepens the poem and strengthens door guidance.",
            panel: Rect { x: pad, y: pad, w: w - pad * 2.0, h: h - pad * 2.0 },
            sprite,
            sprite_box: Rect {
                x: w * 0.5 - box_size * 0.5,
                y: h * 0.5 - box_size * 0.5,
                w: box_size,
                h: box_size,
            },
            glyph_center,
            glyph_ring_radius: 100.0 * s,
            glyph,
        }
    }
}

type CardKey = (u32, CoreObject, CanvasSize);

/// Memoized focus cards
///
/// Keyed by glyph seed, sprite and canvas size. Any canvas change drops every
/// entry at once; there is no partial invalidation.
#[derive(Debug, Default)]
pub struct FocusCardCache {
    canvas: Option<CanvasSize>,
    cards: HashMap<CardKey, FocusCard>,
}

impl FocusCardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        if self.canvas != Some(canvas) {
            if !self.cards.is_empty() {
                log::debug!("canvas now {}x{}, dropping {} focus cards", canvas.width, canvas.height, self.cards.len());
            }
            self.cards.clear();
            self.canvas = Some(canvas);
        }
    }

    pub fn get(&mut self, glyph_seed: u32, sprite: CoreObject, canvas: CanvasSize) -> &FocusCard {
        self.set_canvas(canvas);
        self.cards
            .entry((glyph_seed, sprite, canvas))
            .or_insert_with(|| FocusCard::build(glyph_seed, sprite, canvas))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
