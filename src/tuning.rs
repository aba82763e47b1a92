//! Data-driven engine constants
//!
//! Defaults reproduce the shipped experience. A host may override any field
//! from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on hidden stations (ids are `u16`, and placement is quadratic)
pub const MAX_HIDDEN_STATIONS: u32 = 64;

/// Tuning rejected at load time
#[derive(Debug, Error)]
pub enum TuningError {
    /// Input was not valid tuning JSON
    #[error("malformed tuning json: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A radius or distance was zero, negative or NaN
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    /// A probability outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    Probability { field: &'static str, value: f32 },

    #[error("placement_attempts must be at least 1")]
    NoAttempts,

    #[error("unique_draws must be at least 1")]
    NoDraws,

    #[error("hidden_count {0} exceeds the cap of {MAX_HIDDEN_STATIONS}")]
    TooManyHidden(u32),
}

/// Engine tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Stations ===
    /// Distance within which a station can be interacted with
    pub interact_radius: f32,
    /// Reveal radius of hidden stations, as a multiple of the interact radius
    pub reveal_radius_mult: f32,
    pub hidden_count: u32,

    // === Placement ===
    /// Minimum distance between core stations
    pub core_min_dist: f32,
    /// Minimum distance between a core station and the spawn point
    pub spawn_avoid_dist: f32,
    /// Hidden stations use `core_min_dist` scaled by this
    pub hidden_min_dist_factor: f32,
    /// Hidden stations use `spawn_avoid_dist` scaled by this
    pub hidden_avoid_factor: f32,
    pub placement_attempts: u32,

    // === Content ===
    /// Draws per unique-line pick before a repeat is accepted
    pub unique_draws: u32,
    pub connector_chance: f32,
    pub glitch_chance: f32,
    /// First bonus mutation line on signal gain
    pub mutation_chance: f32,
    /// Second, independent bonus mutation line
    pub mutation_chance_extra: f32,

    // === Player ===
    /// World units per tick
    pub player_speed: f32,

    // === Typewriter ===
    pub type_delay_ms: f32,
    pub cursor_blink_ticks: u32,

    /// Fixed run seed; restarts reuse it
    pub pinned_seed: Option<u32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            interact_radius: 92.0,
            reveal_radius_mult: 2.8,
            hidden_count: 10,

            core_min_dist: 310.0,
            spawn_avoid_dist: 460.0,
            hidden_min_dist_factor: 0.72,
            hidden_avoid_factor: 0.28,
            placement_attempts: 260,

            unique_draws: 10,
            connector_chance: 0.45,
            glitch_chance: 0.25,
            mutation_chance: 0.45,
            mutation_chance_extra: 0.22,

            player_speed: 2.7,

            type_delay_ms: 120.0,
            cursor_blink_ticks: 26,

            pinned_seed: None,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn with_pinned_seed(mut self, seed: u32) -> Self {
        self.pinned_seed = Some(seed);
        self
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("interact_radius", self.interact_radius),
            ("reveal_radius_mult", self.reveal_radius_mult),
            ("core_min_dist", self.core_min_dist),
            ("spawn_avoid_dist", self.spawn_avoid_dist),
            ("hidden_min_dist_factor", self.hidden_min_dist_factor),
            ("hidden_avoid_factor", self.hidden_avoid_factor),
            ("player_speed", self.player_speed),
            ("type_delay_ms", self.type_delay_ms),
        ];
        for (field, value) in positive {
            // NaN fails this comparison too
            if !(value > 0.0) {
                return Err(TuningError::NonPositive { field, value });
            }
        }

        let probabilities = [
            ("connector_chance", self.connector_chance),
            ("glitch_chance", self.glitch_chance),
            ("mutation_chance", self.mutation_chance),
            ("mutation_chance_extra", self.mutation_chance_extra),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::Probability { field, value });
            }
        }

        if self.placement_attempts == 0 {
            return Err(TuningError::NoAttempts);
        }
        if self.unique_draws == 0 {
            return Err(TuningError::NoDraws);
        }
        if self.hidden_count > MAX_HIDDEN_STATIONS {
            return Err(TuningError::TooManyHidden(self.hidden_count));
        }
        Ok(())
    }

    /// Reveal radius of hidden stations in world units
    pub fn reveal_radius(&self) -> f32 {
        self.interact_radius * self.reveal_radius_mult
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let t = Tuning::default();
        assert!(t.validate().is_ok());
        assert!((t.reveal_radius() - 257.6).abs() < 1e-3);
        assert!(t.mutation_chance > t.mutation_chance_extra);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "hidden_count": 3, "pinned_seed": 12345 }"#).unwrap();
        assert_eq!(t.hidden_count, 3);
        assert_eq!(t.pinned_seed, Some(12345));
        assert_eq!(t.placement_attempts, 260);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Tuning::from_json(r#"{ "glitch_chance": 1.5 }"#),
            Err(TuningError::Probability { field: "glitch_chance", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "interact_radius": 0 }"#),
            Err(TuningError::NonPositive { field: "interact_radius", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "placement_attempts": 0 }"#),
            Err(TuningError::NoAttempts)
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "hidden_count": 500 }"#),
            Err(TuningError::TooManyHidden(500))
        ));
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Malformed(_))));
    }
}
