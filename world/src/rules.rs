//! Tunable match rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scoring, pacing and layout constants applied by the world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Lives granted at match start.
    pub lives: u32,
    /// Levels that must be cleared to win an arcade match.
    pub levels: u32,
    /// Score interval that awards an extra life.
    pub extra_life_every: u32,
    /// Points for a regular pellet.
    pub pellet_points: u32,
    /// Points for a power item.
    pub power_points: u32,
    /// Points for capturing a pursuer.
    pub capture_points: u32,
    /// Lifetime of a power effect in milliseconds.
    pub effect_duration_ms: u64,
    /// Minimum time between two teleports of the same entity in milliseconds.
    pub portal_cooldown_ms: u64,
    /// Wall cells converted into toggling doors.
    pub door_count: usize,
    /// Shortest door toggle interval in milliseconds.
    pub door_interval_min_ms: u64,
    /// Longest door toggle interval in milliseconds.
    pub door_interval_max_ms: u64,
    /// Fewest power items placed per level.
    pub power_items_min: u32,
    /// Most power items placed per level.
    pub power_items_max: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            lives: 3,
            levels: 3,
            extra_life_every: 10_000,
            pellet_points: 10,
            power_points: 50,
            capture_points: 200,
            effect_duration_ms: 10_000,
            portal_cooldown_ms: 500,
            door_count: 6,
            door_interval_min_ms: 2_000,
            door_interval_max_ms: 5_000,
            power_items_min: 3,
            power_items_max: 10,
        }
    }
}

impl Rules {
    /// Lifetime of a power effect.
    #[must_use]
    pub const fn effect_duration(&self) -> Duration {
        Duration::from_millis(self.effect_duration_ms)
    }

    /// Minimum time between two teleports of the same entity.
    #[must_use]
    pub const fn portal_cooldown(&self) -> Duration {
        Duration::from_millis(self.portal_cooldown_ms)
    }
}
