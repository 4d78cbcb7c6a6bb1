//! Data-driven game balance
//!
//! Every gameplay constant that is a matter of feel rather than rules lives
//! here. Overrides are read from durable storage as JSON; missing keys fall
//! back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::consts::TUNING_KEY;
use crate::persistence::KeyValueStore;
use crate::tiers::{TOP_TIER, Tier};

/// Which velocity measure counts as "stagnant" near the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StagnationMetric {
    /// `|vy|` only
    #[default]
    VerticalSpeed,
    /// Full velocity magnitude
    Speed,
}

/// Play area bounds (world units, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayArea {
    /// Inner surface of the left wall
    pub left: f32,
    /// Inner surface of the right wall
    pub right: f32,
    /// Top surface of the floor
    pub floor: f32,
}

impl PlayArea {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

impl Default for PlayArea {
    fn default() -> Self {
        // 450x650 container, 20 padding, 15 thick walls
        Self {
            left: 35.0,
            right: 415.0,
            floor: 615.0,
        }
    }
}

/// Physical material shared by every clown body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Bounciness (0 = dead stop, 1 = perfectly elastic)
    pub restitution: f32,
    /// Tangential velocity kept per contact is `1 - friction`
    pub friction: f32,
    /// Linear damping per second
    pub damping: f32,
    /// Speed clamp (world units/s)
    pub max_speed: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            friction: 0.5,
            damping: 0.3,
            max_speed: 1500.0,
        }
    }
}

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub play_area: PlayArea,
    /// Downward acceleration (world units/s²)
    pub gravity: f32,
    pub material: Material,

    // === Spawning ===
    /// Highest tier that can ever be dropped
    pub max_spawn_tier: usize,
    /// Y of the aimed preview
    pub preview_y: f32,
    /// Y where dropped clowns enter the simulation
    pub spawn_y: f32,
    /// Gap kept between the preview and the walls
    pub aim_margin: f32,
    /// Delay after a drop before the next one is accepted
    pub drop_cooldown_ms: u32,

    // === Merging ===
    /// Upward speed given to a freshly fused clown
    pub merge_pop_speed: f32,
    /// Reject pairs whose centers are farther apart than `size * contact_guard_factor`
    pub contact_guard: bool,
    pub contact_guard_factor: f32,
    /// Per-tier hitbox scale overrides (index = rank)
    pub hitbox_scales: Vec<f32>,

    // === Danger ===
    /// Clowns whose top edge is above this line may end the game
    pub danger_line_y: f32,
    pub stagnation_metric: StagnationMetric,
    /// Below this speed a clown counts as stagnant
    pub stagnation_threshold: f32,
    /// Consecutive stagnant ticks tolerated before game over
    pub loss_tick_threshold: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            play_area: PlayArea::default(),
            gravity: 1000.0,
            material: Material::default(),

            max_spawn_tier: 4,
            preview_y: 70.0,
            spawn_y: 90.0,
            aim_margin: 5.0,
            drop_cooldown_ms: 500,

            merge_pop_speed: 100.0,
            contact_guard: false,
            contact_guard_factor: 1.2,
            hitbox_scales: Vec::new(),

            danger_line_y: 90.0,
            stagnation_metric: StagnationMetric::VerticalSpeed,
            stagnation_threshold: 15.0,
            loss_tick_threshold: 120,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Pull out-of-range values back to the nearest usable one
    pub fn validated(mut self) -> Self {
        if self.max_spawn_tier > TOP_TIER {
            log::warn!(
                "max_spawn_tier {} exceeds the top tier, clamping to {}",
                self.max_spawn_tier,
                TOP_TIER
            );
            self.max_spawn_tier = TOP_TIER;
        }
        self
    }

    /// Load tuning overrides from storage, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(TUNING_KEY) else {
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring malformed tuning overrides: {}", e);
                Self::default()
            }
        }
    }

    /// Collision radius for a tier
    pub fn hitbox_radius(&self, tier: &Tier) -> f32 {
        let scale = self
            .hitbox_scales
            .get(tier.rank)
            .copied()
            .unwrap_or(tier.hitbox_scale);
        tier.radius() * scale
    }

    /// Horizontal range the preview of a tier may occupy
    pub fn aim_range(&self, tier: &Tier) -> (f32, f32) {
        let min = self.play_area.left + tier.radius() + self.aim_margin;
        let max = self.play_area.right - tier.radius() - self.aim_margin;
        (min, max.max(min))
    }
}
