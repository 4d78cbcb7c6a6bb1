//! Clown tier progression
//!
//! Tiers are ordered by rank: two clowns of the same rank fuse into one clown
//! of the next rank. The top tier never merges.

use serde::Serialize;

/// One rank in the size/score progression
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tier {
    /// 0-based rank, equal to the index in [`TIERS`]
    pub rank: usize,
    pub name: &'static str,
    /// Visual diameter in world units
    pub size: f32,
    /// Points awarded when two clowns of the previous rank fuse into this one
    pub score_value: u64,
    /// Default multiplier on `size / 2` giving the collision radius
    pub hitbox_scale: f32,
}

impl Tier {
    const fn new(rank: usize, name: &'static str, size: f32, score_value: u64) -> Self {
        Self {
            rank,
            name,
            size,
            score_value,
            hitbox_scale: 1.0,
        }
    }

    /// Visual radius (used for the danger check and the aim clamp)
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    /// Whether two clowns of this tier can still fuse
    #[inline]
    pub fn can_merge(&self) -> bool {
        self.rank + 1 < TIERS.len()
    }

    /// The tier produced by fusing two clowns of this tier
    pub fn next(&self) -> Option<&'static Tier> {
        TIERS.get(self.rank + 1)
    }
}

/// The full tier table, smallest first
pub const TIERS: [Tier; 11] = [
    Tier::new(0, "Tessa", 30.0, 1),
    Tier::new(1, "Twinkles", 35.0, 3),
    Tier::new(2, "Reina", 40.0, 6),
    Tier::new(3, "Osvaldo", 45.0, 10),
    Tier::new(4, "Hazel", 50.0, 15),
    Tier::new(5, "Mumbles", 55.0, 21),
    Tier::new(6, "Sneaky", 60.0, 28),
    Tier::new(7, "Wendy", 65.0, 36),
    Tier::new(8, "Chatty", 70.0, 45),
    Tier::new(9, "Cups", 75.0, 55),
    Tier::new(10, "Kirk", 80.0, 66),
];

/// Rank of the largest clown
pub const TOP_TIER: usize = TIERS.len() - 1;

/// Look up a tier by rank
#[inline]
pub fn tier(rank: usize) -> Option<&'static Tier> {
    TIERS.get(rank)
}
