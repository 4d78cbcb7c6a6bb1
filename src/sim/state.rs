//! Core simulation types: bodies, the active body set, phases and events

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{BodyHandle, PhysicsAdapter};
use crate::tiers::TIERS;
use crate::tuning::Tuning;

/// Whole-game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to enter a name
    AwaitingName,
    /// Active gameplay
    Playing,
    /// Run ended; waiting for restart
    GameOver,
}

/// A live clown in the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub handle: BodyHandle,
    /// Tier rank
    pub tier: usize,
    /// Cleared once this body has been claimed by a merge
    pub can_merge: bool,
    /// Consecutive ticks spent stagnant above the danger line
    pub danger_timer: u32,
}

impl Body {
    pub fn new(handle: BodyHandle, tier: usize) -> Self {
        Self {
            handle,
            tier,
            can_merge: true,
            danger_timer: 0,
        }
    }
}

/// Every body currently simulated.
///
/// Bodies enter and leave together with their physics handle, so the set
/// never holds a dangling handle.
#[derive(Debug, Clone, Default)]
pub struct ActiveBodies {
    /// Sorted by handle for stable iteration
    bodies: Vec<Body>,
}

impl ActiveBodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a physics body for `tier` and track it.
    ///
    /// `tier` must be a valid rank.
    pub fn spawn<P: PhysicsAdapter>(
        &mut self,
        physics: &mut P,
        tuning: &Tuning,
        tier: usize,
        pos: Vec2,
        vel: Vec2,
    ) -> BodyHandle {
        let radius = tuning.hitbox_radius(&TIERS[tier]);
        let handle = physics.create_circular_body(pos, radius, tuning.material);
        if vel != Vec2::ZERO {
            physics.set_velocity(handle, vel);
        }
        let idx = self
            .bodies
            .binary_search_by_key(&handle, |b| b.handle)
            .unwrap_or_else(|i| i);
        self.bodies.insert(idx, Body::new(handle, tier));
        handle
    }

    /// Stop tracking a body and destroy its physics handle
    pub fn remove<P: PhysicsAdapter>(&mut self, physics: &mut P, handle: BodyHandle) -> Option<Body> {
        let idx = self.index_of(handle)?;
        physics.remove_body(handle);
        Some(self.bodies.remove(idx))
    }

    /// Destroy every body
    pub fn clear<P: PhysicsAdapter>(&mut self, physics: &mut P) {
        for body in self.bodies.drain(..) {
            physics.remove_body(body.handle);
        }
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |b| b.handle).ok()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.index_of(handle).map(|i| &mut self.bodies[i])
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index_of(handle).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of live bodies of a tier
    pub fn count_tier(&self, tier: usize) -> usize {
        self.bodies.iter().filter(|b| b.tier == tier).count()
    }

    /// Largest tier on the board
    pub fn highest_tier(&self) -> Option<usize> {
        self.bodies.iter().map(|b| b.tier).max()
    }
}

/// Observable things that happened during a tick, drained by the UI
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A named session entered Playing
    Started { player: String },
    /// A new aimable preview appeared
    PreviewSpawned { tier: usize },
    /// The tier that will follow the current drop
    NextTier { tier: usize },
    Dropped { tier: usize, x: f32 },
    /// Two clowns fused into `tier`
    Merged { tier: usize, at: Vec2, points: u64 },
    ScoreChanged { score: u64, best: u64 },
    GameOver { score: u64 },
    Restarted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ArcadeWorld;

    #[test]
    fn test_remove_destroys_physics_handle() {
        let tuning = Tuning::default();
        let mut physics = ArcadeWorld::new(tuning.play_area, 0.0);
        let mut bodies = ActiveBodies::new();

        let h = bodies.spawn(&mut physics, &tuning, 2, Vec2::new(100.0, 300.0), Vec2::ZERO);
        assert!(physics.contains(h));
        assert_eq!(bodies.get(h).map(|b| b.tier), Some(2));

        let removed = bodies.remove(&mut physics, h).unwrap();
        assert_eq!(removed.handle, h);
        assert!(!physics.contains(h));
        assert!(bodies.remove(&mut physics, h).is_none());
    }

    #[test]
    fn test_spawn_applies_velocity_and_radius() {
        let tuning = Tuning::default();
        let mut physics = ArcadeWorld::new(tuning.play_area, 0.0);
        let mut bodies = ActiveBodies::new();

        let h = bodies.spawn(&mut physics, &tuning, 1, Vec2::new(100.0, 300.0), Vec2::new(0.0, -100.0));
        assert_eq!(physics.velocity(h), Some(Vec2::new(0.0, -100.0)));
        assert_eq!(physics.radius(h), Some(17.5));
    }

    #[test]
    fn test_clear_empties_both_sides() {
        let tuning = Tuning::default();
        let mut physics = ArcadeWorld::new(tuning.play_area, 0.0);
        let mut bodies = ActiveBodies::new();
        for i in 0..4 {
            bodies.spawn(&mut physics, &tuning, i, Vec2::new(60.0 + 60.0 * i as f32, 300.0), Vec2::ZERO);
        }
        assert_eq!(bodies.highest_tier(), Some(3));

        bodies.clear(&mut physics);
        assert!(bodies.is_empty());
        assert!(physics.is_empty());
    }
}
