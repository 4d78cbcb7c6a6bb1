//! Physics adapter contract
//!
//! The simulation never talks to a physics engine directly. Backends expose
//! circular dynamic bodies behind opaque handles and report the start of
//! every contact as a neutral [`CollisionEvent`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Material;

/// Opaque handle to a body owned by a physics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Two bodies started touching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl CollisionEvent {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }
}

/// Capabilities the simulation requires from a physics backend.
///
/// Reads and writes on a handle that is no longer live are no-ops
/// (`None` / `false`), never panics.
pub trait PhysicsAdapter {
    /// Create a circular dynamic body
    fn create_circular_body(&mut self, pos: Vec2, radius: f32, material: Material) -> BodyHandle;

    /// Destroy a body; returns false if the handle was not live
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Overwrite a body's velocity; returns false if the handle was not live
    fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) -> bool;

    fn position(&self, handle: BodyHandle) -> Option<Vec2>;

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;

    fn contains(&self, handle: BodyHandle) -> bool {
        self.position(handle).is_some()
    }

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Move every collision-start notification gathered since the last call into `out`
    fn drain_collisions(&mut self, out: &mut Vec<CollisionEvent>);
}
