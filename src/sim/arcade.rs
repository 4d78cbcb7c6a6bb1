//! Built-in arcade physics backend
//!
//! A small impulse solver for circles in an open-topped box: gravity, two
//! walls and a floor, restitution, Coulomb friction and a speed clamp. Good
//! enough to stack clowns; not a general rigid-body engine.

use std::collections::HashSet;

use glam::Vec2;

use super::physics::{BodyHandle, CollisionEvent, PhysicsAdapter};
use crate::tuning::{Material, PlayArea};

/// Overlap (world units) within which two circles still count as touching
const CONTACT_SLOP: f32 = 0.5;
/// Solver passes per step (more passes = stiffer stacks)
const SOLVER_ITERATIONS: u32 = 4;

#[derive(Debug, Clone)]
struct ArcadeBody {
    handle: BodyHandle,
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    material: Material,
}

impl ArcadeBody {
    fn inv_mass(&self) -> f32 {
        1.0 / (self.radius * self.radius).max(f32::EPSILON)
    }
}

/// Arcade physics world
#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    area: PlayArea,
    gravity: f32,
    /// Sorted by handle
    bodies: Vec<ArcadeBody>,
    /// Pairs touching at the end of the previous step (lower handle first)
    touching: HashSet<(BodyHandle, BodyHandle)>,
    pending: Vec<CollisionEvent>,
    next_id: u32,
}

impl ArcadeWorld {
    pub fn new(area: PlayArea, gravity: f32) -> Self {
        Self {
            area,
            gravity,
            bodies: Vec::new(),
            touching: HashSet::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Collision radius of a live body
    pub fn radius(&self, handle: BodyHandle) -> Option<f32> {
        self.get(handle).map(|b| b.radius)
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |b| b.handle).ok()
    }

    fn get(&self, handle: BodyHandle) -> Option<&ArcadeBody> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    fn integrate(&mut self, dt: f32) {
        for body in &mut self.bodies {
            body.vel.y += self.gravity * dt;
            body.vel *= (1.0 - body.material.damping * dt).max(0.0);
            body.vel = body.vel.clamp_length_max(body.material.max_speed);
            body.pos += body.vel * dt;
        }
    }

    fn solve_walls(&mut self) {
        let area = self.area;
        for body in &mut self.bodies {
            let r = body.radius;
            if body.pos.x - r < area.left {
                body.pos.x = area.left + r;
                bounce_off_static(body, Vec2::X);
            }
            if body.pos.x + r > area.right {
                body.pos.x = area.right - r;
                bounce_off_static(body, Vec2::NEG_X);
            }
            if body.pos.y + r > area.floor {
                body.pos.y = area.floor - r;
                bounce_off_static(body, Vec2::NEG_Y);
            }
        }
    }

    /// Resolve circle-circle overlaps, collecting every touching pair
    fn solve_pairs(&mut self, touching: &mut HashSet<(BodyHandle, BodyHandle)>) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (left, right) = self.bodies.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];

                let delta = b.pos - a.pos;
                let dist = delta.length();
                let overlap = a.radius + b.radius - dist;
                if overlap < -CONTACT_SLOP {
                    continue;
                }
                touching.insert((a.handle, b.handle));
                if overlap <= 0.0 {
                    continue;
                }

                // Coincident centers: push straight apart vertically
                let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::Y };
                resolve_pair(a, b, normal, overlap);
            }
        }
    }
}

/// Reflect the normal velocity component off an immovable surface
fn bounce_off_static(body: &mut ArcadeBody, normal: Vec2) {
    let vn = body.vel.dot(normal);
    if vn >= 0.0 {
        return;
    }
    let jn = -(1.0 + body.material.restitution) * vn;
    body.vel += normal * jn;

    // Friction: oppose sliding, bounded by the normal impulse
    let tangent = Vec2::new(-normal.y, normal.x);
    let vt = body.vel.dot(tangent);
    let jt = (-vt).clamp(-body.material.friction * jn, body.material.friction * jn);
    body.vel += tangent * jt;
}

/// Positional correction plus normal and friction impulses for two circles
fn resolve_pair(a: &mut ArcadeBody, b: &mut ArcadeBody, normal: Vec2, overlap: f32) {
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;

    a.pos -= normal * overlap * (inv_a / inv_sum);
    b.pos += normal * overlap * (inv_b / inv_sum);

    let rel = b.vel - a.vel;
    let vn = rel.dot(normal);
    if vn >= 0.0 {
        return;
    }

    let restitution = a.material.restitution.min(b.material.restitution);
    let jn = -(1.0 + restitution) * vn / inv_sum;
    a.vel -= normal * jn * inv_a;
    b.vel += normal * jn * inv_b;

    let rel = b.vel - a.vel;
    let tangent = Vec2::new(-normal.y, normal.x);
    let vt = rel.dot(tangent);
    let mu = (a.material.friction * b.material.friction).sqrt();
    let jt = (-vt / inv_sum).clamp(-mu * jn, mu * jn);
    a.vel -= tangent * jt * inv_a;
    b.vel += tangent * jt * inv_b;
}

impl PhysicsAdapter for ArcadeWorld {
    fn create_circular_body(&mut self, pos: Vec2, radius: f32, material: Material) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        // Handles only grow, so pushing keeps the vector sorted
        self.bodies.push(ArcadeBody {
            handle,
            pos,
            vel: Vec2::ZERO,
            radius,
            material,
        });
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(i) = self.index_of(handle) else {
            return false;
        };
        self.bodies.remove(i);
        self.touching.retain(|&(a, b)| a != handle && b != handle);
        true
    }

    fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) -> bool {
        match self.index_of(handle) {
            Some(i) => {
                self.bodies[i].vel = vel;
                true
            }
            None => false,
        }
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.pos)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.vel)
    }

    fn step(&mut self, dt: f32) {
        self.integrate(dt);

        let mut touching = HashSet::new();
        for _ in 0..SOLVER_ITERATIONS {
            self.solve_pairs(&mut touching);
            self.solve_walls();
        }

        let mut started: Vec<_> = touching.difference(&self.touching).copied().collect();
        started.sort();
        self.pending
            .extend(started.into_iter().map(|(a, b)| CollisionEvent::new(a, b)));
        self.touching = touching;
    }

    fn drain_collisions(&mut self, out: &mut Vec<CollisionEvent>) {
        out.append(&mut self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn world() -> ArcadeWorld {
        ArcadeWorld::new(PlayArea::default(), 1000.0)
    }

    fn run(world: &mut ArcadeWorld, ticks: u32) -> Vec<CollisionEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            world.step(SIM_DT);
            world.drain_collisions(&mut events);
        }
        events
    }

    #[test]
    fn test_body_comes_to_rest_on_floor() {
        let mut world = world();
        let h = world.create_circular_body(Vec2::new(200.0, 90.0), 15.0, Material::default());
        run(&mut world, 300);

        let pos = world.position(h).unwrap();
        let vel = world.velocity(h).unwrap();
        assert!((pos.y - (615.0 - 15.0)).abs() < 1.0, "y = {}", pos.y);
        assert!(vel.y.abs() < 15.0, "vy = {}", vel.y);
    }

    #[test]
    fn test_walls_contain_bodies() {
        let mut world = world();
        let h = world.create_circular_body(Vec2::new(60.0, 300.0), 20.0, Material::default());
        world.set_velocity(h, Vec2::new(-900.0, 0.0));
        run(&mut world, 60);
        assert!(world.position(h).unwrap().x >= 35.0 + 20.0 - 0.01);
    }

    #[test]
    fn test_contact_start_reported_once() {
        let mut world = ArcadeWorld::new(PlayArea::default(), 0.0);
        let a = world.create_circular_body(Vec2::new(100.0, 300.0), 15.0, Material::default());
        let b = world.create_circular_body(Vec2::new(129.0, 300.0), 15.0, Material::default());

        let events = run(&mut world, 10);
        assert_eq!(events, vec![CollisionEvent::new(a, b)]);
    }

    #[test]
    fn test_separated_bodies_do_not_collide() {
        let mut world = ArcadeWorld::new(PlayArea::default(), 0.0);
        world.create_circular_body(Vec2::new(100.0, 300.0), 15.0, Material::default());
        world.create_circular_body(Vec2::new(200.0, 300.0), 15.0, Material::default());
        assert!(run(&mut world, 10).is_empty());
    }

    #[test]
    fn test_stale_handles_are_noops() {
        let mut world = world();
        let h = world.create_circular_body(Vec2::new(100.0, 100.0), 15.0, Material::default());
        assert!(world.remove_body(h));
        assert!(!world.remove_body(h));
        assert!(!world.set_velocity(h, Vec2::ONE));
        assert_eq!(world.position(h), None);
        assert!(!world.contains(h));
        assert!(world.is_empty());
    }
}
