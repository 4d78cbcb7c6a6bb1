//! Danger / loss detection
//!
//! A clown that sits above the danger line without moving for long enough
//! ends the game. The check is debounced so a clown passing through the
//! zone (e.g. at the top of a bounce) never trips it.

use glam::Vec2;

use super::physics::PhysicsAdapter;
use super::state::ActiveBodies;
use crate::tiers::TIERS;
use crate::tuning::{StagnationMetric, Tuning};

/// Speed measure used for the stagnation test
#[inline]
pub fn stagnation_speed(vel: Vec2, metric: StagnationMetric) -> f32 {
    match metric {
        StagnationMetric::VerticalSpeed => vel.y.abs(),
        StagnationMetric::Speed => vel.length(),
    }
}

/// Update every body's danger timer.
///
/// Returns true if any timer exceeded the loss threshold.
pub fn scan_danger<P: PhysicsAdapter>(bodies: &mut ActiveBodies, physics: &P, tuning: &Tuning) -> bool {
    let mut tripped = false;

    for body in bodies.iter_mut() {
        let (Some(pos), Some(vel)) = (physics.position(body.handle), physics.velocity(body.handle))
        else {
            body.danger_timer = 0;
            continue;
        };

        let top = pos.y - TIERS[body.tier].radius();
        let speed = stagnation_speed(vel, tuning.stagnation_metric);

        if top < tuning.danger_line_y && speed < tuning.stagnation_threshold {
            body.danger_timer += 1;
            if body.danger_timer > tuning.loss_tick_threshold {
                tripped = true;
            }
        } else {
            body.danger_timer = 0;
        }
    }

    tripped
}
