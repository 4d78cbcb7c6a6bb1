//! Fixed timestep simulation tick
//!
//! Order within a tick: player input, physics step, collision drain and
//! merging, danger scan, cooldown expiry. The danger scan therefore always
//! sees the post-merge body set.

use super::danger::scan_danger;
use super::physics::PhysicsAdapter;
use super::session::GameSession;
use super::state::{GameEvent, GamePhase};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer x (world units)
    pub aim_x: Option<f32>,
    /// Drop the aimed clown (click/tap/space)
    pub drop: bool,
}

/// Advance the session by one fixed timestep
pub fn tick<P: PhysicsAdapter>(session: &mut GameSession<P>, input: &TickInput, dt: f32) {
    // Frozen outside of play
    if session.phase != GamePhase::Playing {
        return;
    }

    session.time_ticks += 1;

    if let Some(x) = input.aim_x {
        session.aim(x);
    }
    if input.drop {
        if let Err(reason) = session.drop_preview() {
            log::debug!("Drop ignored: {}", reason);
        }
    }

    session.physics.step(dt);

    // Every notification of this step is handled before anything else reads the body set
    let mut collisions = std::mem::take(&mut session.collisions);
    session.physics.drain_collisions(&mut collisions);
    if !collisions.is_empty() {
        session.handle_collisions(&collisions);
        collisions.clear();
    }
    session.collisions = collisions;

    if scan_danger(&mut session.bodies, &session.physics, &session.tuning) {
        session.end_game();
        return;
    }

    if let Some(preview) = session.spawn.poll_cooldown(session.time_ticks, &session.tuning) {
        session.emit(GameEvent::PreviewSpawned { tier: preview.tier });
    }
}
