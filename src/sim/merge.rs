//! Merge engine
//!
//! Turns collision-start notifications into fusions. Two same-tier clowns
//! that touch are destroyed and replaced by one clown of the next tier at
//! their midpoint.

use glam::Vec2;

use super::physics::{BodyHandle, CollisionEvent, PhysicsAdapter};
use super::state::ActiveBodies;
use crate::tiers::TIERS;
use crate::tuning::Tuning;

/// A completed fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fusion {
    /// The two consumed bodies
    pub consumed: (BodyHandle, BodyHandle),
    /// The body that replaced them
    pub created: BodyHandle,
    /// Tier of the created body
    pub tier: usize,
    pub at: Vec2,
    /// Points earned (the created tier's score value)
    pub points: u64,
}

/// Process a batch of collision events in arrival order.
///
/// Events referencing bodies consumed earlier in the batch (or in an earlier
/// batch) are skipped.
pub fn resolve_collisions<P: PhysicsAdapter>(
    events: &[CollisionEvent],
    bodies: &mut ActiveBodies,
    physics: &mut P,
    tuning: &Tuning,
) -> Vec<Fusion> {
    events
        .iter()
        .filter_map(|event| try_merge(event, bodies, physics, tuning))
        .collect()
}

/// Attempt a single fusion
pub fn try_merge<P: PhysicsAdapter>(
    event: &CollisionEvent,
    bodies: &mut ActiveBodies,
    physics: &mut P,
    tuning: &Tuning,
) -> Option<Fusion> {
    let CollisionEvent { a, b } = *event;
    if a == b {
        return None;
    }

    let (body_a, body_b) = (bodies.get(a)?, bodies.get(b)?);
    if !body_a.can_merge || !body_b.can_merge {
        return None;
    }
    if body_a.tier != body_b.tier {
        return None;
    }
    let tier = &TIERS[body_a.tier];
    let next = tier.next()?;

    let pos_a = physics.position(a)?;
    let pos_b = physics.position(b)?;
    if tuning.contact_guard && pos_a.distance(pos_b) > tier.size * tuning.contact_guard_factor {
        log::debug!("Ignoring distant {} pair ({:?}, {:?})", tier.name, a, b);
        return None;
    }

    for handle in [a, b] {
        if let Some(body) = bodies.get_mut(handle) {
            body.can_merge = false;
        }
    }

    let at = (pos_a + pos_b) * 0.5;
    bodies.remove(physics, a);
    bodies.remove(physics, b);

    let pop = Vec2::new(0.0, -tuning.merge_pop_speed);
    let created = bodies.spawn(physics, tuning, next.rank, at, pop);
    log::debug!("{} + {} -> {} at ({:.0}, {:.0})", tier.name, tier.name, next.name, at.x, at.y);

    Some(Fusion {
        consumed: (a, b),
        created,
        tier: next.rank,
        at,
        points: next.score_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ArcadeWorld;
    use crate::tiers::TOP_TIER;

    fn setup() -> (ActiveBodies, ArcadeWorld, Tuning) {
        let tuning = Tuning::default();
        let physics = ArcadeWorld::new(tuning.play_area, 0.0);
        (ActiveBodies::new(), physics, tuning)
    }

    #[test]
    fn test_every_mergeable_tier_fuses_into_next() {
        for rank in 0..TOP_TIER {
            let (mut bodies, mut physics, tuning) = setup();
            let a = bodies.spawn(&mut physics, &tuning, rank, Vec2::new(100.0, 300.0), Vec2::ZERO);
            let b = bodies.spawn(&mut physics, &tuning, rank, Vec2::new(140.0, 300.0), Vec2::ZERO);

            let fusions = resolve_collisions(&[CollisionEvent::new(a, b)], &mut bodies, &mut physics, &tuning);
            assert_eq!(fusions.len(), 1);
            let fusion = fusions[0];
            assert_eq!(fusion.tier, rank + 1);
            assert_eq!(fusion.points, TIERS[rank + 1].score_value);
            assert_eq!(fusion.at, Vec2::new(120.0, 300.0));

            assert_eq!(bodies.len(), 1);
            assert!(!bodies.contains(a) && !bodies.contains(b));
            assert!(!physics.contains(a) && !physics.contains(b));
            let created = bodies.get(fusion.created).unwrap();
            assert_eq!(created.tier, rank + 1);
            assert!(created.can_merge);
            assert_eq!(created.danger_timer, 0);
            assert_eq!(physics.velocity(fusion.created), Some(Vec2::new(0.0, -100.0)));
        }
    }

    #[test]
    fn test_top_tier_never_merges() {
        let (mut bodies, mut physics, tuning) = setup();
        let a = bodies.spawn(&mut physics, &tuning, TOP_TIER, Vec2::new(100.0, 300.0), Vec2::ZERO);
        let b = bodies.spawn(&mut physics, &tuning, TOP_TIER, Vec2::new(180.0, 300.0), Vec2::ZERO);
        assert!(resolve_collisions(&[CollisionEvent::new(a, b)], &mut bodies, &mut physics, &tuning).is_empty());
        assert_eq!(bodies.len(), 2);
    }

    #[test]
    fn test_different_tiers_do_not_merge() {
        let (mut bodies, mut physics, tuning) = setup();
        let a = bodies.spawn(&mut physics, &tuning, 1, Vec2::new(100.0, 300.0), Vec2::ZERO);
        let b = bodies.spawn(&mut physics, &tuning, 2, Vec2::new(140.0, 300.0), Vec2::ZERO);
        assert!(resolve_collisions(&[CollisionEvent::new(a, b)], &mut bodies, &mut physics, &tuning).is_empty());
    }

    #[test]
    fn test_consumed_bodies_are_not_reused() {
        let (mut bodies, mut physics, tuning) = setup();
        let a = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(100.0, 300.0), Vec2::ZERO);
        let b = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(130.0, 300.0), Vec2::ZERO);
        let c = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(160.0, 300.0), Vec2::ZERO);

        // a-b and b-c arrive in the same batch, plus a late duplicate of a-b
        let events = [
            CollisionEvent::new(a, b),
            CollisionEvent::new(b, c),
            CollisionEvent::new(b, a),
        ];
        let fusions = resolve_collisions(&events, &mut bodies, &mut physics, &tuning);
        assert_eq!(fusions.len(), 1);
        assert_eq!(fusions[0].consumed, (a, b));
        assert!(bodies.contains(c));
        assert_eq!(bodies.count_tier(0), 1);
        assert_eq!(bodies.count_tier(1), 1);

        // Redelivering everything later changes nothing
        assert!(resolve_collisions(&events, &mut bodies, &mut physics, &tuning).is_empty());
        assert_eq!(bodies.len(), 2);
    }

    #[test]
    fn test_latched_body_is_skipped() {
        let (mut bodies, mut physics, tuning) = setup();
        let a = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(100.0, 300.0), Vec2::ZERO);
        let b = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(130.0, 300.0), Vec2::ZERO);
        bodies.get_mut(a).unwrap().can_merge = false;
        assert!(try_merge(&CollisionEvent::new(a, b), &mut bodies, &mut physics, &tuning).is_none());
    }

    #[test]
    fn test_contact_guard_rejects_distant_pairs() {
        let (mut bodies, mut physics, mut tuning) = setup();
        tuning.contact_guard = true;
        let a = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(100.0, 300.0), Vec2::ZERO);
        let b = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(137.0, 300.0), Vec2::ZERO);
        // 37 > 30 * 1.2
        assert!(try_merge(&CollisionEvent::new(a, b), &mut bodies, &mut physics, &tuning).is_none());

        let c = bodies.spawn(&mut physics, &tuning, 0, Vec2::new(160.0, 300.0), Vec2::ZERO);
        assert!(try_merge(&CollisionEvent::new(b, c), &mut bodies, &mut physics, &tuning).is_some());
    }
}
