//! Spawn controller
//!
//! Chooses which clown comes next, keeps the aimed preview inside the walls,
//! and gates drops behind a cooldown deadline measured in ticks.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ms_to_ticks;
use crate::tiers::{TIERS, TOP_TIER};
use crate::tuning::Tuning;

/// The aimed, not-yet-simulated clown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub tier: usize,
    pub x: f32,
    pub y: f32,
}

/// Why a drop request was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropRejected {
    #[error("game is not in progress")]
    NotPlaying,
    #[error("drop cooling down until tick {until}")]
    CoolingDown { until: u64 },
    #[error("no clown is being aimed")]
    NoPreview,
}

#[derive(Debug, Clone)]
pub struct SpawnController {
    rng: Pcg32,
    preview: Option<Preview>,
    /// Tier of the preview that appears when the cooldown ends
    next_tier: usize,
    /// Tick at which dropping is allowed again
    cooldown_until: Option<u64>,
    /// Last pointer x, reused when a new preview appears
    pointer_x: Option<f32>,
}

impl SpawnController {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut spawn = Self {
            rng: Pcg32::seed_from_u64(seed),
            preview: None,
            next_tier: 0,
            cooldown_until: None,
            pointer_x: None,
        };
        spawn.next_tier = spawn.initial_tier(tuning.max_spawn_tier);
        spawn
    }

    /// Uniform pick in `[0, min(max_spawn_tier, previous_drop_tier + 1)]`
    pub fn pick_next_tier(&mut self, previous_drop_tier: usize, max_spawn_tier: usize) -> usize {
        let max = max_spawn_tier.min(previous_drop_tier + 1).min(TOP_TIER);
        self.rng.random_range(0..=max)
    }

    /// First clown of a game: anything up to the spawn cap
    pub fn initial_tier(&mut self, max_spawn_tier: usize) -> usize {
        self.rng.random_range(0..=max_spawn_tier.min(TOP_TIER))
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn next_tier(&self) -> usize {
        self.next_tier
    }

    pub fn cooldown_until(&self) -> Option<u64> {
        self.cooldown_until
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_until.is_some()
    }

    /// Replace the preview with a clown of `tier` at the last pointer position
    pub fn begin_aim(&mut self, tier: usize, tuning: &Tuning) -> Preview {
        let tier = tier.min(TIERS.len() - 1);
        let x = self.pointer_x.unwrap_or(tuning.play_area.center_x());
        let preview = Preview {
            tier,
            x: clamp_aim(x, tier, tuning),
            y: tuning.preview_y,
        };
        self.preview = Some(preview);
        preview
    }

    /// Follow pointer input
    pub fn aim(&mut self, x: f32, tuning: &Tuning) {
        self.pointer_x = Some(x);
        if let Some(preview) = self.preview.as_mut() {
            preview.x = clamp_aim(x, preview.tier, tuning);
        }
    }

    /// Consume the preview for a drop at tick `now`.
    ///
    /// Picks the tier that follows and starts the cooldown. The caller
    /// turns the returned preview into a live body.
    pub fn take_drop(&mut self, now: u64, tuning: &Tuning) -> Result<Preview, DropRejected> {
        if let Some(until) = self.cooldown_until {
            return Err(DropRejected::CoolingDown { until });
        }
        let preview = self.preview.take().ok_or(DropRejected::NoPreview)?;

        self.next_tier = self.pick_next_tier(preview.tier, tuning.max_spawn_tier);
        self.cooldown_until = Some(now + ms_to_ticks(tuning.drop_cooldown_ms));
        Ok(preview)
    }

    /// End the cooldown once its deadline has passed, spawning the next preview
    pub fn poll_cooldown(&mut self, now: u64, tuning: &Tuning) -> Option<Preview> {
        match self.cooldown_until {
            Some(until) if now >= until => {
                self.cooldown_until = None;
                Some(self.begin_aim(self.next_tier, tuning))
            }
            _ => None,
        }
    }

    /// Stop all spawning (game over)
    pub fn halt(&mut self) {
        self.preview = None;
        self.cooldown_until = None;
    }

    /// Fresh state for a new game; the RNG stream continues
    pub fn reset(&mut self, tuning: &Tuning) {
        self.halt();
        self.pointer_x = None;
        self.next_tier = self.initial_tier(tuning.max_spawn_tier);
    }
}

fn clamp_aim(x: f32, tier: usize, tuning: &Tuning) -> f32 {
    let (min, max) = tuning.aim_range(&TIERS[tier]);
    x.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aim_clamps_to_walls() {
        let tuning = Tuning::default();
        let mut spawn = SpawnController::new(7, &tuning);
        spawn.begin_aim(4, &tuning);

        spawn.aim(-1000.0, &tuning);
        assert_eq!(spawn.preview().unwrap().x, 35.0 + 25.0 + 5.0);
        spawn.aim(1000.0, &tuning);
        assert_eq!(spawn.preview().unwrap().x, 415.0 - 25.0 - 5.0);
        spawn.aim(200.0, &tuning);
        assert_eq!(spawn.preview().unwrap().x, 200.0);
        assert_eq!(spawn.preview().unwrap().y, tuning.preview_y);
    }

    #[test]
    fn test_new_preview_follows_last_pointer() {
        let tuning = Tuning::default();
        let mut spawn = SpawnController::new(7, &tuning);
        assert_eq!(spawn.begin_aim(0, &tuning).x, tuning.play_area.center_x());
        spawn.aim(120.0, &tuning);
        assert_eq!(spawn.begin_aim(1, &tuning).x, 120.0);
    }

    #[test]
    fn test_cooldown_gates_drops() {
        let tuning = Tuning::default();
        let mut spawn = SpawnController::new(7, &tuning);
        spawn.begin_aim(0, &tuning);

        let dropped = spawn.take_drop(10, &tuning).unwrap();
        assert_eq!(dropped.tier, 0);
        assert_eq!(spawn.cooldown_until(), Some(40));
        assert!(spawn.preview().is_none());
        assert_eq!(
            spawn.take_drop(11, &tuning),
            Err(DropRejected::CoolingDown { until: 40 })
        );

        assert!(spawn.poll_cooldown(39, &tuning).is_none());
        let next = spawn.poll_cooldown(40, &tuning).unwrap();
        assert_eq!(next.tier, spawn.next_tier());
        assert!(next.tier <= 1);
        assert!(!spawn.is_cooling_down());
        assert!(spawn.take_drop(40, &tuning).is_ok());
    }

    #[test]
    fn test_drop_without_preview() {
        let tuning = Tuning::default();
        let mut spawn = SpawnController::new(7, &tuning);
        assert_eq!(spawn.take_drop(0, &tuning), Err(DropRejected::NoPreview));
    }

    #[test]
    fn test_halt_prevents_next_preview() {
        let tuning = Tuning::default();
        let mut spawn = SpawnController::new(7, &tuning);
        spawn.begin_aim(0, &tuning);
        spawn.take_drop(0, &tuning).unwrap();
        spawn.halt();
        assert!(spawn.poll_cooldown(1000, &tuning).is_none());
        assert!(spawn.preview().is_none());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let tuning = Tuning::default();
        let mut a = SpawnController::new(99, &tuning);
        let mut b = SpawnController::new(99, &tuning);
        for prev in 0..50 {
            assert_eq!(a.pick_next_tier(prev % 5, 4), b.pick_next_tier(prev % 5, 4));
        }
    }

    proptest! {
        #[test]
        fn next_tier_never_exceeds_cap(seed in any::<u64>(), previous in 0usize..11) {
            let tuning = Tuning::default();
            let mut spawn = SpawnController::new(seed, &tuning);
            for _ in 0..20 {
                let tier = spawn.pick_next_tier(previous, 4);
                prop_assert!(tier <= 4.min(previous + 1));
            }
        }

        #[test]
        fn oversized_cap_stays_on_the_table(seed in any::<u64>(), previous in 0usize..11) {
            let tuning = Tuning::default();
            let mut spawn = SpawnController::new(seed, &tuning);
            prop_assert!(spawn.initial_tier(40) <= TOP_TIER);
            prop_assert!(spawn.pick_next_tier(previous, 40) <= TOP_TIER);
        }

        #[test]
        fn initial_tier_within_spawn_cap(seed in any::<u64>()) {
            let tuning = Tuning::default();
            let spawn = SpawnController::new(seed, &tuning);
            prop_assert!(spawn.next_tier() <= tuning.max_spawn_tier);
        }
    }
}
