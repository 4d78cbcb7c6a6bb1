//! Game session
//!
//! All mutable game state lives here, owned by a single controller: the
//! phase machine, the active body set, the spawn controller and the score
//! ledger, together with the physics backend and durable storage they use.

use glam::Vec2;

use super::merge::{Fusion, resolve_collisions};
use super::physics::{BodyHandle, CollisionEvent, PhysicsAdapter};
use super::spawn::{DropRejected, Preview, SpawnController};
use super::state::{ActiveBodies, GameEvent, GamePhase};
use crate::error::InvalidName;
use crate::persistence::KeyValueStore;
use crate::player::PlayerName;
use crate::score::ScoreLedger;
use crate::tiers::TIERS;
use crate::tuning::Tuning;

pub struct GameSession<P: PhysicsAdapter> {
    pub(crate) tuning: Tuning,
    pub(crate) phase: GamePhase,
    player: Option<PlayerName>,
    pub(crate) physics: P,
    pub(crate) bodies: ActiveBodies,
    pub(crate) spawn: SpawnController,
    ledger: ScoreLedger,
    store: Box<dyn KeyValueStore>,
    /// Simulation tick counter (drives the drop cooldown)
    pub(crate) time_ticks: u64,
    events: Vec<GameEvent>,
    /// Reused collision buffer
    pub(crate) collisions: Vec<CollisionEvent>,
}

impl<P: PhysicsAdapter> GameSession<P> {
    /// Create a session awaiting a player name.
    ///
    /// The best score is loaded from `store` once, here.
    pub fn new(physics: P, store: Box<dyn KeyValueStore>, tuning: Tuning, seed: u64) -> Self {
        let ledger = ScoreLedger::load(store.as_ref());
        let spawn = SpawnController::new(seed, &tuning);
        Self {
            tuning,
            phase: GamePhase::AwaitingName,
            player: None,
            physics,
            bodies: ActiveBodies::new(),
            spawn,
            ledger,
            store,
            time_ticks: 0,
            events: Vec::new(),
            collisions: Vec::new(),
        }
    }

    // === Observables ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn score(&self) -> u64 {
        self.ledger.current()
    }

    pub fn best_score(&self) -> u64 {
        self.ledger.best()
    }

    pub fn player(&self) -> Option<&PlayerName> {
        self.player.as_ref()
    }

    /// Name stored by a previous visit, for pre-filling the prompt
    pub fn remembered_name(&self) -> Option<PlayerName> {
        PlayerName::load(self.store.as_ref())
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn bodies(&self) -> &ActiveBodies {
        &self.bodies
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.spawn.preview()
    }

    /// Tier shown in the "next" indicator
    pub fn next_tier(&self) -> usize {
        self.spawn.next_tier()
    }

    /// Tick at which dropping becomes possible again
    pub fn cooldown_until(&self) -> Option<u64> {
        self.spawn.cooldown_until()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Name and final score to submit, once the game is over
    pub fn final_result(&self) -> Option<(&PlayerName, u64)> {
        if self.phase != GamePhase::GameOver {
            return None;
        }
        self.player.as_ref().map(|p| (p, self.ledger.current()))
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    // === Phase transitions ===

    /// AwaitingName → Playing
    pub fn start(&mut self, raw_name: &str) -> Result<(), InvalidName> {
        let name = PlayerName::parse(raw_name)?;
        if self.phase != GamePhase::AwaitingName {
            log::warn!("Ignoring start request while {:?}", self.phase);
            return Ok(());
        }
        name.save(self.store.as_mut());
        log::info!("Starting game for {}", name);
        self.emit(GameEvent::Started {
            player: name.to_string(),
        });
        self.player = Some(name);
        self.enter_playing();
        Ok(())
    }

    /// GameOver → Playing. Returns false in any other phase.
    pub fn restart(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            log::warn!("Ignoring restart while {:?}", self.phase);
            return false;
        }
        self.bodies.clear(&mut self.physics);
        self.ledger.reset();
        self.spawn.reset(&self.tuning);
        self.emit(GameEvent::Restarted);
        self.emit(GameEvent::ScoreChanged {
            score: 0,
            best: self.ledger.best(),
        });
        log::info!("Game restarted");
        self.enter_playing();
        true
    }

    fn enter_playing(&mut self) {
        self.phase = GamePhase::Playing;
        let tier = self.spawn.next_tier();
        let preview = self.spawn.begin_aim(tier, &self.tuning);
        self.emit(GameEvent::PreviewSpawned { tier: preview.tier });
    }

    /// Playing → GameOver: freeze spawning and drop the preview
    pub(crate) fn end_game(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.spawn.halt();
        let score = self.ledger.current();
        log::info!(
            "Game over at tick {}: score {} (best {}), {} clowns on the board",
            self.time_ticks,
            score,
            self.ledger.best(),
            self.bodies.len()
        );
        self.emit(GameEvent::GameOver { score });
    }

    // === Player actions ===

    /// Move the aimed clown toward pointer x
    pub fn aim(&mut self, x: f32) {
        if self.phase == GamePhase::Playing {
            self.spawn.aim(x, &self.tuning);
        }
    }

    /// Replace the aimed clown with one of `tier`
    pub fn begin_aim(&mut self, tier: usize) -> Option<Preview> {
        if self.phase != GamePhase::Playing || tier >= TIERS.len() {
            return None;
        }
        let preview = self.spawn.begin_aim(tier, &self.tuning);
        self.emit(GameEvent::PreviewSpawned { tier: preview.tier });
        Some(preview)
    }

    /// Release the aimed clown into the simulation
    pub fn drop_preview(&mut self) -> Result<BodyHandle, DropRejected> {
        if self.phase != GamePhase::Playing {
            return Err(DropRejected::NotPlaying);
        }
        let preview = self.spawn.take_drop(self.time_ticks, &self.tuning)?;
        let pos = Vec2::new(preview.x, self.tuning.spawn_y);
        let handle = self
            .bodies
            .spawn(&mut self.physics, &self.tuning, preview.tier, pos, Vec2::ZERO);

        log::debug!("Dropped {} at x={:.0}", TIERS[preview.tier].name, preview.x);
        self.emit(GameEvent::Dropped {
            tier: preview.tier,
            x: preview.x,
        });
        self.emit(GameEvent::NextTier {
            tier: self.spawn.next_tier(),
        });
        Ok(handle)
    }

    /// Place a clown directly (scripted setups and tests)
    pub fn insert_body(&mut self, tier: usize, pos: Vec2, vel: Vec2) -> Option<BodyHandle> {
        if tier >= TIERS.len() {
            return None;
        }
        Some(self.bodies.spawn(&mut self.physics, &self.tuning, tier, pos, vel))
    }

    // === Merge engine entry point ===

    /// Apply a batch of collision notifications: fuse pairs and award points
    pub fn handle_collisions(&mut self, events: &[CollisionEvent]) -> Vec<Fusion> {
        if self.phase != GamePhase::Playing {
            return Vec::new();
        }
        let fusions = resolve_collisions(events, &mut self.bodies, &mut self.physics, &self.tuning);
        for fusion in &fusions {
            self.award(fusion.points);
            self.emit(GameEvent::Merged {
                tier: fusion.tier,
                at: fusion.at,
                points: fusion.points,
            });
        }
        fusions
    }

    fn award(&mut self, points: u64) {
        if self.ledger.add(points, self.store.as_mut()) {
            log::info!("New best score {}", self.ledger.best());
        }
        self.emit(GameEvent::ScoreChanged {
            score: self.ledger.current(),
            best: self.ledger.best(),
        });
    }
}
