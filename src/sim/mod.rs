//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body handle)
//! - No rendering or platform dependencies

pub mod arcade;
pub mod danger;
pub mod merge;
pub mod physics;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use arcade::ArcadeWorld;
pub use danger::{scan_danger, stagnation_speed};
pub use merge::{Fusion, resolve_collisions, try_merge};
pub use physics::{BodyHandle, CollisionEvent, PhysicsAdapter};
pub use session::GameSession;
pub use spawn::{DropRejected, Preview, SpawnController};
pub use state::{ActiveBodies, Body, GameEvent, GamePhase};
pub use tick::{TickInput, tick};
