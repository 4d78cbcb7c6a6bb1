//! Clown Suika - a Suika-style clown stacking merge game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, merging, danger detection, session state)
//! - `tiers`: The static clown tier progression
//! - `score`: Running and best score, persisted locally
//! - `leaderboard`: Online leaderboard client and stores
//! - `persistence`: Durable key/value storage (LocalStorage on web)
//! - `player`: Player name validation
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod leaderboard;
pub mod persistence;
pub mod player;
pub mod score;
pub mod sim;
pub mod tiers;
pub mod tuning;

pub use error::{InvalidName, LeaderboardError, StorageError, StoreError};
pub use leaderboard::{Leaderboard, LeaderboardEntry, SubmissionResult};
pub use player::PlayerName;
pub use score::ScoreLedger;
pub use tiers::{TIERS, Tier};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Simulation tick rate
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Longest accepted player name, in characters
    pub const MAX_NAME_CHARS: usize = 20;

    /// Durable storage keys
    pub const BEST_SCORE_KEY: &str = "bestScore";
    pub const PLAYER_NAME_KEY: &str = "playerName";
    pub const TUNING_KEY: &str = "tuning";

    /// Entries shown on the leaderboard panels
    pub const LEADERBOARD_TOP_N: usize = 10;
    /// Main leaderboard refresh period (30 seconds)
    pub const LEADERBOARD_REFRESH_MS: f64 = 30_000.0;
}

/// Convert a duration in milliseconds to whole simulation ticks (rounded up)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u64 {
    (u64::from(ms) * u64::from(consts::TICKS_PER_SECOND)).div_ceil(1000)
}
