//! Leaderboard storage contract
//!
//! The hosted store is append-only from the game's point of view: it adds
//! one entry per finished game and reads entries back ordered by score.

use std::cell::{Cell, RefCell};

use super::LeaderboardEntry;
use crate::error::StoreError;

/// Narrow read/write contract against the hosted leaderboard collection
#[allow(async_fn_in_trait)]
pub trait LeaderboardStore {
    /// Append one entry; the store assigns the timestamp
    async fn append(&self, name: &str, score: u64) -> Result<(), StoreError>;

    /// Entries ordered by score, highest first, optionally limited
    async fn query_by_score(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// In-process store for native runs and tests.
///
/// Ties keep submission order. Timestamps are a logical clock in ms.
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: RefCell<Vec<LeaderboardEntry>>,
    clock: Cell<f64>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `(name, score)` pairs, in submission order
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let store = Self::new();
        for (name, score) in entries {
            store.push(name, score);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn push(&self, name: &str, score: u64) {
        let stamp = self.clock.get() + 1.0;
        self.clock.set(stamp);
        self.entries.borrow_mut().push(LeaderboardEntry {
            name: name.to_string(),
            score,
            submitted_at: Some(stamp),
        });
    }
}

impl LeaderboardStore for MemoryLeaderboard {
    async fn append(&self, name: &str, score: u64) -> Result<(), StoreError> {
        self.push(name, score);
        Ok(())
    }

    async fn query_by_score(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut entries = self.entries.borrow().clone();
        // Stable sort keeps submission order among equal scores
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
}
