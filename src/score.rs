//! Score ledger
//!
//! Tracks the running score of the current game and the best score ever
//! reached on this device. The best score is persisted as a decimal string.

use crate::consts::BEST_SCORE_KEY;
use crate::persistence::KeyValueStore;

/// Current and best score
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    current: u64,
    best: u64,
}

impl ScoreLedger {
    /// Empty ledger (best score 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the best score from storage, defaulting to 0 if absent or unparsable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let best = store
            .get(BEST_SCORE_KEY)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        if best > 0 {
            log::info!("Loaded best score {}", best);
        }
        Self { current: 0, best }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Add points; persists the best score when it improves.
    /// Returns true if the best score changed.
    pub fn add(&mut self, delta: u64, store: &mut dyn KeyValueStore) -> bool {
        self.current = self.current.saturating_add(delta);
        if self.current <= self.best {
            return false;
        }
        self.best = self.current;
        if let Err(e) = store.set(BEST_SCORE_KEY, &self.best.to_string()) {
            log::warn!("Failed to persist best score {}: {}", self.best, e);
        }
        true
    }

    /// Start a new game (best score untouched)
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    #[test]
    fn test_load_defaults() {
        assert_eq!(ScoreLedger::load(&MemoryStore::new()).best(), 0);
        let garbage = MemoryStore::new().with(BEST_SCORE_KEY, "not a number");
        assert_eq!(ScoreLedger::load(&garbage).best(), 0);
        let saved = MemoryStore::new().with(BEST_SCORE_KEY, "120");
        let ledger = ScoreLedger::load(&saved);
        assert_eq!(ledger.best(), 120);
        assert_eq!(ledger.current(), 0);
    }

    #[test]
    fn test_add_persists_only_on_improvement() {
        let mut store = MemoryStore::new().with(BEST_SCORE_KEY, "10");
        let mut ledger = ScoreLedger::load(&store);

        assert!(!ledger.add(6, &mut store));
        assert_eq!(store.get(BEST_SCORE_KEY).as_deref(), Some("10"));

        assert!(ledger.add(6, &mut store));
        assert_eq!(ledger.best(), 12);
        assert_eq!(store.get(BEST_SCORE_KEY).as_deref(), Some("12"));
    }

    #[test]
    fn test_reset_keeps_best() {
        let mut store = MemoryStore::new();
        let mut ledger = ScoreLedger::new();
        ledger.add(45, &mut store);
        ledger.reset();
        assert_eq!(ledger.current(), 0);
        assert_eq!(ledger.best(), 45);
    }

    proptest! {
        #[test]
        fn best_is_max_observed(
            start_best in 0u64..500,
            games in prop::collection::vec(prop::collection::vec(0u64..70, 0..20), 1..5),
        ) {
            let mut store = MemoryStore::new().with(BEST_SCORE_KEY, &start_best.to_string());
            let mut ledger = ScoreLedger::load(&store);
            let mut max_seen = start_best;

            for deltas in &games {
                ledger.reset();
                for &d in deltas {
                    ledger.add(d, &mut store);
                    max_seen = max_seen.max(ledger.current());
                    prop_assert_eq!(ledger.best(), max_seen);
                }
            }

            let reloaded = ScoreLedger::load(&store);
            prop_assert_eq!(reloaded.best(), max_seen);
        }
    }
}
