//! Online leaderboard
//!
//! Scores are appended to a hosted collection after every finished game.
//! Rank is computed client-side by re-reading the whole collection, so a
//! concurrent submission can shift it; that race is accepted.

pub mod firestore;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::consts::{LEADERBOARD_REFRESH_MS, LEADERBOARD_TOP_N};
use crate::error::LeaderboardError;
use crate::player::PlayerName;

pub use firestore::FirestoreConfig;
#[cfg(target_arch = "wasm32")]
pub use firestore::FirestoreStore;
pub use store::{LeaderboardStore, MemoryLeaderboard};

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    /// Unix timestamp (ms) assigned by the store, if it reported one
    pub submitted_at: Option<f64>,
}

impl LeaderboardEntry {
    pub fn matches(&self, name: &str, score: u64) -> bool {
        self.name == name && self.score == score
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    /// 1-based rank of the first entry matching the submitted `(name, score)`
    pub rank: Option<usize>,
    /// Number of entries in the collection after the append
    pub total: usize,
    pub top_entries: Vec<LeaderboardEntry>,
}

/// 1-based position of the first `(name, score)` match in score order
pub fn rank_of(entries: &[LeaderboardEntry], name: &str, score: u64) -> Option<usize> {
    entries.iter().position(|e| e.matches(name, score)).map(|i| i + 1)
}

/// Leaderboard client over any store
pub struct Leaderboard<S> {
    store: S,
}

impl<S: LeaderboardStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append the score, then rank it against the full collection
    pub async fn submit(&self, name: &PlayerName, score: u64) -> Result<SubmissionResult, LeaderboardError> {
        self.store
            .append(name.as_str(), score)
            .await
            .map_err(LeaderboardError::Submission)?;

        let mut entries = self
            .store
            .query_by_score(None)
            .await
            .map_err(LeaderboardError::Submission)?;

        let rank = rank_of(&entries, name.as_str(), score);
        let total = entries.len();
        entries.truncate(LEADERBOARD_TOP_N);

        match rank {
            Some(rank) => log::info!("Submitted {} for {}: rank {} of {}", score, name, rank, total),
            None => log::warn!("Submitted {} for {} but it was not found in the collection", score, name),
        }

        Ok(SubmissionResult {
            rank,
            total,
            top_entries: entries,
        })
    }

    /// Top `n` entries by score
    pub async fn fetch_top(&self, n: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.store
            .query_by_score(Some(n))
            .await
            .map_err(LeaderboardError::Fetch)
    }
}

/// One display row
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub name: String,
    pub score: u64,
    pub submitted_at: Option<f64>,
    pub highlight: bool,
}

fn rows_where(entries: &[LeaderboardEntry], highlight: impl Fn(&LeaderboardEntry) -> bool) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| LeaderboardRow {
            rank: i + 1,
            name: e.name.clone(),
            score: e.score,
            submitted_at: e.submitted_at,
            highlight: highlight(e),
        })
        .collect()
}

impl SubmissionResult {
    /// Game-over rows: only the just-submitted `(name, score)` is flagged
    pub fn rows(&self, name: &str, score: u64) -> Vec<LeaderboardRow> {
        rows_where(&self.top_entries, |e| e.matches(name, score))
    }
}

/// What the main leaderboard list currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum PanelStatus {
    Loading,
    Empty,
    Ready,
}

/// Main leaderboard list state, refreshed periodically
#[derive(Debug, Clone)]
pub struct LeaderboardPanel {
    entries: Vec<LeaderboardEntry>,
    status: PanelStatus,
    error: Option<String>,
    last_refresh_ms: Option<f64>,
}

impl Default for LeaderboardPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderboardPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            status: PanelStatus::Loading,
            error: None,
            last_refresh_ms: None,
        }
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    /// Inline error from the latest refresh, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// True when no refresh has started yet or the period has elapsed
    pub fn refresh_due(&self, now_ms: f64) -> bool {
        match self.last_refresh_ms {
            None => true,
            Some(last) => now_ms - last >= LEADERBOARD_REFRESH_MS,
        }
    }

    /// Record that a refresh was started at `now_ms`
    pub fn mark_refresh(&mut self, now_ms: f64) {
        self.last_refresh_ms = Some(now_ms);
    }

    /// Apply a fetch outcome. A failure keeps whatever was shown before.
    pub fn apply(&mut self, result: Result<Vec<LeaderboardEntry>, LeaderboardError>) {
        match result {
            Ok(entries) => {
                self.status = if entries.is_empty() {
                    PanelStatus::Empty
                } else {
                    PanelStatus::Ready
                };
                self.entries = entries;
                self.error = None;
            }
            Err(err) => {
                log::warn!("Leaderboard refresh failed: {}", err);
                self.error = Some(err.to_string());
                if self.status == PanelStatus::Loading {
                    self.status = PanelStatus::Empty;
                }
            }
        }
    }

    /// Rows with every entry under the current player's name flagged
    pub fn rows(&self, player: Option<&str>) -> Vec<LeaderboardRow> {
        rows_where(&self.entries, |e| player.is_some_and(|p| e.name == p))
    }
}

/// Format the age of a timestamp relative to `now` (both Unix ms)
pub fn format_age(timestamp: f64, now: f64) -> String {
    let diff_secs = (now - timestamp) / 1000.0;
    let diff_mins = diff_secs / 60.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            format_calendar(timestamp)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

/// Format a timestamp relative to the current time
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    format_age(timestamp, js_sys::Date::now())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(timestamp: f64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(timestamp);
    format_age(timestamp, now)
}

#[cfg(target_arch = "wasm32")]
fn format_calendar(timestamp: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
    format!(
        "{}/{}/{}",
        date.get_month() + 1,
        date.get_date(),
        date.get_full_year() % 100
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn format_calendar(_timestamp: f64) -> String {
    "Long ago".to_string()
}
