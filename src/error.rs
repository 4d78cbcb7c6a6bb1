//! Error types
//!
//! None of these are fatal: a bad name re-prompts, storage failures are
//! logged, and leaderboard failures leave the finished game untouched.

use thiserror::Error;

/// Rejected player name at session start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidName {
    #[error("please enter your name")]
    Empty,
    #[error("name must be {max} characters or less (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Durable key/value storage failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("failed to write key '{key}'")]
    Write { key: String },
}

/// Leaderboard store transport or decoding failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("store responded with HTTP {status}")]
    Status { status: u16 },
    #[error("malformed store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed document: missing field '{0}'")]
    MissingField(&'static str),
}

/// Leaderboard client failure, split by the operation that failed
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Appending the score or the follow-up ranking query failed
    #[error("error submitting score: {0}")]
    Submission(#[source] StoreError),
    /// A read-only refresh failed
    #[error("error loading scores: {0}")]
    Fetch(#[source] StoreError),
}
