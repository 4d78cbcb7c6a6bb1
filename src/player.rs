//! Player name validation

use std::fmt;

use crate::consts::{MAX_NAME_CHARS, PLAYER_NAME_KEY};
use crate::error::InvalidName;
use crate::persistence::KeyValueStore;

/// A trimmed, non-empty name of at most 20 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str) -> Result<Self, InvalidName> {
        let name = raw.trim();
        let len = name.chars().count();
        if len == 0 {
            return Err(InvalidName::Empty);
        }
        if len > MAX_NAME_CHARS {
            return Err(InvalidName::TooLong {
                len,
                max: MAX_NAME_CHARS,
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name remembered from a previous visit, if still valid
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        store.get(PLAYER_NAME_KEY).and_then(|s| Self::parse(&s).ok())
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        if let Err(e) = store.set(PLAYER_NAME_KEY, &self.0) {
            log::warn!("Failed to remember player name: {}", e);
        }
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PlayerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
