use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TopElevenError;

/// Number of ranked slots in every list.
pub const SLOT_COUNT: u8 = 11;

/// A validated rank slot in `1..=SLOT_COUNT`.
///
/// Stored positions are plain integers so drifted rows can still be read;
/// every write path goes through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Position(u8);

impl Position {
    pub const LAST: Self = Self(SLOT_COUNT);

    /// Validate a raw position.
    ///
    /// # Errors
    ///
    /// Returns [`TopElevenError::PositionOutOfRange`] outside `1..=11`.
    pub fn new(raw: i64) -> Result<Self, TopElevenError> {
        if Self::in_range(raw) {
            u8::try_from(raw)
                .map(Self)
                .map_err(|_| TopElevenError::PositionOutOfRange { position: raw })
        } else {
            Err(TopElevenError::PositionOutOfRange { position: raw })
        }
    }

    /// True when `raw` names a real slot.
    #[must_use]
    pub const fn in_range(raw: i64) -> bool {
        raw >= 1 && raw <= SLOT_COUNT as i64
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0 as i64
    }

    /// All slots in rank order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=SLOT_COUNT).map(Self)
    }
}

impl TryFrom<i64> for Position {
    type Error = TopElevenError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Position> for i64 {
    fn from(position: Position) -> Self {
        position.as_i64()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
