//! Contestants and the A/B side label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ContestantId, TypesError};

/// Canonical side of a head-to-head race.
///
/// The derived ordering puts `A` before `B`; the ledger relies on it to
/// establish the canonical pair order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContestantType {
    A,
    B,
}

impl ContestantType {
    pub const ALL: [ContestantType; 2] = [ContestantType::A, ContestantType::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl fmt::Display for ContestantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContestantType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            _ => Err(TypesError::InvalidContestantType(s.to_string())),
        }
    }
}

/// Display metadata for a contestant. Read-only to the voting core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestant {
    pub id: ContestantId,
    pub name: String,
    pub small_image_path: String,
    pub large_image_path: String,
}
