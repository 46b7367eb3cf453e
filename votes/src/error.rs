use thiserror::Error;

use votatoon_store::StoreError;
use votatoon_types::{ContestantType, RaceId};

/// Outcomes of the voting core other than success.
///
/// Everything except [`VoteError::Internal`] is an expected, user-facing
/// outcome. `Internal` keeps the storage cause as its `source` for logs but
/// does not print it.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("no active race was found")]
    NoActiveRace,

    #[error("no active contestant of type {0} was found")]
    NoActiveContestant(ContestantType),

    #[error("there is already a current vote for this client")]
    DuplicateVote,

    #[error("vote totals for race {race_id} are inconsistent: {reason}")]
    RecordsInconsistent { race_id: RaceId, reason: String },

    #[error("internal storage error")]
    Internal(#[from] StoreError),
}

impl VoteError {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveRace => "NO_ACTIVE_RACE",
            Self::NoActiveContestant(_) => "NO_ACTIVE_CONTESTANT",
            Self::DuplicateVote => "EXISTING_VOTE",
            Self::RecordsInconsistent { .. } => "NO_RECORDS_AMOUNT_ENOUGH",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn inconsistent(race_id: RaceId, reason: impl Into<String>) -> Self {
        Self::RecordsInconsistent {
            race_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn internal_hides_cause_but_keeps_source() {
        let err = VoteError::from(StoreError::Backend("disk on fire at /var/db".into()));
        assert_eq!(err.to_string(), "internal storage error");
        assert!(err.source().unwrap().to_string().contains("disk on fire"));
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            VoteError::NoActiveRace.code(),
            VoteError::NoActiveContestant(ContestantType::A).code(),
            VoteError::DuplicateVote.code(),
            VoteError::inconsistent(RaceId::new(1), "x").code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
