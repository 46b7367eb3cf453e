//! Race fixtures for seeding any [`VoteStore`] in tests.

use votatoon_store::{StoreError, VoteStore, WriteTxn};
use votatoon_types::{
    Contestant, ContestantId, ContestantType, ContestantVoteTotal, Race, RaceContestantId, RaceId,
    Timestamp,
};

/// A well-formed head-to-head race: one race record, two contestants and one
/// active vote-total row per side.
///
/// Ids are derived from `race_id` so several fixtures can share a store.
#[derive(Clone, Debug)]
pub struct RaceFixture {
    pub race_id: RaceId,
    pub active: bool,
    pub a_total: u64,
    pub b_total: u64,
}

impl RaceFixture {
    pub fn active(race_id: u64) -> Self {
        Self {
            race_id: RaceId::new(race_id),
            active: true,
            a_total: 0,
            b_total: 0,
        }
    }

    pub fn inactive(race_id: u64) -> Self {
        Self {
            active: false,
            ..Self::active(race_id)
        }
    }

    pub fn with_totals(mut self, a_total: u64, b_total: u64) -> Self {
        self.a_total = a_total;
        self.b_total = b_total;
        self
    }

    pub fn contestant_id(&self, side: ContestantType) -> ContestantId {
        ContestantId::new(self.race_id.get() * 10 + side_offset(side))
    }

    pub fn race_contestant_id(&self, side: ContestantType) -> RaceContestantId {
        RaceContestantId::new(self.race_id.get() * 100 + side_offset(side))
    }

    pub fn race(&self) -> Race {
        Race {
            id: self.race_id,
            is_active: self.active,
            created_at: Timestamp::new(1_000),
            updated_at: Timestamp::new(1_000),
        }
    }

    pub fn contestant(&self, side: ContestantType) -> Contestant {
        let id = self.contestant_id(side);
        Contestant {
            id,
            name: format!("Toon {} {}", self.race_id, side.as_str().to_uppercase()),
            small_image_path: format!("/images/{id}-small.png"),
            large_image_path: format!("/images/{id}-large.png"),
        }
    }

    pub fn vote_total(&self, side: ContestantType) -> ContestantVoteTotal {
        ContestantVoteTotal {
            race_contestant_id: self.race_contestant_id(side),
            race_id: self.race_id,
            contestant_id: self.contestant_id(side),
            contestant_type: side,
            is_active: true,
            total: match side {
                ContestantType::A => self.a_total,
                ContestantType::B => self.b_total,
            },
        }
    }

    /// Write the race, both contestants and both rows in one transaction.
    pub fn seed<S: VoteStore>(&self, store: &S) -> Result<(), StoreError> {
        let mut txn = store.write_txn()?;
        txn.put_race(&self.race())?;
        for side in ContestantType::ALL {
            txn.put_contestant(&self.contestant(side))?;
            txn.put_vote_total(&self.vote_total(side))?;
        }
        txn.commit()
    }
}

fn side_offset(side: ContestantType) -> u64 {
    match side {
        ContestantType::A => 1,
        ContestantType::B => 2,
    }
}
