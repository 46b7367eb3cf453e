//! Race snapshot builder.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use votatoon_store::{RaceStore, ReadTxn, VoteStore};
use votatoon_types::{Contestant, ContestantVoteTotal, Race, RaceId};
use votatoon_votes::{ContestantVoteLedger, VoteError};

use crate::vote_percentages;

/// Standings of one race at a single point in time.
///
/// Field names on the wire follow the public race DTO.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceSnapshot {
    pub id: RaceId,
    pub index: usize,
    #[serde(rename = "toonA")]
    pub toon_a: String,
    #[serde(rename = "toonB")]
    pub toon_b: String,
    pub a_votes_percent: u32,
    pub b_votes_percent: u32,
    pub a_votes_total: u64,
    pub b_votes_total: u64,
    pub a_small_image_path: String,
    pub b_small_image_path: String,
    pub a_large_image_path: String,
    pub b_large_image_path: String,
    pub active: bool,
}

/// Builds [`RaceSnapshot`]s from the ledger's validated totals.
///
/// Every call reads inside one read transaction, so the two totals of a race
/// (and every race of a list) come from the same committed state.
pub struct RaceSnapshotBuilder<S> {
    store: Arc<S>,
    ledger: ContestantVoteLedger,
}

impl<S: VoteStore> RaceSnapshotBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ledger: ContestantVoteLedger,
        }
    }

    /// Standings of the active race.
    pub fn current_race(&self) -> Result<RaceSnapshot, VoteError> {
        let txn = self.store.read_txn()?;
        let race = txn.active_race()?.ok_or(VoteError::NoActiveRace)?;
        self.build(&txn, &race, 0)
    }

    /// Standings of every race in listing order.
    ///
    /// Fails on the first race whose records are inconsistent; the error
    /// names that race.
    pub fn race_list(&self) -> Result<Vec<RaceSnapshot>, VoteError> {
        let txn = self.store.read_txn()?;
        let races = txn.races()?;
        tracing::debug!(races = races.len(), "building race list");
        races
            .iter()
            .enumerate()
            .map(|(index, race)| self.build(&txn, race, index))
            .collect()
    }

    fn build<R: ReadTxn>(
        &self,
        txn: &R,
        race: &Race,
        index: usize,
    ) -> Result<RaceSnapshot, VoteError> {
        let totals = self.ledger.totals_for(txn, race.id)?;
        let a = contestant(txn, &totals.a)?;
        let b = contestant(txn, &totals.b)?;
        let (a_votes_percent, b_votes_percent) =
            vote_percentages(totals.a_total(), totals.b_total());

        Ok(RaceSnapshot {
            id: race.id,
            index,
            toon_a: a.name,
            toon_b: b.name,
            a_votes_percent,
            b_votes_percent,
            a_votes_total: totals.a_total(),
            b_votes_total: totals.b_total(),
            a_small_image_path: a.small_image_path,
            b_small_image_path: b.small_image_path,
            a_large_image_path: a.large_image_path,
            b_large_image_path: b.large_image_path,
            active: race.is_active,
        })
    }
}

fn contestant<R: ReadTxn>(txn: &R, row: &ContestantVoteTotal) -> Result<Contestant, VoteError> {
    txn.contestant(row.contestant_id)?.ok_or_else(|| {
        tracing::error!(
            race_id = %row.race_id,
            contestant_id = %row.contestant_id,
            "vote total references a missing contestant"
        );
        VoteError::inconsistent(
            row.race_id,
            format!("contestant {} has no record", row.contestant_id),
        )
    })
}
