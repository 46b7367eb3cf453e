//! Contestant vote ledger: the single source of truth for tallies.

use votatoon_store::{ReadTxn, VoteStore, WriteTxn};
use votatoon_types::{ContestantId, ContestantType, ContestantVoteTotal, RaceId};

use crate::VoteError;

/// A race's validated pair of vote-total rows, in canonical A/B order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteTotals {
    pub race_id: RaceId,
    pub a: ContestantVoteTotal,
    pub b: ContestantVoteTotal,
}

impl VoteTotals {
    pub fn side(&self, side: ContestantType) -> &ContestantVoteTotal {
        match side {
            ContestantType::A => &self.a,
            ContestantType::B => &self.b,
        }
    }

    pub fn a_total(&self) -> u64 {
        self.a.total
    }

    pub fn b_total(&self) -> u64 {
        self.b.total
    }

    /// Validate `rows` as the tally of `race_id`.
    ///
    /// Only active rows count. There must be exactly two, both belonging to
    /// `race_id`, and after sorting by contestant type the first must be `A`
    /// and the second `B`. Insertion order does not matter.
    pub fn from_rows(race_id: RaceId, rows: Vec<ContestantVoteTotal>) -> Result<Self, VoteError> {
        let mut active: Vec<ContestantVoteTotal> =
            rows.into_iter().filter(|row| row.is_active).collect();

        if active.len() != 2 {
            return Err(VoteError::inconsistent(
                race_id,
                format!("expected 2 active vote total records, found {}", active.len()),
            ));
        }
        if let Some(stray) = active.iter().find(|row| row.race_id != race_id) {
            return Err(VoteError::inconsistent(
                race_id,
                format!("record {} belongs to race {}", stray.race_contestant_id, stray.race_id),
            ));
        }

        active.sort_by_key(|row| row.contestant_type);
        let b = active.pop();
        let a = active.pop();
        match (a, b) {
            (Some(a), Some(b))
                if a.contestant_type == ContestantType::A
                    && b.contestant_type == ContestantType::B =>
            {
                Ok(Self { race_id, a, b })
            }
            (Some(a), _) if a.contestant_type != ContestantType::A => Err(
                VoteError::inconsistent(race_id, "the first record is not for contestant A"),
            ),
            _ => Err(VoteError::inconsistent(
                race_id,
                "the second record is not for contestant B",
            )),
        }
    }
}

/// Reads and increments per-contestant totals.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContestantVoteLedger;

impl ContestantVoteLedger {
    /// Add exactly one vote to `(race, contestant)` inside `txn`.
    ///
    /// Atomic with respect to other writers because write transactions are
    /// serialised by the store.
    pub fn increment<W: WriteTxn>(
        &self,
        txn: &mut W,
        race: RaceId,
        contestant: ContestantId,
    ) -> Result<u64, VoteError> {
        let total = txn.increment_vote_total(race, contestant)?;
        tracing::debug!(race_id = %race, contestant_id = %contestant, total, "vote total incremented");
        Ok(total)
    }

    /// The validated `[A, B]` totals of `race` as seen by `txn`.
    pub fn totals_for<R: ReadTxn>(&self, txn: &R, race: RaceId) -> Result<VoteTotals, VoteError> {
        let rows = txn.vote_totals(race)?;
        VoteTotals::from_rows(race, rows).inspect_err(|e| {
            tracing::error!(race_id = %race, error = %e, "vote total records failed validation");
        })
    }

    /// [`Self::totals_for`] in a fresh read transaction.
    pub fn read_totals<S: VoteStore>(&self, store: &S, race: RaceId) -> Result<VoteTotals, VoteError> {
        let txn = store.read_txn()?;
        self.totals_for(&txn, race)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votatoon_nullables::{NullVoteStore, RaceFixture};
    use votatoon_types::RaceContestantId;

    fn row(race: u64, id: u64, side: ContestantType, total: u64) -> ContestantVoteTotal {
        ContestantVoteTotal {
            race_contestant_id: RaceContestantId::new(id),
            race_id: RaceId::new(race),
            contestant_id: ContestantId::new(id),
            contestant_type: side,
            is_active: true,
            total,
        }
    }

    fn reason(err: VoteError) -> String {
        match err {
            VoteError::RecordsInconsistent { reason, .. } => reason,
            other => panic!("expected RecordsInconsistent, got {other:?}"),
        }
    }

    #[test]
    fn canonical_order_ignores_insertion_order() {
        let totals = VoteTotals::from_rows(
            RaceId::new(7),
            vec![row(7, 2, ContestantType::B, 10), row(7, 1, ContestantType::A, 30)],
        )
        .unwrap();
        assert_eq!(totals.a_total(), 30);
        assert_eq!(totals.b_total(), 10);
        assert_eq!(totals.side(ContestantType::B).race_contestant_id, RaceContestantId::new(2));
    }

    #[test]
    fn single_row_is_inconsistent() {
        let err = VoteTotals::from_rows(RaceId::new(7), vec![row(7, 1, ContestantType::A, 0)])
            .unwrap_err();
        assert!(reason(err).contains("found 1"));
    }

    #[test]
    fn inactive_rows_do_not_count() {
        let mut stale = row(7, 3, ContestantType::A, 99);
        stale.is_active = false;
        let totals = VoteTotals::from_rows(
            RaceId::new(7),
            vec![
                stale,
                row(7, 1, ContestantType::A, 1),
                row(7, 2, ContestantType::B, 2),
            ],
        )
        .unwrap();
        assert_eq!(totals.a.race_contestant_id, RaceContestantId::new(1));
    }

    #[test]
    fn three_active_rows_are_inconsistent() {
        let err = VoteTotals::from_rows(
            RaceId::new(7),
            vec![
                row(7, 1, ContestantType::A, 0),
                row(7, 2, ContestantType::B, 0),
                row(7, 3, ContestantType::B, 0),
            ],
        )
        .unwrap_err();
        assert!(reason(err).contains("found 3"));
    }

    #[test]
    fn same_type_twice_is_inconsistent() {
        let both_a = VoteTotals::from_rows(
            RaceId::new(7),
            vec![row(7, 1, ContestantType::A, 0), row(7, 2, ContestantType::A, 0)],
        )
        .unwrap_err();
        assert!(reason(both_a).contains("contestant B"));

        let both_b = VoteTotals::from_rows(
            RaceId::new(7),
            vec![row(7, 1, ContestantType::B, 0), row(7, 2, ContestantType::B, 0)],
        )
        .unwrap_err();
        assert!(reason(both_b).contains("contestant A"));
    }

    #[test]
    fn foreign_race_row_is_inconsistent() {
        let err = VoteTotals::from_rows(
            RaceId::new(7),
            vec![row(7, 1, ContestantType::A, 0), row(8, 2, ContestantType::B, 0)],
        )
        .unwrap_err();
        assert!(reason(err).contains("belongs to race 8"));
    }

    #[test]
    fn increment_adds_exactly_one() {
        let store = NullVoteStore::new();
        let fixture = RaceFixture::active(7).with_totals(30, 10);
        fixture.seed(&store).unwrap();
        let ledger = ContestantVoteLedger;

        let mut txn = store.write_txn().unwrap();
        let total = ledger
            .increment(&mut txn, fixture.race_id, fixture.contestant_id(ContestantType::B))
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(total, 11);
        let totals = ledger.read_totals(&store, fixture.race_id).unwrap();
        assert_eq!((totals.a_total(), totals.b_total()), (30, 11));
    }

    #[test]
    fn unknown_race_reads_as_inconsistent() {
        let store = NullVoteStore::new();
        let err = ContestantVoteLedger
            .read_totals(&store, RaceId::new(404))
            .unwrap_err();
        assert!(reason(err).contains("found 0"));
    }
}
