//! Transaction handles.

use votatoon_types::{
    ActiveVote, ClientVoteRecord, Contestant, ContestantId, ContestantVoteTotal, Race, RaceId,
};

use crate::{ActiveVoteStore, RaceStore, StoreError, TallyStore};

/// A consistent, point-in-time view over every store.
pub trait ReadTxn: RaceStore + TallyStore + ActiveVoteStore {}

impl<T: RaceStore + TallyStore + ActiveVoteStore> ReadTxn for T {}

/// A writable transaction. Nothing is visible to other transactions until
/// [`WriteTxn::commit`]; dropping the handle discards every change.
pub trait WriteTxn: ReadTxn {
    /// Insert or replace a race.
    ///
    /// Fails with [`StoreError::Duplicate`] when `race` is active and a
    /// different race is already active.
    fn put_race(&mut self, race: &Race) -> Result<(), StoreError>;

    fn put_contestant(&mut self, contestant: &Contestant) -> Result<(), StoreError>;

    /// Insert or replace a vote-total row, keyed by its race contestant id.
    fn put_vote_total(&mut self, row: &ContestantVoteTotal) -> Result<(), StoreError>;

    /// Add one vote to the row for `(race, contestant)` and return the new
    /// total. [`StoreError::NotFound`] if no such row exists.
    fn increment_vote_total(
        &mut self,
        race: RaceId,
        contestant: ContestantId,
    ) -> Result<u64, StoreError>;

    /// Insert the vote for `vote.ip_address`.
    ///
    /// Fails with [`StoreError::Duplicate`] if an active vote already exists
    /// for that address. A superseded (inactive) row is replaced.
    fn insert_active_vote(&mut self, vote: &ActiveVote) -> Result<(), StoreError>;

    /// Append to the history. The store assigns `record.sequence`; the
    /// assigned value is returned.
    fn append_client_vote(&mut self, record: &ClientVoteRecord) -> Result<u64, StoreError>;

    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A transactional store.
pub trait VoteStore: Send + Sync {
    type Read<'a>: ReadTxn
    where
        Self: 'a;

    type Write<'a>: WriteTxn
    where
        Self: 'a;

    fn read_txn(&self) -> Result<Self::Read<'_>, StoreError>;

    /// Begin a write transaction. Blocks while another write is in flight.
    fn write_txn(&self) -> Result<Self::Write<'_>, StoreError>;
}
