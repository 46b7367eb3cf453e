//! Nullable store: thread-safe in-memory transactional storage for testing.
//!
//! Read transactions are clones of the committed state. A write transaction
//! holds the state mutex for its whole lifetime (one writer at a time, like
//! LMDB) and stages changes on a private copy that replaces the committed
//! state on commit.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use votatoon_store::{ActiveVoteStore, RaceStore, StoreError, TallyStore, VoteStore, WriteTxn};
use votatoon_types::{
    ActiveVote, ClientId, ClientVoteRecord, Contestant, ContestantId, ContestantVoteTotal, Race,
    RaceContestantId, RaceId,
};

/// A point-in-time copy of every table.
#[derive(Clone, Debug, Default)]
pub struct NullSnapshot {
    races: BTreeMap<RaceId, Race>,
    active_race: Option<RaceId>,
    contestants: HashMap<ContestantId, Contestant>,
    vote_totals: BTreeMap<(RaceId, RaceContestantId), ContestantVoteTotal>,
    active_votes: HashMap<IpAddr, ActiveVote>,
    client_votes: Vec<ClientVoteRecord>,
}

impl RaceStore for NullSnapshot {
    fn race(&self, id: RaceId) -> Result<Option<Race>, StoreError> {
        Ok(self.races.get(&id).cloned())
    }

    fn active_race(&self) -> Result<Option<Race>, StoreError> {
        Ok(self.active_race.and_then(|id| self.races.get(&id).cloned()))
    }

    fn races(&self) -> Result<Vec<Race>, StoreError> {
        Ok(self.races.values().cloned().collect())
    }

    fn contestant(&self, id: ContestantId) -> Result<Option<Contestant>, StoreError> {
        Ok(self.contestants.get(&id).cloned())
    }
}

impl TallyStore for NullSnapshot {
    fn vote_totals(&self, race: RaceId) -> Result<Vec<ContestantVoteTotal>, StoreError> {
        Ok(self
            .vote_totals
            .range((race, RaceContestantId::new(0))..=(race, RaceContestantId::new(u64::MAX)))
            .map(|(_, row)| row.clone())
            .collect())
    }
}

impl ActiveVoteStore for NullSnapshot {
    fn active_vote(&self, ip: &IpAddr) -> Result<Option<ActiveVote>, StoreError> {
        Ok(self.active_votes.get(&ip.to_canonical()).cloned())
    }

    fn client_votes(&self, client: &ClientId) -> Result<Vec<ClientVoteRecord>, StoreError> {
        Ok(self
            .client_votes
            .iter()
            .filter(|record| &record.client_id == client)
            .cloned()
            .collect())
    }
}

/// An in-memory [`VoteStore`] for testing.
#[derive(Default)]
pub struct NullVoteStore {
    committed: Mutex<NullSnapshot>,
    fail_increments: AtomicBool,
}

impl NullVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `increment_vote_total` fail with a backend
    /// error until switched off again.
    pub fn fail_increments(&self, fail: bool) {
        self.fail_increments.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, NullSnapshot>, StoreError> {
        self.committed
            .lock()
            .map_err(|_| StoreError::Backend("null store mutex poisoned".to_string()))
    }
}

impl VoteStore for NullVoteStore {
    type Read<'a> = NullSnapshot;
    type Write<'a> = NullWriteTxn<'a>;

    fn read_txn(&self) -> Result<NullSnapshot, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn write_txn(&self) -> Result<NullWriteTxn<'_>, StoreError> {
        let committed = self.lock()?;
        let staged = committed.clone();
        Ok(NullWriteTxn {
            committed,
            staged,
            fail_increments: &self.fail_increments,
        })
    }
}

/// Exclusive write transaction over a [`NullVoteStore`].
pub struct NullWriteTxn<'a> {
    committed: MutexGuard<'a, NullSnapshot>,
    staged: NullSnapshot,
    fail_increments: &'a AtomicBool,
}

impl RaceStore for NullWriteTxn<'_> {
    fn race(&self, id: RaceId) -> Result<Option<Race>, StoreError> {
        self.staged.race(id)
    }

    fn active_race(&self) -> Result<Option<Race>, StoreError> {
        self.staged.active_race()
    }

    fn races(&self) -> Result<Vec<Race>, StoreError> {
        self.staged.races()
    }

    fn contestant(&self, id: ContestantId) -> Result<Option<Contestant>, StoreError> {
        self.staged.contestant(id)
    }
}

impl TallyStore for NullWriteTxn<'_> {
    fn vote_totals(&self, race: RaceId) -> Result<Vec<ContestantVoteTotal>, StoreError> {
        self.staged.vote_totals(race)
    }
}

impl ActiveVoteStore for NullWriteTxn<'_> {
    fn active_vote(&self, ip: &IpAddr) -> Result<Option<ActiveVote>, StoreError> {
        self.staged.active_vote(ip)
    }

    fn client_votes(&self, client: &ClientId) -> Result<Vec<ClientVoteRecord>, StoreError> {
        self.staged.client_votes(client)
    }
}

impl WriteTxn for NullWriteTxn<'_> {
    fn put_race(&mut self, race: &Race) -> Result<(), StoreError> {
        let current = self.staged.active_race;
        if race.is_active {
            if let Some(active) = current.filter(|active| *active != race.id) {
                return Err(StoreError::Duplicate(format!(
                    "race {active} is already active"
                )));
            }
            self.staged.active_race = Some(race.id);
        } else if current == Some(race.id) {
            self.staged.active_race = None;
        }
        self.staged.races.insert(race.id, race.clone());
        Ok(())
    }

    fn put_contestant(&mut self, contestant: &Contestant) -> Result<(), StoreError> {
        self.staged
            .contestants
            .insert(contestant.id, contestant.clone());
        Ok(())
    }

    fn put_vote_total(&mut self, row: &ContestantVoteTotal) -> Result<(), StoreError> {
        self.staged
            .vote_totals
            .insert((row.race_id, row.race_contestant_id), row.clone());
        Ok(())
    }

    fn increment_vote_total(
        &mut self,
        race: RaceId,
        contestant: ContestantId,
    ) -> Result<u64, StoreError> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected increment failure".to_string()));
        }
        let row = self
            .staged
            .vote_totals
            .values_mut()
            .find(|row| row.race_id == race && row.is_active && row.contestant_id == contestant)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "vote total for contestant {contestant} in race {race}"
                ))
            })?;
        row.total = row.total.checked_add(1).ok_or_else(|| {
            StoreError::Corruption(format!(
                "vote total overflow for contestant {contestant} in race {race}"
            ))
        })?;
        Ok(row.total)
    }

    fn insert_active_vote(&mut self, vote: &ActiveVote) -> Result<(), StoreError> {
        let key = vote.ip_address.to_canonical();
        if self
            .staged
            .active_votes
            .get(&key)
            .is_some_and(|existing| existing.is_active)
        {
            return Err(StoreError::Duplicate(format!(
                "active vote for {}",
                vote.ip_address
            )));
        }
        self.staged.active_votes.insert(key, vote.clone());
        Ok(())
    }

    fn append_client_vote(&mut self, record: &ClientVoteRecord) -> Result<u64, StoreError> {
        let sequence = self
            .staged
            .client_votes
            .last()
            .map_or(1, |last| last.sequence + 1);
        self.staged.client_votes.push(ClientVoteRecord {
            sequence,
            ..record.clone()
        });
        Ok(sequence)
    }

    fn commit(mut self) -> Result<(), StoreError> {
        *self.committed = std::mem::take(&mut self.staged);
        Ok(())
    }
}
