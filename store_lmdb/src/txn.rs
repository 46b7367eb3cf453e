//! Read and write transactions over the LMDB databases.
//!
//! Both transaction types expose the same read surface; the write side adds
//! the mutations. A [`LmdbWriteTxn`] dropped without [`WriteTxn::commit`]
//! aborts the underlying LMDB transaction and leaves no trace.

use std::net::IpAddr;
use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, MdbError, PutFlags, RoTxn, RwTxn};
use serde::de::DeserializeOwned;

use votatoon_store::{ActiveVoteStore, RaceStore, StoreError, TallyStore, WriteTxn};
use votatoon_types::{
    ActiveVote, ClientId, ClientVoteRecord, Contestant, ContestantId, ContestantVoteTotal, Race,
    RaceId,
};

use crate::environment::Databases;
use crate::keys::{
    active_vote_key, client_prefix, client_vote_key, decode_u64, prefix_upper_bound, race_key,
    vote_total_key, ACTIVE_RACE_KEY, CLIENT_VOTE_SEQ_KEY,
};
use crate::LmdbError;

/// A read-only snapshot of the environment.
pub struct LmdbReadTxn<'a> {
    txn: RoTxn<'a>,
    dbs: Databases,
}

impl<'a> LmdbReadTxn<'a> {
    pub(crate) fn new(txn: RoTxn<'a>, dbs: &Databases) -> Self {
        Self { txn, dbs: *dbs }
    }
}

/// An exclusive write transaction. LMDB admits one writer at a time.
pub struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    dbs: Databases,
}

impl<'a> LmdbWriteTxn<'a> {
    pub(crate) fn new(txn: RwTxn<'a>, dbs: &Databases) -> Self {
        Self { txn, dbs: *dbs }
    }
}

// ── Shared read helpers ─────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Collect every `(key, value)` pair whose key starts with `prefix`.
fn scan_prefix(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let upper = prefix_upper_bound(prefix);
    let bounds = (
        Bound::Included(prefix),
        match upper.as_deref() {
            Some(upper) => Bound::Excluded(upper),
            None => Bound::Unbounded,
        },
    );
    let iter = db.range(txn, &bounds)?;
    let mut results = Vec::new();
    for entry in iter {
        let (key, val) = entry?;
        results.push((key.to_vec(), val.to_vec()));
    }
    Ok(results)
}

fn read_race(dbs: &Databases, txn: &RoTxn, id: RaceId) -> Result<Option<Race>, LmdbError> {
    dbs.races
        .get(txn, &race_key(id))?
        .map(decode)
        .transpose()
}

fn read_active_race_id(dbs: &Databases, txn: &RoTxn) -> Result<Option<RaceId>, LmdbError> {
    dbs.meta
        .get(txn, ACTIVE_RACE_KEY)?
        .map(|bytes| decode_u64(bytes, "active_race").map(RaceId::new))
        .transpose()
}

fn read_active_race(dbs: &Databases, txn: &RoTxn) -> Result<Option<Race>, LmdbError> {
    let Some(id) = read_active_race_id(dbs, txn)? else {
        return Ok(None);
    };
    match read_race(dbs, txn, id)? {
        Some(race) if race.is_active => Ok(Some(race)),
        _ => Err(LmdbError::Corruption(format!(
            "active race pointer {id} does not reference an active race"
        ))),
    }
}

fn read_races(dbs: &Databases, txn: &RoTxn) -> Result<Vec<Race>, LmdbError> {
    let mut races = Vec::new();
    for entry in dbs.races.iter(txn)? {
        let (_key, val) = entry?;
        races.push(decode(val)?);
    }
    Ok(races)
}

fn read_contestant(
    dbs: &Databases,
    txn: &RoTxn,
    id: ContestantId,
) -> Result<Option<Contestant>, LmdbError> {
    dbs.contestants
        .get(txn, &id.to_be_bytes())?
        .map(decode)
        .transpose()
}

fn read_vote_total_rows(
    dbs: &Databases,
    txn: &RoTxn,
    race: RaceId,
) -> Result<Vec<(Vec<u8>, ContestantVoteTotal)>, LmdbError> {
    scan_prefix(&dbs.vote_totals, txn, &race_key(race))?
        .into_iter()
        .map(|(key, val)| decode(&val).map(|row| (key, row)))
        .collect()
}

fn read_active_vote(
    dbs: &Databases,
    txn: &RoTxn,
    ip: &IpAddr,
) -> Result<Option<ActiveVote>, LmdbError> {
    dbs.active_votes
        .get(txn, &active_vote_key(ip))?
        .map(decode)
        .transpose()
}

fn read_client_votes(
    dbs: &Databases,
    txn: &RoTxn,
    client: &ClientId,
) -> Result<Vec<ClientVoteRecord>, LmdbError> {
    scan_prefix(&dbs.client_votes, txn, &client_prefix(client)?)?
        .into_iter()
        .map(|(_, val)| decode(&val))
        .collect()
}

// ── Read trait impls (both transaction kinds) ───────────────────────────

macro_rules! impl_read_stores {
    ($txn:ident) => {
        impl RaceStore for $txn<'_> {
            fn race(&self, id: RaceId) -> Result<Option<Race>, StoreError> {
                Ok(read_race(&self.dbs, &self.txn, id)?)
            }

            fn active_race(&self) -> Result<Option<Race>, StoreError> {
                Ok(read_active_race(&self.dbs, &self.txn)?)
            }

            fn races(&self) -> Result<Vec<Race>, StoreError> {
                Ok(read_races(&self.dbs, &self.txn)?)
            }

            fn contestant(&self, id: ContestantId) -> Result<Option<Contestant>, StoreError> {
                Ok(read_contestant(&self.dbs, &self.txn, id)?)
            }
        }

        impl TallyStore for $txn<'_> {
            fn vote_totals(&self, race: RaceId) -> Result<Vec<ContestantVoteTotal>, StoreError> {
                let rows = read_vote_total_rows(&self.dbs, &self.txn, race)?;
                Ok(rows.into_iter().map(|(_, row)| row).collect())
            }
        }

        impl ActiveVoteStore for $txn<'_> {
            fn active_vote(&self, ip: &IpAddr) -> Result<Option<ActiveVote>, StoreError> {
                Ok(read_active_vote(&self.dbs, &self.txn, ip)?)
            }

            fn client_votes(
                &self,
                client: &ClientId,
            ) -> Result<Vec<ClientVoteRecord>, StoreError> {
                Ok(read_client_votes(&self.dbs, &self.txn, client)?)
            }
        }
    };
}

impl_read_stores!(LmdbReadTxn);
impl_read_stores!(LmdbWriteTxn);

// ── Writes ──────────────────────────────────────────────────────────────

impl WriteTxn for LmdbWriteTxn<'_> {
    fn put_race(&mut self, race: &Race) -> Result<(), StoreError> {
        let current = read_active_race_id(&self.dbs, &self.txn)?;
        if race.is_active {
            if let Some(active) = current.filter(|active| *active != race.id) {
                return Err(StoreError::Duplicate(format!(
                    "race {active} is already active"
                )));
            }
        }

        let bytes = bincode::serialize(race).map_err(LmdbError::from)?;
        self.dbs
            .races
            .put(&mut self.txn, &race_key(race.id), &bytes)
            .map_err(LmdbError::from)?;

        if race.is_active {
            self.dbs
                .meta
                .put(&mut self.txn, ACTIVE_RACE_KEY, &race.id.to_be_bytes())
                .map_err(LmdbError::from)?;
        } else if current == Some(race.id) {
            self.dbs
                .meta
                .delete(&mut self.txn, ACTIVE_RACE_KEY)
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn put_contestant(&mut self, contestant: &Contestant) -> Result<(), StoreError> {
        let bytes = bincode::serialize(contestant).map_err(LmdbError::from)?;
        self.dbs
            .contestants
            .put(&mut self.txn, &contestant.id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_vote_total(&mut self, row: &ContestantVoteTotal) -> Result<(), StoreError> {
        let bytes = bincode::serialize(row).map_err(LmdbError::from)?;
        self.dbs
            .vote_totals
            .put(
                &mut self.txn,
                &vote_total_key(row.race_id, row.race_contestant_id),
                &bytes,
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn increment_vote_total(
        &mut self,
        race: RaceId,
        contestant: ContestantId,
    ) -> Result<u64, StoreError> {
        let (key, mut row) = read_vote_total_rows(&self.dbs, &self.txn, race)?
            .into_iter()
            .find(|(_, row)| row.is_active && row.contestant_id == contestant)
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

        let bytes = bincode::serialize(&row).map_err(LmdbError::from)?;
        self.dbs
            .vote_totals
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(row.total)
    }

    fn insert_active_vote(&mut self, vote: &ActiveVote) -> Result<(), StoreError> {
        let key = active_vote_key(&vote.ip_address);

        let superseded = read_active_vote(&self.dbs, &self.txn, &vote.ip_address)?
            .is_some_and(|existing| !existing.is_active);
        if superseded {
            self.dbs
                .active_votes
                .delete(&mut self.txn, &key)
                .map_err(LmdbError::from)?;
        }

        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        match self
            .dbs
            .active_votes
            .put_with_flags(&mut self.txn, PutFlags::NO_OVERWRITE, &key, &bytes)
        {
            Ok(()) => Ok(()),
            Err(heed::Error::Mdb(MdbError::KeyExist)) => Err(StoreError::Duplicate(format!(
                "active vote for {}",
                vote.ip_address
            ))),
            Err(e) => Err(LmdbError::from(e).into()),
        }
    }

    fn append_client_vote(&mut self, record: &ClientVoteRecord) -> Result<u64, StoreError> {
        let last = self
            .dbs
            .meta
            .get(&self.txn, CLIENT_VOTE_SEQ_KEY)
            .map_err(LmdbError::from)?
            .map(|bytes| decode_u64(bytes, "client_vote_seq"))
            .transpose()?
            .unwrap_or(0);
        let sequence = last + 1;

        let stored = ClientVoteRecord {
            sequence,
            ..record.clone()
        };
        let key = client_vote_key(&stored.client_id, sequence)?;
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        self.dbs
            .client_votes
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.dbs
            .meta
            .put(&mut self.txn, CLIENT_VOTE_SEQ_KEY, &sequence.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(sequence)
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use votatoon_store::VoteStore;
    use votatoon_types::{ContestantType, RaceContestantId, Timestamp};

    fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();
        (dir, env)
    }

    fn race(id: u64, is_active: bool) -> Race {
        Race {
            id: RaceId::new(id),
            is_active,
            created_at: Timestamp::new(1_000),
            updated_at: Timestamp::new(1_000),
        }
    }

    fn row(race: u64, row: u64, contestant: u64, ty: ContestantType) -> ContestantVoteTotal {
        ContestantVoteTotal {
            race_contestant_id: RaceContestantId::new(row),
            race_id: RaceId::new(race),
            contestant_id: ContestantId::new(contestant),
            contestant_type: ty,
            is_active: true,
            total: 0,
        }
    }

    fn vote(ip: &str, client: &str) -> ActiveVote {
        ActiveVote {
            client_id: ClientId::new(client).unwrap(),
            ip_address: ip.parse().unwrap(),
            race_id: RaceId::new(1),
            contestant_id: ContestantId::new(10),
            is_active: true,
        }
    }

    #[test]
    fn races_list_in_id_order() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.put_race(&race(300, false)).unwrap();
        w.put_race(&race(2, true)).unwrap();
        w.put_race(&race(17, false)).unwrap();
        w.commit().unwrap();

        let r = env.read_txn().unwrap();
        let ids: Vec<u64> = r.races().unwrap().iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![2, 17, 300]);
        assert_eq!(r.active_race().unwrap().unwrap().id, RaceId::new(2));
    }

    #[test]
    fn second_active_race_is_rejected() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.put_race(&race(1, true)).unwrap();
        let err = w.put_race(&race(2, true)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // Deactivating the first frees the slot.
        w.put_race(&race(1, false)).unwrap();
        w.put_race(&race(2, true)).unwrap();
        w.commit().unwrap();

        let r = env.read_txn().unwrap();
        assert_eq!(r.active_race().unwrap().unwrap().id, RaceId::new(2));
    }

    #[test]
    fn no_active_race_reads_none() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.put_race(&race(1, true)).unwrap();
        w.put_race(&race(1, false)).unwrap();
        w.commit().unwrap();

        assert!(env.read_txn().unwrap().active_race().unwrap().is_none());
    }

    #[test]
    fn vote_totals_are_scoped_to_race() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.put_vote_total(&row(1, 11, 100, ContestantType::A)).unwrap();
        w.put_vote_total(&row(1, 12, 200, ContestantType::B)).unwrap();
        w.put_vote_total(&row(2, 21, 300, ContestantType::A)).unwrap();
        w.commit().unwrap();

        let r = env.read_txn().unwrap();
        assert_eq!(r.vote_totals(RaceId::new(1)).unwrap().len(), 2);
        assert_eq!(r.vote_totals(RaceId::new(2)).unwrap().len(), 1);
        assert!(r.vote_totals(RaceId::new(3)).unwrap().is_empty());
    }

    #[test]
    fn increment_touches_only_the_addressed_row() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.put_vote_total(&row(1, 11, 100, ContestantType::A)).unwrap();
        w.put_vote_total(&row(1, 12, 200, ContestantType::B)).unwrap();
        assert_eq!(
            w.increment_vote_total(RaceId::new(1), ContestantId::new(100))
                .unwrap(),
            1
        );
        assert_eq!(
            w.increment_vote_total(RaceId::new(1), ContestantId::new(100))
                .unwrap(),
            2
        );
        w.commit().unwrap();

        let r = env.read_txn().unwrap();
        let totals: Vec<u64> = r
            .vote_totals(RaceId::new(1))
            .unwrap()
            .iter()
            .map(|row| row.total)
            .collect();
        assert_eq!(totals, vec![2, 0]);
    }

    #[test]
    fn increment_missing_row_is_not_found() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        let err = w
            .increment_vote_total(RaceId::new(1), ContestantId::new(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn duplicate_active_vote_is_rejected() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.insert_active_vote(&vote("10.0.0.1", "alice")).unwrap();
        let err = w.insert_active_vote(&vote("10.0.0.1", "bob")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        w.insert_active_vote(&vote("10.0.0.2", "bob")).unwrap();
        w.commit().unwrap();
    }

    #[test]
    fn superseded_vote_is_replaced() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        let mut old = vote("10.0.0.1", "alice");
        old.is_active = false;
        w.insert_active_vote(&old).unwrap();
        w.insert_active_vote(&vote("10.0.0.1", "bob")).unwrap();
        w.commit().unwrap();

        let r = env.read_txn().unwrap();
        let stored = r.active_vote(&"10.0.0.1".parse().unwrap()).unwrap().unwrap();
        assert_eq!(stored.client_id.as_str(), "bob");
        assert!(stored.is_active);
    }

    #[test]
    fn client_history_is_sequenced_per_client() {
        let (_dir, env) = open_test_env();
        let alice = ClientId::new("alice").unwrap();
        let bob = ClientId::new("bob").unwrap();
        let record = |client: &ClientId| ClientVoteRecord {
            sequence: 0,
            client_id: client.clone(),
            contestant_id: ContestantId::new(100),
            race_id: RaceId::new(1),
            race_contestant_id: RaceContestantId::new(11),
            cast_at: Timestamp::new(5),
        };

        let mut w = env.write_txn().unwrap();
        assert_eq!(w.append_client_vote(&record(&alice)).unwrap(), 1);
        assert_eq!(w.append_client_vote(&record(&bob)).unwrap(), 2);
        assert_eq!(w.append_client_vote(&record(&alice)).unwrap(), 3);
        w.commit().unwrap();

        let r = env.read_txn().unwrap();
        let seqs: Vec<u64> = r
            .client_votes(&alice)
            .unwrap()
            .iter()
            .map(|rec| rec.sequence)
            .collect();
        assert_eq!(seqs, vec![1, 3]);
        assert_eq!(r.client_votes(&bob).unwrap().len(), 1);
    }

    #[test]
    fn dropped_write_txn_rolls_back() {
        let (_dir, env) = open_test_env();
        {
            let mut w = env.write_txn().unwrap();
            w.put_race(&race(1, true)).unwrap();
            w.insert_active_vote(&vote("10.0.0.1", "alice")).unwrap();
        }

        let r = env.read_txn().unwrap();
        assert!(r.races().unwrap().is_empty());
        assert!(r.active_vote(&"10.0.0.1".parse().unwrap()).unwrap().is_none());
    }

    #[test]
    fn read_txn_sees_a_fixed_snapshot() {
        let (_dir, env) = open_test_env();
        let mut w = env.write_txn().unwrap();
        w.put_vote_total(&row(1, 11, 100, ContestantType::A)).unwrap();
        w.commit().unwrap();

        let snapshot = env.read_txn().unwrap();
        std::thread::scope(|s| {
            s.spawn(|| {
                let mut w = env.write_txn().unwrap();
                w.increment_vote_total(RaceId::new(1), ContestantId::new(100))
                    .unwrap();
                w.commit().unwrap();
            });
        });

        assert_eq!(snapshot.vote_totals(RaceId::new(1)).unwrap()[0].total, 0);
        drop(snapshot);
        assert_eq!(
            env.read_txn().unwrap().vote_totals(RaceId::new(1)).unwrap()[0].total,
            1
        );
    }
}
