//! Client vote registry: one active vote per network address.

use std::net::IpAddr;

use votatoon_store::{ReadTxn, StoreError, WriteTxn};
use votatoon_types::{
    ActiveVote, ClientContext, ClientId, ClientVoteRecord, ContestantId, RaceContestantId, RaceId,
    Timestamp,
};

use crate::VoteError;

/// Everything needed to record one cast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub client: ClientContext,
    pub race_id: RaceId,
    pub contestant_id: ContestantId,
    pub race_contestant_id: RaceContestantId,
}

/// Tracks which addresses hold an active vote and keeps the audit trail.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientVoteRegistry;

impl ClientVoteRegistry {
    /// Whether `ip` currently holds an active vote, as seen by `txn`.
    ///
    /// Only a fast path: a concurrent caller can still win between this check
    /// and [`Self::register_vote`], which is where the rule is enforced.
    pub fn has_active_vote<R: ReadTxn>(&self, txn: &R, ip: &IpAddr) -> Result<bool, VoteError> {
        Ok(txn.active_vote(ip)?.is_some_and(|vote| vote.is_active))
    }

    /// Record `ballot` as the active vote for its address and append one
    /// history row. Returns the history sequence number.
    ///
    /// Fails with [`VoteError::DuplicateVote`] when the store's uniqueness
    /// check rejects the insert.
    pub fn register_vote<W: WriteTxn>(
        &self,
        txn: &mut W,
        ballot: &Ballot,
        now: Timestamp,
    ) -> Result<u64, VoteError> {
        let vote = ActiveVote {
            client_id: ballot.client.client_id.clone(),
            ip_address: ballot.client.ip_address,
            race_id: ballot.race_id,
            contestant_id: ballot.contestant_id,
            is_active: true,
        };
        match txn.insert_active_vote(&vote) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(VoteError::DuplicateVote),
            Err(e) => return Err(e.into()),
        }

        let sequence = txn.append_client_vote(&ClientVoteRecord {
            sequence: 0,
            client_id: ballot.client.client_id.clone(),
            contestant_id: ballot.contestant_id,
            race_id: ballot.race_id,
            race_contestant_id: ballot.race_contestant_id,
            cast_at: now,
        })?;
        Ok(sequence)
    }

    /// A client's vote history, oldest first.
    pub fn history<R: ReadTxn>(
        &self,
        txn: &R,
        client: &ClientId,
    ) -> Result<Vec<ClientVoteRecord>, VoteError> {
        Ok(txn.client_votes(client)?)
    }
}
