//! Vote casting coordinator.

use std::sync::Arc;

use serde::Serialize;

use votatoon_store::{RaceStore, VoteStore, WriteTxn};
use votatoon_types::{ClientContext, ContestantType, Timestamp};

use crate::{Ballot, ClientVoteRegistry, ContestantVoteLedger, VoteError};

/// Confirmation returned to the caller after a successful cast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    pub success: bool,
    pub message: String,
}

impl VoteReceipt {
    fn cast() -> Self {
        Self {
            success: true,
            message: "The vote has been cast".to_string(),
        }
    }
}

/// Orchestrates a cast across the registry and the ledger.
pub struct VoteCoordinator<S> {
    store: Arc<S>,
    ledger: ContestantVoteLedger,
    registry: ClientVoteRegistry,
}

impl<S: VoteStore> VoteCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            ledger: ContestantVoteLedger,
            registry: ClientVoteRegistry,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Cast one vote for `side` in the active race on behalf of `client`.
    pub fn cast_vote(
        &self,
        side: ContestantType,
        client: &ClientContext,
    ) -> Result<VoteReceipt, VoteError> {
        self.cast_vote_at(side, client, Timestamp::now())
    }

    /// [`Self::cast_vote`] with an explicit timestamp for the history row.
    ///
    /// Runs in a single write transaction: either the active vote, the
    /// history row and the increment are all committed, or nothing is. No
    /// retry is attempted on failure.
    pub fn cast_vote_at(
        &self,
        side: ContestantType,
        client: &ClientContext,
        now: Timestamp,
    ) -> Result<VoteReceipt, VoteError> {
        tracing::debug!(contestant_type = %side, client = %client.client_id, "casting vote");

        let result = self.try_cast(side, client, now);
        match &result {
            Ok(_) => {}
            Err(VoteError::Internal(cause)) => tracing::error!(
                contestant_type = %side,
                client = %client.client_id,
                ip = %client.ip_address,
                %cause,
                "vote cast failed"
            ),
            Err(e @ VoteError::RecordsInconsistent { .. }) => tracing::error!(
                contestant_type = %side,
                error = %e,
                "vote cast aborted by inconsistent records"
            ),
            Err(e) => tracing::warn!(
                contestant_type = %side,
                client = %client.client_id,
                ip = %client.ip_address,
                error = %e,
                "vote rejected"
            ),
        }
        result
    }

    fn try_cast(
        &self,
        side: ContestantType,
        client: &ClientContext,
        now: Timestamp,
    ) -> Result<VoteReceipt, VoteError> {
        // Write transactions are serialised, so everything below observes and
        // mutates one consistent state.
        let mut txn = self.store.write_txn()?;

        let race = txn
            .active_race()?
            .ok_or(VoteError::NoActiveContestant(side))?;
        let row = self.ledger.totals_for(&txn, race.id)?.side(side).clone();

        if self.registry.has_active_vote(&txn, &client.ip_address)? {
            return Err(VoteError::DuplicateVote);
        }

        let ballot = Ballot {
            client: client.clone(),
            race_id: row.race_id,
            contestant_id: row.contestant_id,
            race_contestant_id: row.race_contestant_id,
        };
        self.registry.register_vote(&mut txn, &ballot, now)?;
        let total = self
            .ledger
            .increment(&mut txn, row.race_id, row.contestant_id)?;
        txn.commit()?;

        tracing::info!(
            race_id = %row.race_id,
            contestant_id = %row.contestant_id,
            contestant_type = %side,
            client = %client.client_id,
            total,
            "vote cast"
        );
        Ok(VoteReceipt::cast())
    }
}
