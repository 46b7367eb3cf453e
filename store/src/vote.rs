//! Active votes and the client vote history.

use std::net::IpAddr;

use crate::StoreError;
use votatoon_types::{ActiveVote, ClientId, ClientVoteRecord};

/// Read access to active votes and the audit trail.
pub trait ActiveVoteStore {
    /// The vote row stored for `ip`, active or superseded.
    fn active_vote(&self, ip: &IpAddr) -> Result<Option<ActiveVote>, StoreError>;

    /// History for one client, oldest first.
    fn client_votes(&self, client: &ClientId) -> Result<Vec<ClientVoteRecord>, StoreError>;
}
