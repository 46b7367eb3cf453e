//! Vote tallies, active votes and the per-client audit trail.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::{ClientId, ContestantId, ContestantType, RaceContestantId, RaceId, Timestamp};

/// Running vote total for one contestant in one race.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestantVoteTotal {
    pub race_contestant_id: RaceContestantId,
    pub race_id: RaceId,
    pub contestant_id: ContestantId,
    pub contestant_type: ContestantType,
    pub is_active: bool,
    /// Only ever incremented.
    pub total: u64,
}

/// The vote currently counted for a network address.
///
/// At most one active row may exist per `ip_address`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveVote {
    pub client_id: ClientId,
    pub ip_address: IpAddr,
    pub race_id: RaceId,
    pub contestant_id: ContestantId,
    pub is_active: bool,
}

/// Append-only audit record, one per successful cast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientVoteRecord {
    /// Assigned by the store on append; strictly increasing.
    pub sequence: u64,
    pub client_id: ClientId,
    pub contestant_id: ContestantId,
    pub race_id: RaceId,
    pub race_contestant_id: RaceContestantId,
    pub cast_at: Timestamp,
}

/// Caller identity supplied by the request context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientContext {
    pub client_id: ClientId,
    pub ip_address: IpAddr,
}

impl ClientContext {
    pub fn new(client_id: ClientId, ip_address: IpAddr) -> Self {
        Self {
            client_id,
            ip_address,
        }
    }
}
