//! Per-contestant vote totals.

use crate::StoreError;
use votatoon_types::{ContestantVoteTotal, RaceId};

/// Read access to vote-total rows.
pub trait TallyStore {
    /// Every row recorded for `race`, active or not, in storage order.
    ///
    /// No filtering or validation happens here; the ledger owns that.
    fn vote_totals(&self, race: RaceId) -> Result<Vec<ContestantVoteTotal>, StoreError>;
}
