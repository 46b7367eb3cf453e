//! Race records.

use serde::{Deserialize, Serialize};

use crate::{RaceId, Timestamp};

/// A head-to-head race. At most one race is active at a time; the storage
/// layer rejects a second activation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
