//! Race and contestant metadata.

use crate::StoreError;
use votatoon_types::{Contestant, ContestantId, Race, RaceId};

/// Read access to administrative race/contestant metadata.
pub trait RaceStore {
    fn race(&self, id: RaceId) -> Result<Option<Race>, StoreError>;

    /// The single active race, if any.
    fn active_race(&self) -> Result<Option<Race>, StoreError>;

    /// All races in listing order (ascending id).
    fn races(&self) -> Result<Vec<Race>, StoreError>;

    fn contestant(&self, id: ContestantId) -> Result<Option<Contestant>, StoreError>;
}
