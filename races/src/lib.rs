//! Race standings.
//!
//! [`RaceSnapshotBuilder`] reads a race's validated totals through the
//! vote ledger's read contract and combines them with contestant metadata.
//! It never writes, and nothing in `votatoon-votes` depends on it.

pub mod percent;
pub mod snapshot;

pub use percent::vote_percentages;
pub use snapshot::{RaceSnapshot, RaceSnapshotBuilder};
