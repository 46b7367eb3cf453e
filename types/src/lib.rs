//! Fundamental types for the Votatoon voting core.
//!
//! This crate defines the records shared across every other crate in the
//! workspace: identifiers, contestant sides, timestamps, and the storage-agnostic
//! entities (races, contestants, vote totals, active votes, vote history).

pub mod contestant;
pub mod error;
pub mod id;
pub mod race;
pub mod time;
pub mod vote;

pub use contestant::{Contestant, ContestantType};
pub use error::TypesError;
pub use id::{ClientId, ContestantId, RaceContestantId, RaceId};
pub use race::Race;
pub use time::Timestamp;
pub use vote::{ActiveVote, ClientContext, ClientVoteRecord, ContestantVoteTotal};
