//! Abstract storage traits for the Votatoon voting core.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The voting core depends only on the traits and on the
//! transactional guarantees they promise:
//!
//! - a [`ReadTxn`] observes one consistent point in time;
//! - [`WriteTxn`]s are serialised by the backend and apply all-or-nothing;
//! - [`WriteTxn::insert_active_vote`] enforces uniqueness of active votes per
//!   network address at commit scope, independent of any earlier check.

pub mod error;
pub mod race;
pub mod tally;
pub mod txn;
pub mod vote;

pub use error::StoreError;
pub use race::RaceStore;
pub use tally::TallyStore;
pub use txn::{ReadTxn, VoteStore, WriteTxn};
pub use vote::ActiveVoteStore;
