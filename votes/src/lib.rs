//! Vote casting and tally consistency.
//!
//! Three pieces, leaf-first:
//! - [`ContestantVoteLedger`] owns the per-contestant running totals and
//!   validates a race's pair of rows on every read.
//! - [`ClientVoteRegistry`] owns the one-active-vote-per-address rule and the
//!   append-only vote history.
//! - [`VoteCoordinator`] casts a vote: resolves the contestant, consults the
//!   registry, then registers and increments inside one write transaction.
//!
//! All storage goes through `votatoon-store`; correctness under concurrency
//! comes from the store's transactions, not from in-process locks.

pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod registry;

pub use coordinator::{VoteCoordinator, VoteReceipt};
pub use error::VoteError;
pub use ledger::{ContestantVoteLedger, VoteTotals};
pub use registry::{Ballot, ClientVoteRegistry};
