//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano: storage is
//! abstracted behind the `votatoon-store` traits, and this crate provides an
//! implementation that:
//! - keeps everything in memory and never touches the filesystem
//! - honours the same transaction semantics as the LMDB backend
//! - can be told to fail, to exercise rollback paths
//!
//! [`RaceFixture`] seeds well-formed races into any store, LMDB included.
//!
//! Usage: swap the LMDB environment for a [`NullVoteStore`] in tests.

pub mod fixtures;
pub mod store;

pub use fixtures::RaceFixture;
pub use store::{NullSnapshot, NullVoteStore, NullWriteTxn};
