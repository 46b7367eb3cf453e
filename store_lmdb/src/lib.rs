//! LMDB storage backend for the Votatoon voting core.
//!
//! Implements the `votatoon-store` traits using the `heed` LMDB bindings.
//! Each logical store maps to one LMDB database within a single environment.
//! LMDB allows one writer at a time, so every [`LmdbWriteTxn`] is serialised
//! against all others; readers see an MVCC snapshot and never block writers.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod migration;
pub mod txn;

pub use environment::{LmdbEnvironment, DATABASE_NAMES, DEFAULT_MAX_READERS};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use txn::{LmdbReadTxn, LmdbWriteTxn};
