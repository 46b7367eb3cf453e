//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use votatoon_store::{StoreError, VoteStore};

use crate::keys::SCHEMA_VERSION_KEY;
use crate::migration::Migrator;
use crate::txn::{LmdbReadTxn, LmdbWriteTxn};
use crate::LmdbError;

/// Names of every database this backend creates.
pub const DATABASE_NAMES: &[&str] = &[
    "races",
    "contestants",
    "vote_totals",
    "active_votes",
    "client_votes",
    "meta",
];

/// Reader slots reserved when the caller does not choose a limit.
///
/// Read transactions are tied to the opening thread and each thread keeps
/// its slot while it lives, so this must cover every thread that may read
/// at once. It sits above tokio's default blocking pool of 512 threads.
pub const DEFAULT_MAX_READERS: u32 = 1024;

/// Handles for every named database in the environment.
#[derive(Clone, Copy)]
pub(crate) struct Databases {
    pub races: Database<Bytes, Bytes>,
    pub contestants: Database<Bytes, Bytes>,
    pub vote_totals: Database<Bytes, Bytes>,
    pub active_votes: Database<Bytes, Bytes>,
    pub client_votes: Database<Bytes, Bytes>,
    pub meta: Database<Bytes, Bytes>,
}

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) dbs: Databases,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path, create any
    /// missing databases and bring the schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        Self::open_with_readers(path, max_dbs, map_size, DEFAULT_MAX_READERS)
    }

    /// Like [`LmdbEnvironment::open`] with an explicit reader slot limit.
    pub fn open_with_readers(
        path: &Path,
        max_dbs: u32,
        map_size: usize,
        max_readers: u32,
    ) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the memory map is never accessed outside heed's safe API.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .max_readers(max_readers)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let dbs = Databases {
            races: env.create_database(&mut wtxn, Some("races"))?,
            contestants: env.create_database(&mut wtxn, Some("contestants"))?,
            vote_totals: env.create_database(&mut wtxn, Some("vote_totals"))?,
            active_votes: env.create_database(&mut wtxn, Some("active_votes"))?,
            client_votes: env.create_database(&mut wtxn, Some("client_votes"))?,
            meta: env.create_database(&mut wtxn, Some("meta"))?,
        };
        wtxn.commit()?;

        let environment = Self { env, dbs };
        Migrator::run(&environment)?;

        tracing::debug!(
            path = %path.display(),
            map_size,
            max_dbs,
            max_readers,
            "LMDB environment opened"
        );
        Ok(environment)
    }

    /// The raw heed environment.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Stored schema version; `0` for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.dbs.meta.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Corruption("schema_version has unexpected byte length".to_string())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.dbs
            .meta
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }
}

impl VoteStore for LmdbEnvironment {
    type Read<'a> = LmdbReadTxn<'a>;
    type Write<'a> = LmdbWriteTxn<'a>;

    fn read_txn(&self) -> Result<LmdbReadTxn<'_>, StoreError> {
        let txn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(LmdbReadTxn::new(txn, &self.dbs))
    }

    fn write_txn(&self) -> Result<LmdbWriteTxn<'_>, StoreError> {
        let txn = self.env.write_txn().map_err(LmdbError::from)?;
        Ok(LmdbWriteTxn::new(txn, &self.dbs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CURRENT_SCHEMA_VERSION;

    #[test]
    fn open_creates_directory_and_stamps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db");
        let env = LmdbEnvironment::open(&path, 16, 1 << 20).unwrap();
        assert!(path.join("data.mdb").exists());
        assert_eq!(env.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        {
            LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();
        assert_eq!(env.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn reader_limit_covers_the_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();
        assert!(env.env().info().maximum_number_of_readers >= DEFAULT_MAX_READERS);
    }

    #[test]
    fn explicit_reader_limit_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open_with_readers(dir.path(), 16, 1 << 20, 300).unwrap();
        assert!(env.env().info().maximum_number_of_readers >= 300);
    }
}
