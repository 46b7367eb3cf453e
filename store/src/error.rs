use thiserror::Error;

/// Failures surfaced by any storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A race, contestant or tally row that should exist is absent.
    #[error("no stored record for {0}")]
    NotFound(String),

    /// An insert collided with an existing row, e.g. a second active vote
    /// for the same voter address.
    #[error("record already stored for {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored record could not be encoded or decoded: {0}")]
    Serialization(String),

    /// Stored bytes exist but violate the layout the store writes.
    #[error("vote store is corrupt: {0}")]
    Corruption(String),
}
