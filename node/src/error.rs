use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("data directory error: {0}")]
    DataDir(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] votatoon_store_lmdb::LmdbError),

    #[error("store error: {0}")]
    Store(#[from] votatoon_store::StoreError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] votatoon_rpc::RpcError),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
