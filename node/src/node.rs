//! Node lifecycle: open storage, serve HTTP, shut down cleanly.

use std::sync::Arc;

use tokio::net::TcpListener;

use votatoon_rpc::{RpcMetrics, RpcServer, RpcState};
use votatoon_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};

use crate::{NodeConfig, NodeError, ShutdownController};

/// A running Votatoon node.
pub struct VoteNode {
    pub config: NodeConfig,
    pub store: Arc<LmdbEnvironment>,
    pub rpc_state: Arc<RpcState<LmdbEnvironment>>,
    pub shutdown: Arc<ShutdownController>,
}

impl VoteNode {
    /// Validate the data directory, open LMDB and prepare the HTTP state.
    ///
    /// Refuses to start on a directory that looks damaged or whose
    /// databases fail the integrity check.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        check_data_dir(&config.data_dir).map_err(NodeError::DataDir)?;
        let store = LmdbEnvironment::open_with_readers(
            &config.data_dir,
            config.max_dbs,
            config.map_size_bytes(),
            config.max_readers,
        )?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            schema_version = store.schema_version()?,
            "LMDB environment opened"
        );

        let report = check_integrity(store.env())?;
        if !report.is_healthy() {
            for error in &report.errors {
                tracing::error!(%error, "integrity check");
            }
            return Err(NodeError::Integrity(report.errors.join("; ")));
        }
        tracing::debug!(
            databases = report.databases_checked,
            entries = report.total_entries,
            "integrity check passed"
        );

        let store = Arc::new(store);
        let mut state =
            RpcState::new(Arc::clone(&store)).trust_forwarded_for(config.trust_forwarded_for);
        if config.enable_metrics {
            let metrics = RpcMetrics::new().map_err(|e| NodeError::Metrics(e.to_string()))?;
            state = state.with_metrics(Arc::new(metrics));
        }

        Ok(Self {
            config,
            store,
            rpc_state: Arc::new(state),
            shutdown: Arc::new(ShutdownController::new()),
        })
    }

    /// Bind the configured address and serve until SIGINT/SIGTERM or
    /// [`Self::stop`].
    pub async fn start(&self) -> Result<(), NodeError> {
        let listener = TcpListener::bind(self.config.rpc_addr()).await?;

        let signals = Arc::clone(&self.shutdown);
        tokio::spawn(async move { signals.wait_for_signal().await });

        self.serve(listener).await
    }

    /// Serve on `listener` until shutdown, then flush LMDB to disk.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), NodeError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            %addr,
            metrics = self.config.enable_metrics,
            trust_forwarded_for = self.config.trust_forwarded_for,
            "Votatoon node started"
        );

        let server = RpcServer::new(addr, Arc::clone(&self.rpc_state));
        server.serve(listener, self.shutdown.signalled()).await?;

        self.flush()?;
        tracing::info!("Votatoon node stopped");
        Ok(())
    }

    /// Ask a running node to stop.
    pub fn stop(&self) {
        tracing::info!("Votatoon node stopping");
        self.shutdown.shutdown();
    }

    fn flush(&self) -> Result<(), NodeError> {
        self.store
            .env()
            .force_sync()
            .map_err(votatoon_store_lmdb::LmdbError::from)?;
        tracing::debug!("LMDB environment synced");
        Ok(())
    }
}
