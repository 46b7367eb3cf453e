//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use votatoon_races::RaceSnapshotBuilder;
use votatoon_store::VoteStore;
use votatoon_votes::VoteCoordinator;

use crate::{handlers, RpcError, RpcMetrics};

/// Everything a handler needs, shared across requests.
pub struct RpcState<S> {
    pub coordinator: Arc<VoteCoordinator<S>>,
    pub snapshots: Arc<RaceSnapshotBuilder<S>>,
    pub metrics: Option<Arc<RpcMetrics>>,
    /// Take the client address from `x-forwarded-for` instead of the peer.
    pub trust_forwarded_for: bool,
}

impl<S: VoteStore> RpcState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            coordinator: Arc::new(VoteCoordinator::new(Arc::clone(&store))),
            snapshots: Arc::new(RaceSnapshotBuilder::new(store)),
            metrics: None,
            trust_forwarded_for: false,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<RpcMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }
}

/// Build the router. `/metrics` is only mounted when metrics are enabled.
pub fn router<S: VoteStore + 'static>(state: Arc<RpcState<S>>) -> Router {
    let mut router = Router::new()
        .route("/votes/:contestant_type", post(handlers::cast_vote::<S>))
        .route("/races/current", get(handlers::current_race::<S>))
        .route("/races", get(handlers::race_list::<S>))
        .route("/crossdomain.xml", get(handlers::cross_domain_policy))
        .route("/health", get(handlers::health));
    if state.metrics.is_some() {
        router = router.route("/metrics", get(handlers::metrics::<S>));
    }
    router.layer(CorsLayer::permissive()).with_state(state)
}

pub struct RpcServer<S> {
    pub addr: SocketAddr,
    pub state: Arc<RpcState<S>>,
}

impl<S: VoteStore + 'static> RpcServer<S> {
    pub fn new(addr: SocketAddr, state: Arc<RpcState<S>>) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve<F>(
        &self,
        listener: tokio::net::TcpListener,
        shutdown: F,
    ) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.state));
        info!(addr = %listener.local_addr()?, "RPC server listening");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        info!("RPC server stopped");
        Ok(())
    }
}
