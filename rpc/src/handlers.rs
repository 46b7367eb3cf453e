//! RPC request handlers.
//!
//! The voting core is synchronous and talks to storage directly, so every
//! call into it runs on the blocking pool.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use votatoon_races::RaceSnapshot;
use votatoon_store::VoteStore;
use votatoon_types::{ClientContext, ClientId, ContestantType, TypesError};
use votatoon_votes::{VoteError, VoteReceipt};

use crate::{RpcError, RpcState};

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

pub const CROSS_DOMAIN_POLICY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<cross-domain-policy>
  <allow-access-from domain="*"/>
</cross-domain-policy>"#;

type SharedState<S> = State<Arc<RpcState<S>>>;

async fn blocking<T, F>(f: F) -> Result<T, RpcError>
where
    F: FnOnce() -> Result<T, VoteError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RpcError::Worker(e.to_string()))?
        .map_err(RpcError::from)
}

// ── Votes ────────────────────────────────────────────────────────────────

/// `POST /votes/:contestant_type`
pub async fn cast_vote<S: VoteStore + 'static>(
    State(state): SharedState<S>,
    Path(contestant_type): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<VoteReceipt>, RpcError> {
    let side: ContestantType = contestant_type
        .parse()
        .map_err(|_| RpcError::InvalidContestantType(contestant_type))?;
    let client = client_context(&headers, peer.map(|ConnectInfo(addr)| addr), state.trust_forwarded_for)?;

    let started = Instant::now();
    let coordinator = Arc::clone(&state.coordinator);
    let result = blocking(move || coordinator.cast_vote(side, &client)).await;

    if let Some(metrics) = &state.metrics {
        metrics
            .cast_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        match &result {
            Ok(_) => metrics.votes_cast.inc(),
            Err(e) => metrics.votes_rejected.with_label_values(&[e.code()]).inc(),
        }
    }
    result.map(Json)
}

/// Resolve the caller from request headers and the peer address.
pub fn client_context(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> Result<ClientContext, RpcError> {
    let client_id = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(RpcError::MissingClientId)
        .and_then(|raw| {
            ClientId::new(raw).map_err(|e| match e {
                TypesError::EmptyClientId => RpcError::MissingClientId,
                other => RpcError::InvalidClientId(other.to_string()),
            })
        })?;

    let forwarded = if trust_forwarded_for {
        forwarded_for(headers)
    } else {
        None
    };
    let ip = forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .ok_or(RpcError::MissingClientAddress)?;

    Ok(ClientContext::new(client_id, ip))
}

/// First address of `x-forwarded-for`, if it parses.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let raw = headers.get(FORWARDED_FOR_HEADER)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    match first.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            warn!(value = raw, "ignoring unparseable x-forwarded-for");
            None
        }
    }
}

// ── Races ────────────────────────────────────────────────────────────────

/// `GET /races/current`
pub async fn current_race<S: VoteStore + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<RaceSnapshot>, RpcError> {
    let snapshots = Arc::clone(&state.snapshots);
    let result = blocking(move || snapshots.current_race()).await;
    count_snapshot_error(&state, &result);
    result.map(Json)
}

/// `GET /races`
pub async fn race_list<S: VoteStore + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<Vec<RaceSnapshot>>, RpcError> {
    let snapshots = Arc::clone(&state.snapshots);
    let result = blocking(move || snapshots.race_list()).await;
    count_snapshot_error(&state, &result);
    result.map(Json)
}

fn count_snapshot_error<S, T>(state: &RpcState<S>, result: &Result<T, RpcError>) {
    if let (Some(metrics), Err(_)) = (&state.metrics, result) {
        metrics.snapshot_errors.inc();
    }
}

// ── Misc ─────────────────────────────────────────────────────────────────

/// `GET /crossdomain.xml`
pub async fn cross_domain_policy() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], CROSS_DOMAIN_POLICY)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /metrics`
pub async fn metrics<S: VoteStore + 'static>(State(state): SharedState<S>) -> impl IntoResponse {
    let Some(metrics) = &state.metrics else {
        return (StatusCode::NOT_FOUND, String::new()).into_response();
    };
    match metrics.encode() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
