//! HTTP surface of a Votatoon node.
//!
//! Provides endpoints for:
//! - Casting a vote for contestant `a` or `b` of the active race
//! - Standings of the active race and of every race
//! - The cross-domain policy document
//! - Prometheus metrics and a liveness probe

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use metrics::RpcMetrics;
pub use server::{router, RpcServer, RpcState};
