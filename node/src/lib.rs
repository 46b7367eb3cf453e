//! Votatoon node.
//!
//! The node owns the process-level concerns around the voting core:
//! - Loading [`NodeConfig`] from TOML
//! - Installing the tracing subscriber
//! - Validating and opening the LMDB environment
//! - Serving the HTTP surface until a shutdown signal arrives

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::VoteNode;
pub use shutdown::ShutdownController;
