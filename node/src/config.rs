//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::{LogFormat, NodeError};

/// Configuration for a Votatoon node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Maximum number of named LMDB databases.
    #[serde(default = "default_max_dbs")]
    pub max_dbs: u32,

    /// LMDB reader slots. Every thread that reads keeps a slot, so the
    /// blocking pool is sized from this via [`NodeConfig::blocking_threads`].
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,

    /// Address the HTTP server binds to.
    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: IpAddr,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Identify voters by the first `x-forwarded-for` address. Only enable
    /// behind a proxy that sets the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./votatoon_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_max_dbs() -> u32 {
    16
}

fn default_max_readers() -> u32 {
    votatoon_store_lmdb::DEFAULT_MAX_READERS
}

fn default_rpc_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_rpc_port() -> u16 {
    3000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Reader slots kept back for threads outside the blocking pool.
pub const READER_HEADROOM: u32 = 16;

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_bind, self.rpc_port)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Upper bound for the runtime's blocking pool, leaving
    /// [`READER_HEADROOM`] reader slots spare.
    pub fn blocking_threads(&self) -> usize {
        self.max_readers.saturating_sub(READER_HEADROOM).max(1) as usize
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Reject values that would only fail later, deep inside startup.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.map_size_mb == 0 {
            return Err(NodeError::Config("map_size_mb must be positive".into()));
        }
        if (self.max_dbs as usize) < votatoon_store_lmdb::DATABASE_NAMES.len() {
            return Err(NodeError::Config(format!(
                "max_dbs must be at least {}",
                votatoon_store_lmdb::DATABASE_NAMES.len()
            )));
        }
        if self.max_readers <= READER_HEADROOM {
            return Err(NodeError::Config(format!(
                "max_readers must be greater than {READER_HEADROOM}"
            )));
        }
        self.log_format()?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            max_dbs: default_max_dbs(),
            max_readers: default_max_readers(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            trust_forwarded_for: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 3000);
        assert_eq!(config.max_dbs, 16);
        assert_eq!(config.max_readers, 1024);
        assert_eq!(config.log_format, "human");
        assert!(!config.trust_forwarded_for);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_bind = "127.0.0.1"
            rpc_port = 9999
            enable_metrics = true
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_addr(), "127.0.0.1:9999".parse().unwrap());
        assert!(config.enable_metrics);
        assert_eq!(config.log_format, "human"); // default
    }

    #[test]
    fn map_size_in_bytes() {
        let config = NodeConfig {
            map_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(config.map_size_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let too_few_dbs = NodeConfig {
            max_dbs: 2,
            ..Default::default()
        };
        assert!(matches!(too_few_dbs.validate(), Err(NodeError::Config(_))));

        let bad_format = NodeConfig {
            log_format: "yaml".into(),
            ..Default::default()
        };
        assert!(bad_format.validate().is_err());

        let too_few_readers = NodeConfig {
            max_readers: READER_HEADROOM,
            ..Default::default()
        };
        assert!(matches!(too_few_readers.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn blocking_pool_stays_below_reader_slots() {
        let config = NodeConfig::default();
        assert_eq!(config.blocking_threads(), 1008);
        assert!(config.blocking_threads() < config.max_readers as usize);

        let small = NodeConfig::from_toml_str("max_readers = 200").unwrap();
        assert_eq!(small.blocking_threads(), 184);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file(Path::new("/nonexistent/votatoon.toml"));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
