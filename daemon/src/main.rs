//! Votatoon daemon: entry point for running a node.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use votatoon_node::{init_logging, NodeConfig, VoteNode};

#[derive(Parser)]
#[command(name = "votatoon-daemon", about = "Votatoon voting node daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VOTATOON_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "VOTATOON_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in MiB.
    #[arg(long, env = "VOTATOON_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// LMDB reader slots; also bounds the blocking thread pool.
    #[arg(long, env = "VOTATOON_MAX_READERS")]
    max_readers: Option<u32>,

    /// Address for the HTTP server to bind.
    #[arg(long, env = "VOTATOON_RPC_BIND")]
    rpc_bind: Option<IpAddr>,

    /// HTTP server port.
    #[arg(long, env = "VOTATOON_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "VOTATOON_ENABLE_METRICS")]
    metrics: bool,

    /// Identify voters by `x-forwarded-for` (only behind a trusted proxy).
    #[arg(long, env = "VOTATOON_TRUST_FORWARDED_FOR")]
    trust_forwarded_for: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOTATOON_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VOTATOON_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// File settings (or defaults), overridden by flags and env vars.
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => NodeConfig::default(),
        };

        Ok(NodeConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            map_size_mb: self.map_size_mb.unwrap_or(base.map_size_mb),
            max_readers: self.max_readers.unwrap_or(base.max_readers),
            rpc_bind: self.rpc_bind.unwrap_or(base.rpc_bind),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            enable_metrics: self.metrics || base.enable_metrics,
            trust_forwarded_for: self.trust_forwarded_for || base.trust_forwarded_for,
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            ..base
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run => {
            // Each blocking thread may hold an LMDB reader slot.
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .max_blocking_threads(config.blocking_threads())
                .build()
                .context("building tokio runtime")?;
            runtime.block_on(run(&cli, config))
        }
    }
}

async fn run(cli: &Cli, config: NodeConfig) -> anyhow::Result<()> {
    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config file");
    }
    tracing::info!(
        data_dir = %config.data_dir.display(),
        rpc = %config.rpc_addr(),
        metrics = config.enable_metrics,
        max_readers = config.max_readers,
        "starting Votatoon node"
    );

    let node = VoteNode::new(config).context("initialising node")?;
    node.start().await?;

    tracing::info!("Votatoon daemon exited cleanly");
    Ok(())
}
