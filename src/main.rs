//! bc2relay - BFBC2 Remote Admin Relay
//!
//! Forwards a local port to a game server while printing human readable
//! queries and responses.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bc2relay::{config::ConfigManager, shutdown, ConnectionManager};

/// CLI arguments for bc2relay
#[derive(Parser, Debug)]
#[command(name = "bc2relay")]
#[command(about = "Forward PORT to HOST while printing human readable BFBC2 queries and responses")]
#[command(version)]
#[command(long_about = "
Forward PORT to HOST while printing human readable BFBC2 queries and
responses.

The NEWPORT argument may be used to redirect to a different port.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file (--config)
3. Environment variables (BC2RELAY_*)
4. Built-in defaults

Examples:
  bc2relay 48888 <bfbc2 ip>
      Forward all incoming connections on localhost:48888 to <bfbc2 ip>:48888

  bc2relay 42222 <bfbc2 ip> 48888
      Forward all incoming connections on localhost:42222 to <bfbc2 ip>:48888
")]
pub struct CliArgs {
    /// Local port to listen on
    pub port: Option<u16>,

    /// Game server host to forward to
    pub host: Option<String>,

    /// Port on the game server (defaults to PORT)
    pub newport: Option<u16>,

    /// Configuration file path
    #[arg(short, long, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", help = "Log level")]
    pub log_level: String,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Maximum number of concurrent connections
    #[arg(long, help = "Maximum number of concurrent connections")]
    pub max_connections: Option<usize>,

    /// Read chunk size in bytes
    #[arg(long, help = "Read chunk size in bytes")]
    pub buffer_size: Option<usize>,

    /// Largest accepted packet length in bytes
    #[arg(long, help = "Largest accepted packet length in bytes")]
    pub max_packet_len: Option<usize>,

    /// Upstream connect timeout in seconds
    #[arg(long, help = "Upstream connect timeout in seconds")]
    pub timeout: Option<u64>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args)?;

    info!("Starting bc2relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = match &args.config {
        Some(path) => ConfigManager::load_from_file(path)?,
        None => ConfigManager::load_from_env()?,
    };

    // Apply CLI argument overrides (highest priority)
    config.merge_with_cli_args(
        args.port,
        args.host.as_deref(),
        args.newport,
        args.max_connections,
        args.buffer_size,
        args.max_packet_len,
        args.timeout,
    );

    config
        .validate()
        .context("Configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("  Listen address: {}", config.server.bind_addr);
        info!(
            "  Upstream: {}:{}",
            config.relay.upstream_host,
            config.upstream_port()
        );
        info!("  Max connections: {}", config.server.max_connections);
        info!("  Buffer size: {} bytes", config.server.buffer_size);
        info!("  Max packet length: {} bytes", config.relay.max_packet_len);
        return Ok(());
    }

    info!(
        "Redirecting port {} to {}:{}",
        config.server.bind_addr.port(),
        config.relay.upstream_host,
        config.upstream_port()
    );

    let mut manager = ConnectionManager::new(Arc::new(config));

    // No graceful drain by design: dropping out of the select tears down
    // every session along with the process.
    tokio::select! {
        result = manager.start() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
        result = shutdown::wait_for_signal() => {
            if let Err(e) = result {
                error!("Error waiting for shutdown signal: {}", e);
            }
        }
    }

    info!("bye");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
