//! Configuration Manager

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Context};

use super::Config;
use crate::protocol::HEADER_LEN;
use crate::Result;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a TOML file.
    ///
    /// Validation runs once in main after CLI overrides are merged, since a
    /// file on its own may legitimately omit values the command line fills
    /// in.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        tracing::info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from environment variables, falling back to the
    /// built-in defaults.
    pub fn load_from_env() -> Result<Config> {
        let mut config = Config::default();

        if let Ok(bind_addr) = std::env::var("BC2RELAY_BIND_ADDR") {
            config.server.bind_addr = bind_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid BC2RELAY_BIND_ADDR: {}", bind_addr))?;
        }

        if let Ok(host) = std::env::var("BC2RELAY_UPSTREAM_HOST") {
            config.relay.upstream_host = host;
        }

        if let Ok(port) = std::env::var("BC2RELAY_UPSTREAM_PORT") {
            config.relay.upstream_port = Some(
                port.parse::<u16>()
                    .with_context(|| format!("Invalid BC2RELAY_UPSTREAM_PORT: {}", port))?,
            );
        }

        if let Ok(max_conn) = std::env::var("BC2RELAY_MAX_CONNECTIONS") {
            config.server.max_connections = max_conn
                .parse::<usize>()
                .with_context(|| format!("Invalid BC2RELAY_MAX_CONNECTIONS: {}", max_conn))?;
        }

        if let Ok(buffer_size) = std::env::var("BC2RELAY_BUFFER_SIZE") {
            config.server.buffer_size = buffer_size
                .parse::<usize>()
                .with_context(|| format!("Invalid BC2RELAY_BUFFER_SIZE: {}", buffer_size))?;
        }

        if let Ok(max_len) = std::env::var("BC2RELAY_MAX_PACKET_LEN") {
            config.relay.max_packet_len = max_len
                .parse::<usize>()
                .with_context(|| format!("Invalid BC2RELAY_MAX_PACKET_LEN: {}", max_len))?;
        }

        if let Ok(timeout) = std::env::var("BC2RELAY_CONNECT_TIMEOUT") {
            config.server.connect_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid BC2RELAY_CONNECT_TIMEOUT: {}", timeout))?;
        }

        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.relay.upstream_host.is_empty() {
            bail!("upstream host must be set (HOST argument, config file, or BC2RELAY_UPSTREAM_HOST)");
        }

        if self.relay.upstream_port == Some(0) {
            bail!("upstream_port cannot be 0");
        }

        if self.server.max_connections == 0 {
            bail!("max_connections must be greater than 0");
        }

        if self.server.max_connections > 10000 {
            bail!("max_connections cannot exceed 10,000 for safety");
        }

        if self.server.buffer_size == 0 {
            bail!("buffer_size must be greater than 0");
        }

        if self.server.buffer_size > 1048576 {
            bail!("buffer_size cannot exceed 1MB");
        }

        if self.relay.max_packet_len < HEADER_LEN {
            bail!("max_packet_len must be at least the {} byte header", HEADER_LEN);
        }

        if self.server.connect_timeout.as_secs() == 0 {
            bail!("connect_timeout must be greater than 0");
        }

        if self.server.connect_timeout.as_secs() > 3600 {
            bail!("connect_timeout cannot exceed 1 hour");
        }

        Ok(())
    }

    /// Merge with CLI arguments
    #[allow(clippy::too_many_arguments)]
    pub fn merge_with_cli_args(
        &mut self,
        port: Option<u16>,
        upstream_host: Option<&str>,
        upstream_port: Option<u16>,
        max_connections: Option<usize>,
        buffer_size: Option<usize>,
        max_packet_len: Option<usize>,
        timeout: Option<u64>,
    ) {
        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
            tracing::debug!("CLI override: listen port set to {}", port);
        }

        if let Some(host) = upstream_host {
            self.relay.upstream_host = host.to_string();
            tracing::debug!("CLI override: upstream host set to {}", host);
        }

        if let Some(port) = upstream_port {
            self.relay.upstream_port = Some(port);
            tracing::debug!("CLI override: upstream port set to {}", port);
        }

        if let Some(max_conn) = max_connections {
            self.server.max_connections = max_conn;
            tracing::debug!("CLI override: max connections set to {}", max_conn);
        }

        if let Some(buffer_size) = buffer_size {
            self.server.buffer_size = buffer_size;
            tracing::debug!("CLI override: buffer size set to {} bytes", buffer_size);
        }

        if let Some(max_len) = max_packet_len {
            self.relay.max_packet_len = max_len;
            tracing::debug!("CLI override: max packet length set to {} bytes", max_len);
        }

        if let Some(timeout_secs) = timeout {
            self.server.connect_timeout = std::time::Duration::from_secs(timeout_secs);
            tracing::debug!("CLI override: connect timeout set to {}s", timeout_secs);
        }
    }
}
