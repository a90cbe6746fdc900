//! Configuration Types

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_MAX_PACKET_LEN;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub relay: RelayConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Local address the relay listens on.
    pub bind_addr: SocketAddr,
    /// Accepts past this many live connections are rejected.
    pub max_connections: usize,
    /// Read chunk size for the relay pipes.
    pub buffer_size: usize,
    /// Bound on dialing the upstream server. Relaying itself carries no
    /// timeout; a session lives until a socket closes.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

/// Upstream and protocol configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Host name or address of the game server to forward to.
    pub upstream_host: String,
    /// Port on the game server. Defaults to the listen port when absent.
    pub upstream_port: Option<u16>,
    /// Connections claiming a packet larger than this are dropped.
    pub max_packet_len: usize,
}

impl Config {
    /// Effective upstream port: the configured one, or the listen port when
    /// unspecified.
    pub fn upstream_port(&self) -> u16 {
        self.relay
            .upstream_port
            .unwrap_or_else(|| self.server.bind_addr.port())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:48888".parse().unwrap(),
                max_connections: 64,
                buffer_size: 1024,
                connect_timeout: Duration::from_secs(10),
            },
            relay: RelayConfig {
                upstream_host: String::new(),
                upstream_port: None,
                max_packet_len: DEFAULT_MAX_PACKET_LEN,
            },
        }
    }
}
