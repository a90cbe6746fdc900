//! Relay Engine

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::protocol::PacketReader;
use crate::Result;

use super::pipe::Pipe;
use super::printer::PacketPrinter;
use super::session::RelaySession;

/// Connects accepted clients to the upstream game server and runs the pair
/// of pipes that make up a session.
pub struct RelayEngine {
    upstream_host: String,
    upstream_port: u16,
    connect_timeout: Duration,
    buffer_size: usize,
    max_packet_len: usize,
    printer: PacketPrinter,
}

impl RelayEngine {
    /// Create a relay engine from configuration, printing decoded packets
    /// through `printer`.
    pub fn from_config(config: &Config, printer: PacketPrinter) -> Self {
        Self {
            upstream_host: config.relay.upstream_host.clone(),
            upstream_port: config.upstream_port(),
            connect_timeout: config.server.connect_timeout,
            buffer_size: config.server.buffer_size,
            max_packet_len: config.relay.max_packet_len,
            printer,
        }
    }

    /// Resolve and dial the upstream game server.
    ///
    /// The host is re-resolved for every accepted connection; when it
    /// resolves to several addresses, each is tried in turn.
    pub async fn connect_upstream(&self) -> Result<TcpStream> {
        let host_port = format!("{}:{}", self.upstream_host, self.upstream_port);
        let addrs: Vec<SocketAddr> = lookup_host(&host_port)
            .await
            .with_context(|| format!("Failed to resolve upstream {}", host_port))?
            .collect();

        if addrs.is_empty() {
            return Err(anyhow!("Upstream {} resolved to no addresses", host_port));
        }

        let mut last_error = None;
        for addr in addrs {
            match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    debug!("Connected to upstream {}", addr);
                    return Ok(stream);
                }
                Ok(Err(e)) => {
                    debug!("Failed to connect to upstream {}: {}", addr, e);
                    last_error = Some(anyhow!(e));
                }
                Err(_) => {
                    debug!(
                        "Connection to upstream {} timed out after {:?}",
                        addr, self.connect_timeout
                    );
                    last_error = Some(anyhow!("connection timed out"));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("no connection attempt made"))
            .context(format!("Failed to connect to upstream {}", host_port)))
    }

    /// Run one complete session: dial upstream, wire two pipes back to
    /// back over the split sockets, and wait for both to finish.
    ///
    /// Each pipe ends on its own socket's close. Finishing one does not
    /// cancel the other, so a half-open relay may linger until the second
    /// socket closes on its own.
    pub async fn run_session(&self, id: u64, client: TcpStream) -> Result<()> {
        let client_addr = client
            .peer_addr()
            .context("Failed to get client address")?;
        let upstream = self.connect_upstream().await?;
        let upstream_addr = upstream
            .peer_addr()
            .context("Failed to get upstream address")?;

        let session = Arc::new(RelaySession::new(id, client_addr, upstream_addr));
        info!(
            "Started relay session c{} from {} to {}",
            session.id, client_addr, upstream_addr
        );

        let (client_read, client_write) = client.into_split();
        let (upstream_read, upstream_write) = upstream.into_split();

        let up = Pipe::new(
            session.up_label(),
            client_read,
            upstream_write,
            PacketReader::with_limit(self.max_packet_len),
            self.printer.clone(),
            self.buffer_size,
        );
        let down = Pipe::new(
            session.down_label(),
            upstream_read,
            client_write,
            PacketReader::with_limit(self.max_packet_len),
            self.printer.clone(),
            self.buffer_size,
        );

        let up_task = tokio::spawn(up.run());
        let down_task = tokio::spawn(down.run());

        match up_task.await {
            Ok(Ok(bytes)) => session.update_bytes_up(bytes),
            Ok(Err(e)) => warn!(session = session.id, error = %e, "upstream pipe failed"),
            Err(e) => warn!(session = session.id, error = %e, "upstream pipe panicked"),
        }
        match down_task.await {
            Ok(Ok(bytes)) => session.update_bytes_down(bytes),
            Ok(Err(e)) => warn!(session = session.id, error = %e, "downstream pipe failed"),
            Err(e) => warn!(session = session.id, error = %e, "downstream pipe panicked"),
        }

        session.log_stats();
        Ok(())
    }
}
