//! Connection Manager Implementation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::relay::{PacketPrinter, RelayEngine};
use crate::Result;

/// Accepts inbound connections and hands each one to the relay engine.
///
/// The manager owns the only piece of cross-connection state: an active
/// session gauge used to enforce the connection cap, and a monotonic
/// connection counter used for pipe labels. Individual sessions never see
/// or affect each other.
pub struct ConnectionManager {
    listener: Option<TcpListener>,
    config: Arc<Config>,
    engine: Arc<RelayEngine>,
    active_connections: Arc<AtomicUsize>,
    next_connection_id: AtomicU64,
}

impl ConnectionManager {
    /// Create a manager printing decoded packets to standard output.
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_printer(config, PacketPrinter::stdout())
    }

    /// Create a manager with a custom packet printer.
    pub fn with_printer(config: Arc<Config>, printer: PacketPrinter) -> Self {
        let engine = Arc::new(RelayEngine::from_config(&config, printer));
        Self {
            listener: None,
            config,
            engine,
            active_connections: Arc::new(AtomicUsize::new(0)),
            next_connection_id: AtomicU64::new(0),
        }
    }

    /// Number of currently live relay sessions.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Address the listener is bound to, once [`bind`](Self::bind) has run.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Bind the TCP listener and return the bound address.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        let bind_addr = self.config.server.bind_addr;

        info!("Binding TCP listener to {}", bind_addr);
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;
        let local_addr = listener.local_addr()?;

        info!("Successfully bound to {}", local_addr);
        self.listener = Some(listener);
        Ok(local_addr)
    }

    /// Bind if necessary, then accept connections until the process exits.
    pub async fn start(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        self.accept_connections().await
    }

    /// Main connection acceptance loop
    async fn accept_connections(&self) -> Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Listener not initialized"))?;

        info!("Starting connection acceptance loop");

        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            debug!("Accepted connection from {}", addr);

            if self.active_connections() >= self.config.server.max_connections {
                warn!(
                    "Connection limit of {} reached, rejecting connection from {}",
                    self.config.server.max_connections, addr
                );
                continue;
            }

            let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed) + 1;
            info!("Creating new session c{} for {}", id, addr);

            let engine = Arc::clone(&self.engine);
            let active = Arc::clone(&self.active_connections);
            active.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(async move {
                // an upstream connect failure lands here too: the accepted
                // socket is dropped unanswered
                if let Err(e) = engine.run_session(id, stream).await {
                    debug!(connection = id, error = %e, "Session ended with error");
                }
                active.fetch_sub(1, Ordering::Relaxed);
            });
        }
    }
}
