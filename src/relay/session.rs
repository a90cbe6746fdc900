//! Relay Session

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, info};

/// One relayed connection: the accepted client socket paired with its
/// upstream counterpart, observed by one pipe per direction.
#[derive(Debug)]
pub struct RelaySession {
    /// Monotonic number of the accepted connection. Never reused, so log
    /// lines stay attributable after the session is gone.
    pub id: u64,
    pub client_addr: SocketAddr,
    pub upstream_addr: SocketAddr,
    pub start_time: Instant,
    bytes_up: AtomicU64,
    bytes_down: AtomicU64,
}

impl RelaySession {
    pub fn new(id: u64, client_addr: SocketAddr, upstream_addr: SocketAddr) -> Self {
        debug!(
            "Creating relay session c{} ({} -> {})",
            id, client_addr, upstream_addr
        );

        Self {
            id,
            client_addr,
            upstream_addr,
            start_time: Instant::now(),
            bytes_up: AtomicU64::new(0),
            bytes_down: AtomicU64::new(0),
        }
    }

    /// Label of the client to server pipe, e.g. `c3->`.
    pub fn up_label(&self) -> String {
        format!("c{}->", self.id)
    }

    /// Label of the server to client pipe, e.g. `c3<-`.
    pub fn down_label(&self) -> String {
        format!("c{}<-", self.id)
    }

    /// Bytes forwarded from the client toward the game server.
    pub fn bytes_up(&self) -> u64 {
        self.bytes_up.load(Ordering::Relaxed)
    }

    /// Bytes forwarded from the game server toward the client.
    pub fn bytes_down(&self) -> u64 {
        self.bytes_down.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes_up() + self.bytes_down()
    }

    pub fn duration(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn update_bytes_up(&self, bytes: u64) {
        self.bytes_up.store(bytes, Ordering::Relaxed);
    }

    pub fn update_bytes_down(&self, bytes: u64) {
        self.bytes_down.store(bytes, Ordering::Relaxed);
    }

    /// Log the final statistics for this session.
    pub fn log_stats(&self) {
        info!(
            session = self.id,
            client_addr = %self.client_addr,
            upstream_addr = %self.upstream_addr,
            duration_ms = self.duration().as_millis() as u64,
            bytes_up = self.bytes_up(),
            bytes_down = self.bytes_down(),
            total_bytes = self.total_bytes(),
            "Relay session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_byte_counters() {
        let session = RelaySession::new(
            7,
            "127.0.0.1:12345".parse().unwrap(),
            "127.0.0.1:48888".parse().unwrap(),
        );

        assert_eq!(session.bytes_up(), 0);
        assert_eq!(session.bytes_down(), 0);

        session.update_bytes_up(1024);
        session.update_bytes_down(2048);

        assert_eq!(session.bytes_up(), 1024);
        assert_eq!(session.bytes_down(), 2048);
        assert_eq!(session.total_bytes(), 3072);
    }

    #[test]
    fn labels_encode_connection_and_direction() {
        let session = RelaySession::new(
            3,
            "127.0.0.1:12345".parse().unwrap(),
            "127.0.0.1:48888".parse().unwrap(),
        );

        assert_eq!(session.up_label(), "c3->");
        assert_eq!(session.down_label(), "c3<-");
    }
}
