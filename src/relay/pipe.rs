//! Unidirectional Relay Pipe

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::protocol::{NextPacket, PacketReader};
use crate::Result;

use super::printer::PacketPrinter;

/// Relays bytes from `source` to `sink` while printing every complete
/// protocol packet seen along the way.
///
/// Received bytes are always forwarded verbatim and in full before any
/// decoding happens, so observation can never delay, reorder, or mutate the
/// relayed stream. The pipe runs until its source reports end of stream or
/// a socket error; there is no other stop signal, and finishing never
/// closes the opposite direction.
pub struct Pipe<R, W> {
    label: String,
    source: R,
    sink: W,
    reader: PacketReader,
    printer: PacketPrinter,
    buffer_size: usize,
}

impl<R, W> Pipe<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        label: String,
        source: R,
        sink: W,
        reader: PacketReader,
        printer: PacketPrinter,
        buffer_size: usize,
    ) -> Self {
        Self {
            label,
            source,
            sink,
            reader,
            printer,
            buffer_size,
        }
    }

    /// Run the pipe until the source closes.
    ///
    /// Returns the number of bytes forwarded. Socket failures end the pipe
    /// normally; only protocol errors, which mean the observed stream can no
    /// longer be framed or decoded, surface as `Err`.
    pub async fn run(mut self) -> Result<u64> {
        let mut chunk = vec![0u8; self.buffer_size];
        let mut forwarded: u64 = 0;

        loop {
            let n = match self.source.read(&mut chunk).await {
                Ok(0) => {
                    debug!(pipe = %self.label, "source closed, pipe terminating");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!(pipe = %self.label, error = %e, "read failed, pipe terminating");
                    break;
                }
            };

            // forward first, decode after
            if let Err(e) = self.sink.write_all(&chunk[..n]).await {
                debug!(pipe = %self.label, error = %e, "write failed, pipe terminating");
                break;
            }
            forwarded += n as u64;

            self.reader.append(&chunk[..n]);
            self.drain_packets()?;
        }

        Ok(forwarded)
    }

    /// Print every packet currently extractable from this direction's
    /// buffer. An incomplete trailing packet is steady state and simply
    /// ends the drain until more bytes arrive.
    fn drain_packets(&mut self) -> Result<()> {
        loop {
            match self.reader.next_packet() {
                Ok(NextPacket::Ready(packet)) => {
                    let message = match packet.decode() {
                        Ok(message) => message,
                        Err(e) => {
                            warn!(pipe = %self.label, error = %e, "undecodable packet");
                            return Err(e.into());
                        }
                    };
                    self.printer
                        .print(&self.label, &message)
                        .context("writing decoded packet line")?;
                }
                Ok(NextPacket::Incomplete) => {
                    trace!(
                        pipe = %self.label,
                        buffered = self.reader.buffered(),
                        "incomplete packet"
                    );
                    break;
                }
                Ok(NextPacket::Empty) => break,
                Err(e) => {
                    warn!(pipe = %self.label, error = %e, "unrecoverable framing error");
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}
