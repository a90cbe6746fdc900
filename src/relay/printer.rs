//! Synchronized Packet Output

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::protocol::Message;

/// Writes one line per decoded packet to a shared sink.
///
/// Every pipe in the process shares one printer, so lines from the two
/// directions of a connection, and from concurrent connections, never
/// interleave at the character level. The lock is held only for formatting
/// and the single write, never across network I/O.
#[derive(Clone)]
pub struct PacketPrinter {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl PacketPrinter {
    /// Printer writing to standard output.
    pub fn stdout() -> Self {
        Self::with_sink(Box::new(io::stdout()))
    }

    /// Printer writing to an arbitrary sink. Tests use this to capture the
    /// emitted lines.
    pub fn with_sink(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Emit one labelled message line atomically.
    pub fn print(&self, label: &str, message: &Message) -> io::Result<()> {
        let mut out = self.sink.lock().unwrap();
        writeln!(out, "{:>4} {}", label, message)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn prints_labelled_line() {
        let buf = SharedBuf::default();
        let printer = PacketPrinter::with_sink(Box::new(buf.clone()));

        let message = Message {
            from_server: false,
            response: true,
            sequence: 5,
            words: vec!["OK".to_string()],
        };
        printer.print("c1->", &message).unwrap();

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output, "c1-> cR    5      : \"OK\" \n");
    }

    #[test]
    fn right_justifies_short_labels() {
        let buf = SharedBuf::default();
        let printer = PacketPrinter::with_sink(Box::new(buf.clone()));

        let message = Message {
            from_server: true,
            response: false,
            sequence: 1,
            words: vec![],
        };
        printer.print("up", &message).unwrap();

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.starts_with("  up "));
    }
}
