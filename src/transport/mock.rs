//! # Recording Transport
//!
//! An in-memory [`Transport`] that records every byte written to it, used
//! by the dispatcher and connection-manager tests. The sink is shared via
//! `Arc<Mutex<..>>` so a test can keep inspecting it after the transport
//! has been boxed and handed to the code under test.

use std::sync::{Arc, Mutex};

use crate::error::{PrinterError, Result};
use crate::transport::{Transport, TransportKind};

/// Shared observation point for a [`MockTransport`]
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    inner: Arc<Mutex<MockSinkState>>,
}

#[derive(Debug, Default)]
struct MockSinkState {
    written: Vec<u8>,
    close_count: usize,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, in order
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written.clone()
    }

    /// How many times the transport actually released its handle.
    ///
    /// Lets leak tests assert "exactly once" rather than "at least once".
    pub fn close_count(&self) -> usize {
        self.inner.lock().unwrap().close_count
    }
}

/// # In-Memory Test Transport
pub struct MockTransport {
    sink: MockSink,
    kind: TransportKind,
    address: String,
    open: bool,
    /// When set, every write fails with this I/O error kind
    fail_writes: Option<std::io::ErrorKind>,
}

impl MockTransport {
    pub fn new(kind: TransportKind, address: &str) -> (Self, MockSink) {
        let sink = MockSink::new();
        let transport = Self {
            sink: sink.clone(),
            kind,
            address: address.to_string(),
            open: true,
            fail_writes: None,
        };
        (transport, sink)
    }

    /// Make every subsequent write fail, for error-path tests
    pub fn fail_writes_with(&mut self, kind: std::io::ErrorKind) {
        self.fail_writes = Some(kind);
    }
}

impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(PrinterError::NotConnected);
        }
        if let Some(kind) = self.fail_writes {
            return Err(PrinterError::Io(std::io::Error::new(kind, "injected failure")));
        }
        self.sink.inner.lock().unwrap().written.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.sink.inner.lock().unwrap().close_count += 1;
        }
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_writes_in_order() {
        let (mut transport, sink) = MockTransport::new(TransportKind::Usb, "1:4");
        transport.write_all(b"abc").unwrap();
        transport.write_all(b"def").unwrap();
        assert_eq!(sink.written(), b"abcdef");
    }

    #[test]
    fn test_close_is_exactly_once() {
        let (mut transport, sink) = MockTransport::new(TransportKind::Bluetooth, "00:11:22:33:44:55");
        transport.close().unwrap();
        transport.close().unwrap();
        drop(transport); // Drop must not double-count either
        assert_eq!(sink.close_count(), 1);
    }

    #[test]
    fn test_drop_counts_as_close() {
        let (transport, sink) = MockTransport::new(TransportKind::Usb, "1:4");
        drop(transport);
        assert_eq!(sink.close_count(), 1);
    }

    #[test]
    fn test_writes_after_close_fail() {
        let (mut transport, sink) = MockTransport::new(TransportKind::Usb, "1:4");
        transport.close().unwrap();
        assert!(matches!(
            transport.write_all(b"x"),
            Err(PrinterError::NotConnected)
        ));
        assert!(sink.written().is_empty());
    }

    #[test]
    fn test_injected_write_failure() {
        let (mut transport, _sink) = MockTransport::new(TransportKind::Usb, "1:4");
        transport.fail_writes_with(std::io::ErrorKind::BrokenPipe);
        assert!(matches!(transport.write_all(b"x"), Err(PrinterError::Io(_))));
    }
}
