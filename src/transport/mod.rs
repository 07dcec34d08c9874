//! # Printer Transport Layer
//!
//! Communication backends for sending encoded command bytes to printers.
//!
//! ## Available Transports
//!
//! - [`bluetooth`]: Bluetooth SPP over RFCOMM (Linux)
//! - [`usb`]: USB bulk-OUT endpoint via libusb
//! - [`mock`]: in-memory recording transport for tests
//!
//! Every transport owns exactly one underlying OS handle and releases it
//! exactly once: `close()` is idempotent and `Drop` backs it up. The
//! embedded vendor engine is *not* a transport — it has its own lifecycle
//! in [`engine`](crate::engine) because its commands are capability calls,
//! not byte writes.

use serde::Serialize;

use crate::error::Result;

pub mod bluetooth;
pub mod mock;
pub mod usb;

pub use bluetooth::BluetoothTransport;
pub use mock::MockTransport;
pub use usb::UsbTransport;

/// Which device class carries the printer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Nothing connected; initial and a valid terminal state
    #[default]
    None,
    /// Built-in vendor print engine
    Embedded,
    /// Bluetooth Serial Port Profile socket
    Bluetooth,
    /// USB bulk-transfer endpoint
    Usb,
}

impl TransportKind {
    /// Upper-case label used in deterministic status messages
    /// (`"Connected via BLUETOOTH"`).
    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::None => "NONE",
            TransportKind::Embedded => "EMBEDDED",
            TransportKind::Bluetooth => "BLUETOOTH",
            TransportKind::Usb => "USB",
        }
    }
}

/// A byte-oriented connection to a physical printer.
///
/// The capability set is deliberately small — open (the constructor),
/// write, close, is-open — so the connection manager can treat Bluetooth
/// sockets and USB endpoints uniformly.
pub trait Transport: Send {
    /// Which device class this transport drives
    fn kind(&self) -> TransportKind;

    /// The address this transport was opened against (MAC, bus:addr, ...)
    fn address(&self) -> &str;

    /// Human-readable device name, when the OS exposes one
    fn peer_name(&self) -> Option<&str> {
        None
    }

    /// Whether the underlying OS handle is still held
    fn is_open(&self) -> bool;

    /// Blocking write of the full buffer, bounded by the transport's
    /// timeout policy
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Release the OS handle. Safe to call more than once; only the first
    /// call does work.
    fn close(&mut self) -> Result<()>;
}

/// Seam for producing and enumerating transports.
///
/// The connection manager goes through this trait so tests can substitute
/// recording doubles for real OS handles.
pub trait TransportFactory: Send {
    /// Open a transport of `kind` against `address`
    fn open(&self, kind: TransportKind, address: &str) -> Result<Box<dyn Transport>>;

    /// Bonded/paired Bluetooth devices as `(name, address)` pairs.
    ///
    /// Permission or tooling problems degrade to an empty list.
    fn scan_bluetooth(&self) -> Vec<(String, String)>;

    /// Attached USB printer-class devices as `(name, address)` pairs
    fn scan_usb(&self) -> Vec<(String, String)>;
}

/// Production factory backed by the real OS backends
#[derive(Debug, Default)]
pub struct SystemTransports;

impl TransportFactory for SystemTransports {
    fn open(&self, kind: TransportKind, address: &str) -> Result<Box<dyn Transport>> {
        match kind {
            TransportKind::Bluetooth => Ok(Box::new(BluetoothTransport::open(address)?)),
            TransportKind::Usb => Ok(Box::new(UsbTransport::open(address)?)),
            TransportKind::Embedded | TransportKind::None => Err(
                crate::error::PrinterError::TransportUnavailable(format!(
                    "{:?} is not a byte transport",
                    kind
                )),
            ),
        }
    }

    fn scan_bluetooth(&self) -> Vec<(String, String)> {
        bluetooth::bonded_devices()
    }

    fn scan_usb(&self) -> Vec<(String, String)> {
        usb::attached_printers()
    }
}

// ============================================================================
// TESTS
// ============================================================================
