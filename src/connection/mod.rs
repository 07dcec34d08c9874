//! # Connection Layer
//!
//! Connection state machine over the three device classes, plus the
//! transient data types the discovery and status surfaces return.
//!
//! ## Two Lifecycles
//!
//! The embedded engine handle and the pluggable transport handle have
//! deliberately independent lifecycles:
//!
//! - the **engine** is acquired once per process and survives
//!   `disconnect()` — losing it would require a host restart to get back;
//! - a **transport** (Bluetooth or USB) is opened per session and closed
//!   on replacement or disconnect.
//!
//! [`ConnectionState`] is *derived* from the two handles, never stored,
//! so it cannot drift out of sync with reality.

use serde::Serialize;

use crate::transport::TransportKind;

pub mod manager;

pub use manager::ConnectionManager;

/// Derived connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handle held, no probe outstanding
    Disconnected,
    /// Embedded-engine probe accepted but not yet confirmed
    Connecting,
    /// A live handle of this kind is held
    Connected(TransportKind),
}

/// What to connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// The built-in vendor engine
    Embedded,
    /// Bluetooth SPP printer at this MAC address
    Bluetooth { address: String },
    /// USB printer at this `bus:device` address
    Usb { address: String },
}

impl ConnectTarget {
    pub fn kind(&self) -> TransportKind {
        match self {
            ConnectTarget::Embedded => TransportKind::Embedded,
            ConnectTarget::Bluetooth { .. } => TransportKind::Bluetooth,
            ConnectTarget::Usb { .. } => TransportKind::Usb,
        }
    }
}

/// One row of a discovery listing.
///
/// Descriptors are transient: built fresh on every `discover()` call and
/// never cached, so `connected` always reflects the live handle.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub address: String,
    pub kind: TransportKind,
    pub connected: bool,
}

/// Snapshot of the connection for the status surface.
///
/// `status` is the numeric convention callers already depend on: `1` for
/// connected, `-1` for not. `message` is deterministic
/// (`"Connected via BLUETOOTH"` / `"Not connected"`) so callers can match
/// on it.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatus {
    pub connected: bool,
    pub kind: TransportKind,
    pub status: i8,
    pub message: String,
}

impl PrinterStatus {
    pub fn connected(kind: TransportKind) -> Self {
        Self {
            connected: true,
            kind,
            status: 1,
            message: format!("Connected via {}", kind.label()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            kind: TransportKind::None,
            status: -1,
            message: "Not connected".to_string(),
        }
    }
}

/// Push notification emitted on every transition into a connected state
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PrinterEvent {
    Connected {
        kind: TransportKind,
        /// Device or engine name when the backend exposes one
        name: Option<String>,
    },
}

// ============================================================================
// TESTS
// ============================================================================
