//! # Error Types
//!
//! This module defines error types used throughout the recibo library.
//!
//! All errors are recovered at the [`Printer`](crate::printer::Printer)
//! boundary and surfaced to the caller as a structured failure; nothing
//! panics past it. Discovery partial failures (for example a missing
//! Bluetooth permission) degrade to an empty device subset instead of
//! failing the whole call.

use thiserror::Error;

/// Main error type for recibo operations
#[derive(Debug, Error)]
pub enum PrinterError {
    /// An operation was attempted with no active transport
    #[error("printer not connected")]
    NotConnected,

    /// The requested transport's OS-level prerequisite is absent or disabled
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// OS-level permission for the requested transport was not granted
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A discovery or connect target does not exist
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The embedded engine probe exhausted all candidate signatures
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// The operation is not supported on the active transport
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A vendor engine call existed but failed
    #[error("print engine error: {0}")]
    Engine(String),

    /// Write or open failed at the OS layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusb::Error> for PrinterError {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Access => PrinterError::PermissionDenied("USB access denied".to_string()),
            rusb::Error::NoDevice | rusb::Error::NotFound => {
                PrinterError::DeviceNotFound(format!("USB: {}", e))
            }
            other => PrinterError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, PrinterError>;
