//! # Recibo - Receipt Printer Connection Library
//!
//! Recibo presents one logical "receipt printer" over three unrelated
//! device classes:
//!
//! - **Embedded engine**: the vendor print service built into some POS
//!   hosts, driven through capability-probed calls
//! - **Bluetooth SPP**: paired serial printers over RFCOMM
//! - **USB**: printer-class devices via their bulk-OUT endpoint
//!
//! Byte transports speak the ESC/POS-compatible subset implemented in
//! [`protocol`]; the embedded engine is driven through an adapter that
//! probes candidate vendor signatures at call time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use recibo::{
//!     connection::ConnectTarget,
//!     engine::NullProvider,
//!     printer::Printer,
//! };
//!
//! let mut printer = Printer::new(Box::new(NullProvider));
//!
//! // Find something to print on, then connect
//! let devices = printer.discover();
//! printer.connect(&ConnectTarget::Usb { address: "1:4".to_string() })?;
//!
//! // Print a small receipt
//! printer.print_text_styled("CORNER CAFE\n", 48, 1, true)?;
//! printer.print_text("2x Flat White    $9.00\n")?;
//! printer.print_qr_code("https://example.com/r/1234", 6, 1)?;
//! printer.cut_paper()?;
//!
//! printer.disconnect();
//! # let _ = devices;
//! # Ok::<(), recibo::error::PrinterError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS command builders, QR framing, columns, GBK |
//! | [`transport`] | Bluetooth, USB and mock communication backends |
//! | [`engine`] | Embedded vendor engine and its capability adapter |
//! | [`connection`] | Connection state machine, discovery, events |
//! | [`printer`] | The public command dispatcher |
//! | [`error`] | Error types |
//!
//! ## Connection Model
//!
//! The embedded engine and the byte transports have independent
//! lifecycles: the engine is acquired once per process (usually through
//! [`Printer::auto_connect`](printer::Printer::auto_connect)) and survives
//! `disconnect()`, while Bluetooth and USB handles are opened per session
//! and at most one is held at a time.

pub mod connection;
pub mod engine;
pub mod error;
pub mod printer;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use connection::{ConnectTarget, DeviceDescriptor, PrinterEvent, PrinterStatus};
pub use error::PrinterError;
pub use printer::Printer;
pub use protocol::Alignment;
pub use transport::TransportKind;
