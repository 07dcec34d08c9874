//! # Wire Protocol Encoder
//!
//! Pure, stateless mapping from semantic print commands to transport-ready
//! byte sequences for ESC/POS-compatible printers.
//!
//! ## Modules
//!
//! - [`commands`]: init, alignment, styling, feed, cut, cash drawer
//! - [`qr`]: QR symbol framing (GS ( k function calls)
//! - [`columns`]: tabular line composition
//! - [`encoding`]: UTF-8 → GBK re-encoding for text payloads
//!
//! Nothing in this module performs I/O or keeps state; every function is a
//! deterministic bytes-in/bytes-out mapping, which is what makes the
//! encoder testable byte-for-byte.

pub mod columns;
pub mod commands;
pub mod encoding;
pub mod qr;

pub use commands::Alignment;
