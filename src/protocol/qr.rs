//! # QR Code Symbol Commands (GS ( k)
//!
//! This module frames QR payloads for printers that rasterize the symbol in
//! firmware. Printing a QR code is four concatenated `GS ( k` function
//! calls:
//!
//! | Step | Function | Bytes |
//! |------|----------|-------|
//! | 1. Module size | 167 | `1D 28 6B 03 00 31 43 n` |
//! | 2. Error correction | 169 | `1D 28 6B 03 00 31 45 30` |
//! | 3. Store data | 180 | `1D 28 6B pL pH 31 50 30` + payload |
//! | 4. Print symbol | 181 | `1D 28 6B 03 00 31 51 30` |
//!
//! ## Length Field
//!
//! The store-data header carries the payload length **plus three** (the
//! trailing `31 50 30` function bytes count toward it), split little-endian
//! across `pL`/`pH`.
//!
//! ## Error Correction
//!
//! Fixed at level L (`0x30`). Receipts are read once at close range; the
//! smaller symbol wins over recovery margin.

use byteorder::{LittleEndian, WriteBytesExt};

use super::commands::GS;

/// Module size bounds accepted by the firmware (dots per module)
const MODULE_SIZE_MIN: u8 = 1;
const MODULE_SIZE_MAX: u8 = 16;

/// Largest payload a QR symbol can hold (version 40, level L, 8-bit data).
///
/// Also keeps the store-data length comfortably inside its u16 field: a
/// longer slice would wrap pL/pH and frame garbage.
const PAYLOAD_MAX: usize = 2953;

/// # Build the Full QR Print Sequence
///
/// Produces module-size, error-correction, store-data and print-symbol
/// commands as one byte run. `module_size` is clamped to the 1–16 range the
/// firmware accepts; out-of-range values are a cosmetic problem, never an
/// error. Payloads beyond [`PAYLOAD_MAX`] are cut at the symbol's capacity
/// rather than overflowing the length field.
///
/// ## Example
///
/// ```
/// use recibo::protocol::qr;
///
/// let cmd = qr::qr(b"HELLO", 8);
/// // Store-data header: payload length 5 + 3 = 8, little-endian
/// assert!(cmd.windows(8).any(|w| w == [0x1D, 0x28, 0x6B, 0x08, 0x00, 0x31, 0x50, 0x30]));
/// ```
pub fn qr(data: &[u8], module_size: u8) -> Vec<u8> {
    let size = module_size.clamp(MODULE_SIZE_MIN, MODULE_SIZE_MAX);
    let data = &data[..data.len().min(PAYLOAD_MAX)];
    let mut buf = Vec::with_capacity(data.len() + 32);

    // Function 167: set module size
    buf.extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, size]);

    // Function 169: set error correction level L
    buf.extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x30]);

    // Function 180: store data. Length counts payload + 3 function bytes.
    buf.extend_from_slice(&[GS, 0x28, 0x6B]);
    // Vec<u8> writes are infallible
    let _ = buf.write_u16::<LittleEndian>((data.len() + 3) as u16);
    buf.extend_from_slice(&[0x31, 0x50, 0x30]);
    buf.extend_from_slice(data);

    // Function 181: print the stored symbol
    buf.extend_from_slice(&[GS, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);

    buf
}

// ============================================================================
// TESTS
// ============================================================================
