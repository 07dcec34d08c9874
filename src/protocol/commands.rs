//! # ESC/POS Command Builders
//!
//! This module implements the byte-oriented command protocol spoken by
//! generic ESC/POS-compatible receipt printers over Bluetooth SPP or USB.
//!
//! ## Protocol Overview
//!
//! ESC/POS commands are short byte sequences starting with an escape
//! character. The subset implemented here covers everything the command
//! dispatcher needs:
//!
//! - **Initialization**: reset to power-on defaults
//! - **Text styling**: alignment, bold, character size
//! - **Paper control**: line feeds, cutting
//! - **Peripherals**: cash drawer kick-out pulse
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding: a `u16` length of
//! 0x1234 is sent as `[0x34, 0x12]`.
//!
//! ## Design
//!
//! Every function is a pure mapping from semantic parameters to bytes; no
//! state is kept here. Cosmetic parameters outside the recognized range map
//! to the nearest defined default instead of erroring — printer formatting
//! must never abort a job over a cosmetic value.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
///
/// Most ESC/POS commands begin with ESC (0x1B). This byte signals the start
/// of a control sequence rather than printable text.
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Prefixes cut, character-size and two-dimensional symbol commands.
/// Hex: 0x1D, Decimal: 29
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on default state. Issued explicitly via
/// `printer_init`; it is never auto-sent by the dispatcher.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## What Gets Reset
///
/// - Print buffer is cleared
/// - Text formatting (bold, size) disabled
/// - Alignment reset to left
///
/// ## Example
///
/// ```
/// use recibo::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    /// Map a host-supplied alignment value onto the recognized set.
    ///
    /// Values outside {0, 1, 2} map to [`Alignment::Left`] — an unknown
    /// alignment is a cosmetic problem, not a reason to fail a print job.
    pub fn from_value(value: i32) -> Self {
        match value {
            1 => Alignment::Center,
            2 => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

/// # Set Text Alignment (ESC a n)
///
/// Sets the alignment for subsequent text lines.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
/// | Decimal | 27 97 n |
///
/// ## Parameters
///
/// - `n = 0`: Left alignment (default)
/// - `n = 1`: Center alignment
/// - `n = 2`: Right alignment
///
/// ## Example
///
/// ```
/// use recibo::protocol::commands::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// TEXT EMPHASIS (BOLD)
// ============================================================================

/// # Enable Bold (ESC E 1)
///
/// Turns on emphasized printing for subsequent text.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1B 45 01 |
#[inline]
pub fn bold_on() -> Vec<u8> {
    vec![ESC, b'E', 1]
}

/// # Disable Bold (ESC E 0)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1B 45 00 |
#[inline]
pub fn bold_off() -> Vec<u8> {
    vec![ESC, b'E', 0]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// # Double Height (ESC ! 0x10)
///
/// Selects the double-height print mode.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1B 21 10 |
#[inline]
pub fn double_height() -> Vec<u8> {
    vec![ESC, b'!', 0x10]
}

/// # Double Width (ESC ! 0x20)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1B 21 20 |
#[inline]
pub fn double_width() -> Vec<u8> {
    vec![ESC, b'!', 0x20]
}

/// # Double Size (ESC ! 0x30)
///
/// Double height and double width at once.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1B 21 30 |
#[inline]
pub fn double_size() -> Vec<u8> {
    vec![ESC, b'!', 0x30]
}

/// # Normal Size (ESC ! 0x00)
///
/// Resets the print mode to the default character size.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1B 21 00 |
#[inline]
pub fn size_normal() -> Vec<u8> {
    vec![ESC, b'!', 0x00]
}

/// # Font Size by Point Value
///
/// Maps a host-supplied point size onto the discrete ESC/POS size modes.
/// The binning is monotone:
///
/// | Points | Mode |
/// |--------|------|
/// | ≥ 48 | double size |
/// | 36–47 | double height |
/// | < 36 | normal |
///
/// ## Example
///
/// ```
/// use recibo::protocol::commands;
///
/// assert_eq!(commands::font_size(48), commands::double_size());
/// assert_eq!(commands::font_size(36), commands::double_height());
/// assert_eq!(commands::font_size(24), commands::size_normal());
/// ```
pub fn font_size(points: i32) -> Vec<u8> {
    if points >= 48 {
        double_size()
    } else if points >= 36 {
        double_height()
    } else {
        size_normal()
    }
}

// ============================================================================
// PAPER FEED AND CUT
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Prints any data in the line buffer and feeds the paper forward by `n`
/// lines.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC d n |
/// | Hex     | 1B 64 n |
/// | Decimal | 27 100 n |
///
/// ## Example
///
/// ```
/// use recibo::protocol::commands;
///
/// assert_eq!(commands::feed_lines(3), vec![0x1B, 0x64, 3]);
/// ```
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// # Full Cut (GS V 0)
///
/// Performs a full cut at the current paper position.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | Hex     | 1D 56 00 |
///
/// Cutting at the current position can slice through printed content; use
/// [`cut_feed`] for the end of a receipt.
#[inline]
pub fn cut() -> Vec<u8> {
    vec![GS, b'V', 0]
}

/// How far the paper is fed before cutting, in lines.
///
/// Moves the last printed line past the cutter blade.
pub const CUT_FEED_LINES: u8 = 5;

/// # Feed Then Full Cut
///
/// Feeds [`CUT_FEED_LINES`] lines so the cut lands past the printed
/// content, then performs a full cut. This is the sequence used at the end
/// of every receipt.
///
/// ## Example
///
/// ```
/// use recibo::protocol::commands;
///
/// assert_eq!(
///     commands::cut_feed(),
///     vec![0x1B, 0x64, 0x05, 0x1D, 0x56, 0x00],
/// );
/// ```
pub fn cut_feed() -> Vec<u8> {
    let mut data = feed_lines(CUT_FEED_LINES);
    data.extend(cut());
    data
}

// ============================================================================
// CASH DRAWER
// ============================================================================

/// # Cash Drawer Kick-Out Pulse (ESC p m t1 t2)
///
/// Sends a pulse to the drawer connector on pin 2.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC p m t1 t2 |
/// | Hex     | 1B 70 00 19 FA |
///
/// ## Parameters
///
/// - `m = 0`: pin 2
/// - `t1 = 0x19`: pulse ON time (25 × 2 ms = 50 ms)
/// - `t2 = 0xFA`: pulse OFF time (250 × 2 ms = 500 ms)
#[inline]
pub fn open_drawer() -> Vec<u8> {
    vec![ESC, b'p', 0x00, 0x19, 0xFA]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_alignment_out_of_range_maps_to_left() {
        for value in [-1, 3, 4, 255, i32::MIN, i32::MAX] {
            assert_eq!(
                align(Alignment::from_value(value)),
                align(Alignment::Left),
                "value {} must encode like left alignment",
                value
            );
        }
    }

    #[test]
    fn test_bold() {
        assert_eq!(bold_on(), vec![0x1B, 0x45, 0x01]);
        assert_eq!(bold_off(), vec![0x1B, 0x45, 0x00]);
    }

    #[test]
    fn test_size_modes() {
        assert_eq!(double_height(), vec![0x1B, 0x21, 0x10]);
        assert_eq!(double_width(), vec![0x1B, 0x21, 0x20]);
        assert_eq!(double_size(), vec![0x1B, 0x21, 0x30]);
        assert_eq!(size_normal(), vec![0x1B, 0x21, 0x00]);
    }

    #[test]
    fn test_font_size_binning() {
        assert_eq!(font_size(72), double_size());
        assert_eq!(font_size(48), double_size());
        assert_eq!(font_size(47), double_height());
        assert_eq!(font_size(36), double_height());
        assert_eq!(font_size(35), size_normal());
        assert_eq!(font_size(24), size_normal());
        assert_eq!(font_size(0), size_normal());
        assert_eq!(font_size(-10), size_normal());
    }

    #[test]
    fn test_font_size_is_pure() {
        // Same input, same bytes, regardless of call order
        let first = font_size(48);
        let _ = font_size(12);
        assert_eq!(font_size(48), first);
    }

    #[test]
    fn test_feed_lines() {
        assert_eq!(feed_lines(0), vec![0x1B, 0x64, 0x00]);
        assert_eq!(feed_lines(3), vec![0x1B, 0x64, 0x03]);
        assert_eq!(feed_lines(255), vec![0x1B, 0x64, 0xFF]);
    }

    #[test]
    fn test_cut() {
        assert_eq!(cut(), vec![0x1D, 0x56, 0x00]);
    }

    #[test]
    fn test_cut_feed_is_feed_then_cut() {
        let mut expected = feed_lines(CUT_FEED_LINES);
        expected.extend(cut());
        assert_eq!(cut_feed(), expected);
        assert_eq!(cut_feed(), vec![0x1B, 0x64, 0x05, 0x1D, 0x56, 0x00]);
    }

    #[test]
    fn test_open_drawer() {
        let pulse = open_drawer();
        assert_eq!(pulse.len(), 5);
        assert_eq!(pulse, vec![0x1B, 0x70, 0x00, 0x19, 0xFA]);
    }
}
