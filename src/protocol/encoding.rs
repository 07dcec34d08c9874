//! # Legacy Text Encoding
//!
//! The byte-oriented printers addressed here expect text in GBK, a legacy
//! single/double-byte encoding, not UTF-8. Re-encoding before transmission
//! is a hard compatibility requirement of the hardware, not a stylistic
//! choice: sending raw UTF-8 produces mojibake on every non-ASCII glyph.
//!
//! Unmappable characters are replaced rather than failing the job.

use encoding::all::GBK;
use encoding::types::{EncoderTrap, Encoding};

/// Re-encode UTF-8 text into GBK bytes for the wire.
///
/// ASCII passes through unchanged (GBK is an ASCII superset); characters
/// with no GBK mapping are substituted via the replacement trap.
///
/// ## Example
///
/// ```
/// use recibo::protocol::encoding::encode_text;
///
/// // ASCII is identical in GBK
/// assert_eq!(encode_text("Hi"), b"Hi");
/// ```
pub fn encode_text(text: &str) -> Vec<u8> {
    GBK.encode(text, EncoderTrap::Replace)
        // Replace substitutes unmappable characters, so encoding cannot
        // fail in practice; degrade to the raw bytes if it ever does.
        .unwrap_or_else(|_| text.as_bytes().to_vec())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(encode_text("Hello, World! 123"), b"Hello, World! 123");
    }

    #[test]
    fn test_newlines_preserved() {
        assert_eq!(encode_text("a\nb\n"), b"a\nb\n");
    }

    #[test]
    fn test_cjk_is_double_byte() {
        // U+4E2D (中) is 0xD6D0 in GBK
        assert_eq!(encode_text("中"), vec![0xD6, 0xD0]);
    }

    #[test]
    fn test_unmappable_replaced_not_failed() {
        // No GBK mapping for the snowman; must produce output regardless
        let bytes = encode_text("before\u{2603}after");
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"before"));
        assert!(bytes.ends_with(b"after"));
    }
}
