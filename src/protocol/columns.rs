//! # Tabular Text Composition
//!
//! Receipt printers have no native column primitive in the subset of the
//! protocol used here; tabular output is composed host-side into one plain
//! text line and then encoded like any other text.
//!
//! ## Rules
//!
//! - Text longer than the declared column width is truncated to exactly
//!   that width first.
//! - Left-aligned columns pad on the right, right-aligned columns pad on
//!   the left.
//! - Centered columns split the padding as evenly as possible, with the
//!   extra space on the right when the split is odd.

use super::commands::Alignment;

/// One column of a tabular line
#[derive(Debug, Clone)]
pub struct Column {
    /// Cell content
    pub text: String,
    /// Declared width in characters
    pub width: usize,
    /// Justification inside the cell
    pub align: Alignment,
}

impl Column {
    pub fn new(text: impl Into<String>, width: usize, align: Alignment) -> Self {
        Self {
            text: text.into(),
            width,
            align,
        }
    }
}

/// Compose columns into a single newline-terminated text line.
///
/// ## Example
///
/// ```
/// use recibo::protocol::columns::{compose, Column};
/// use recibo::protocol::commands::Alignment;
///
/// let line = compose(&[
///     Column::new("2x Kebab", 12, Alignment::Left),
///     Column::new("$18.00", 8, Alignment::Right),
/// ]);
/// assert_eq!(line, "2x Kebab      $18.00\n");
/// ```
pub fn compose(columns: &[Column]) -> String {
    let mut line = String::new();
    for column in columns {
        line.push_str(&justify(&column.text, column.width, column.align));
    }
    line.push('\n');
    line
}

/// Truncate `text` to `width` characters, then pad it out per `align`.
fn justify(text: &str, width: usize, align: Alignment) -> String {
    let truncated: String = text.chars().take(width).collect();
    let padding = width - truncated.chars().count();

    match align {
        Alignment::Left => format!("{}{}", truncated, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), truncated),
        Alignment::Center => {
            let left = padding / 2;
            let right = padding - left;
            format!("{}{}{}", " ".repeat(left), truncated, " ".repeat(right))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
