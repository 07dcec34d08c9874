//! # Embedded Print Engine
//!
//! Abstraction over the vendor print engine built into some host devices.
//!
//! The engine is not a byte pipe. It is an object graph whose surface
//! varies by firmware revision: the root handle exposes optional sub-APIs,
//! and each sub-API exposes some subset of the known call signatures.
//! Callers therefore never assume a capability exists — every operation is
//! probed at call time through an ordered candidate list, handled by
//! [`adapter::EngineAdapter`].
//!
//! ## Probe Lifecycle
//!
//! Acquiring the engine is asynchronous and has two distinct milestones:
//!
//! 1. **Probe accepted** — the host agreed to look for an engine
//!    ([`EngineProvider::probe`] returned `Ok`).
//! 2. **Probe confirmed** — a live [`PrintEngine`] handle arrived on the
//!    channel passed to the probe.
//!
//! "Accepted" must never be reported as connected; only a confirmed handle
//! flips the connection state.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::error::Result;
use crate::protocol::Alignment;

pub mod adapter;

pub use adapter::EngineAdapter;

/// Why a single vendor call did not complete.
///
/// The distinction matters for fallback: a [`Missing`](EngineCallError::Missing)
/// signature means "try the next candidate", while a
/// [`Failed`](EngineCallError::Failed) call means the firmware has the
/// capability and it genuinely broke — falling back would hide a real fault.
#[derive(Debug, Clone)]
pub enum EngineCallError {
    /// This candidate signature does not exist in the firmware binding
    Missing,
    /// The signature exists but the call failed
    Failed(String),
}

/// Outcome of one candidate vendor call
pub type EngineCall<T = ()> = std::result::Result<T, EngineCallError>;

/// Text styling parameters for the styled-text candidate
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub font_size: i32,
    pub alignment: Alignment,
    pub bold: bool,
}

/// Firmware-built QR styling handle.
///
/// Constructed through [`LineApi::qr_style`] so firmware that cannot build
/// one reports [`EngineCallError::Missing`] and the adapter falls back to
/// the plain QR signature.
#[derive(Debug, Clone, Copy)]
pub struct QrStyle {
    pub module_size: u8,
    pub alignment: Alignment,
}

/// 1-bit-per-pixel raster image, row-major, rows padded to whole bytes.
///
/// Decoding image formats is the caller's problem; this layer only moves
/// already-rasterized data.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Bytes per row (width rounded up to a whole byte)
    pub fn row_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Whether `data` holds exactly `height` padded rows
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.row_bytes() * self.height as usize
    }
}

// ============================================================================
// ENGINE OBJECT GRAPH
// ============================================================================

/// Line-printing sub-API of the vendor engine.
///
/// Every method is a *candidate signature*: the default body reports
/// [`EngineCallError::Missing`], and a firmware binding overrides only the
/// signatures it actually has. The adapter decides fallback order; nothing
/// here may be called directly by the dispatcher.
#[allow(unused_variables)]
pub trait LineApi {
    fn print_text_styled(&self, text: &str, style: &TextStyle) -> EngineCall {
        Err(EngineCallError::Missing)
    }

    fn print_text(&self, text: &str) -> EngineCall {
        Err(EngineCallError::Missing)
    }

    /// Build a firmware styling handle for QR output
    fn qr_style(&self, module_size: u8, alignment: Alignment) -> EngineCall<QrStyle> {
        Err(EngineCallError::Missing)
    }

    fn print_qr_styled(&self, data: &str, style: &QrStyle) -> EngineCall {
        Err(EngineCallError::Missing)
    }

    fn print_qr(&self, data: &str, module_size: u8) -> EngineCall {
        Err(EngineCallError::Missing)
    }

    fn print_bitmap(&self, image: &RasterImage, alignment: Alignment) -> EngineCall {
        Err(EngineCallError::Missing)
    }

    fn print_blank_lines(&self, lines: u8) -> EngineCall {
        Err(EngineCallError::Missing)
    }

    /// Finish the receipt (feed past the tear bar, cut where hardware allows)
    fn auto_out(&self) -> EngineCall {
        Err(EngineCallError::Missing)
    }
}

/// Cash-drawer sub-API of the vendor engine
pub trait DrawerApi {
    fn open(&self) -> EngineCall {
        Err(EngineCallError::Missing)
    }
}

/// Root handle of the embedded vendor print engine.
///
/// Sub-APIs are optional per firmware; `None` means the whole family of
/// capabilities is absent on this device.
pub trait PrintEngine: Send + Sync {
    /// Human-readable engine identity for logs and discovery
    fn name(&self) -> &str;

    fn line_api(&self) -> Option<&dyn LineApi>;

    fn drawer_api(&self) -> Option<&dyn DrawerApi> {
        None
    }
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Host-side source of the embedded engine.
///
/// `probe` starts the asynchronous acquisition: returning `Ok` means the
/// probe was *accepted*; the engine handle arriving on `tx` later is the
/// *confirmation*. The two must never be conflated.
pub trait EngineProvider: Send {
    /// Begin looking for the vendor engine, delivering it on `tx` when found
    fn probe(&mut self, tx: Sender<Arc<dyn PrintEngine>>) -> Result<()>;

    /// Release vendor-side resources at shutdown
    fn shutdown(&mut self) {}
}

/// Provider for hosts without any embedded engine.
///
/// The probe is rejected outright, so startup auto-connect leaves the
/// state machine in Disconnected instead of waiting on a confirmation
/// that can never arrive.
#[derive(Debug, Default)]
pub struct NullProvider;

impl EngineProvider for NullProvider {
    fn probe(&mut self, _tx: Sender<Arc<dyn PrintEngine>>) -> Result<()> {
        Err(crate::error::PrinterError::TransportUnavailable(
            "no embedded print engine on this host".to_string(),
        ))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct BareLineApi;
    impl LineApi for BareLineApi {}

    #[test]
    fn test_candidate_defaults_report_missing() {
        let api = BareLineApi;
        assert!(matches!(api.print_text("x"), Err(EngineCallError::Missing)));
        assert!(matches!(
            api.qr_style(4, Alignment::Center),
            Err(EngineCallError::Missing)
        ));
        assert!(matches!(api.auto_out(), Err(EngineCallError::Missing)));
    }

    #[test]
    fn test_null_provider_rejects_probe() {
        let (tx, rx) = mpsc::channel();
        let mut provider = NullProvider;
        assert!(provider.probe(tx).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_raster_image_row_geometry() {
        let image = RasterImage {
            width: 12, // pads to 2 bytes per row
            height: 3,
            data: vec![0; 6],
        };
        assert_eq!(image.row_bytes(), 2);
        assert!(image.is_well_formed());

        let short = RasterImage {
            width: 12,
            height: 3,
            data: vec![0; 5],
        };
        assert!(!short.is_well_formed());
    }
}
