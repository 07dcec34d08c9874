//! # Capability Adapter
//!
//! Maps each semantic print operation onto an ordered list of candidate
//! vendor signatures and walks the list at call time.
//!
//! ## Fallback Rules
//!
//! - [`EngineCallError::Missing`] moves on to the next candidate; firmware
//!   surfaces change between revisions and the adapter never caches which
//!   signatures exist — every call re-probes.
//! - [`EngineCallError::Failed`] from a *print* call stops the walk and
//!   surfaces [`PrinterError::Engine`]: the capability is present and
//!   broke, and falling back would mask the fault. A failure while merely
//!   *constructing a style object* is treated like a missing signature —
//!   styling is dressing, and the unstyled candidate still prints.
//! - A fully exhausted list (or an absent sub-API) surfaces
//!   [`PrinterError::CapabilityUnavailable`].

use std::sync::Arc;

use crate::engine::{EngineCall, EngineCallError, PrintEngine, RasterImage, TextStyle};
use crate::error::{PrinterError, Result};
use crate::protocol::Alignment;

/// Dispatcher-facing view of one confirmed engine handle
pub struct EngineAdapter {
    engine: Arc<dyn PrintEngine>,
}

impl EngineAdapter {
    pub fn new(engine: Arc<dyn PrintEngine>) -> Self {
        Self { engine }
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    /// Print text, preferring the styled signature.
    ///
    /// Candidates: `print_text_styled` → `print_text`. The plain fallback
    /// drops styling rather than failing the job.
    pub fn print_text(&self, text: &str, style: &TextStyle) -> Result<()> {
        let api = self.line_api("text printing")?;
        match api.print_text_styled(text, style) {
            Err(EngineCallError::Missing) => {
                log::debug!("styled text signature missing, falling back to plain");
                finish(api.print_text(text), "text printing")
            }
            outcome => finish(outcome, "text printing"),
        }
    }

    /// Print a QR symbol.
    ///
    /// Candidates: build a firmware [`QrStyle`] and call `print_qr_styled`;
    /// any failure of style *construction* falls back to `print_qr` — the
    /// style object is cosmetic dressing, and a firmware that cannot build
    /// one can still print the symbol. Only a failed *print* call aborts.
    pub fn print_qr(&self, data: &str, module_size: u8, alignment: Alignment) -> Result<()> {
        let api = self.line_api("qr printing")?;

        let styled = match api.qr_style(module_size, alignment) {
            Ok(style) => api.print_qr_styled(data, &style),
            Err(e) => {
                if let EngineCallError::Failed(message) = &e {
                    log::debug!("qr style construction failed ({}), using plain path", message);
                }
                Err(EngineCallError::Missing)
            }
        };

        match styled {
            Err(EngineCallError::Missing) => {
                log::debug!("styled qr path missing, falling back to plain");
                finish(api.print_qr(data, module_size), "qr printing")
            }
            outcome => finish(outcome, "qr printing"),
        }
    }

    pub fn print_bitmap(&self, image: &RasterImage, alignment: Alignment) -> Result<()> {
        let api = self.line_api("bitmap printing")?;
        finish(api.print_bitmap(image, alignment), "bitmap printing")
    }

    pub fn feed(&self, lines: u8) -> Result<()> {
        let api = self.line_api("paper feed")?;
        finish(api.print_blank_lines(lines), "paper feed")
    }

    /// Finish the receipt: feed past the tear bar, cut where hardware allows
    pub fn finish_receipt(&self) -> Result<()> {
        let api = self.line_api("receipt finish")?;
        finish(api.auto_out(), "receipt finish")
    }

    pub fn open_drawer(&self) -> Result<()> {
        let api = self
            .engine
            .drawer_api()
            .ok_or(PrinterError::CapabilityUnavailable("cash drawer"))?;
        finish(api.open(), "cash drawer")
    }

    fn line_api(&self, operation: &'static str) -> Result<&dyn super::LineApi> {
        self.engine
            .line_api()
            .ok_or(PrinterError::CapabilityUnavailable(operation))
    }
}

/// Map the last candidate's outcome onto the public error surface.
fn finish(outcome: EngineCall, operation: &'static str) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(EngineCallError::Missing) => Err(PrinterError::CapabilityUnavailable(operation)),
        Err(EngineCallError::Failed(message)) => Err(PrinterError::Engine(message)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
