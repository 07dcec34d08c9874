//! # Command Dispatcher
//!
//! The public [`Printer`] surface. Every semantic operation is routed to
//! whichever backend the active connection provides:
//!
//! - an open byte transport gets [`protocol`](crate::protocol) command
//!   bytes written to it;
//! - the embedded engine gets capability-probed vendor calls through the
//!   [`EngineAdapter`](crate::engine::EngineAdapter).
//!
//! With nothing connected, every print operation fails fast with
//! [`PrinterError::NotConnected`] before any I/O is attempted. Connection
//! management calls (`connect`, `disconnect`, `discover`, `get_status`,
//! `subscribe`) are always available.

use std::sync::mpsc::Receiver;

use crate::connection::{
    ConnectTarget, ConnectionManager, DeviceDescriptor, PrinterEvent, PrinterStatus,
};
use crate::engine::{EngineAdapter, EngineProvider, RasterImage, TextStyle};
use crate::error::{PrinterError, Result};
use crate::protocol::columns::{self, Column};
use crate::protocol::commands::{self, Alignment};
use crate::protocol::{encoding, qr};
use crate::transport::{Transport, TransportFactory};

/// Which backend handles the current operation
enum Route<'a> {
    Engine(EngineAdapter),
    Wire(&'a mut dyn Transport),
}

/// # Receipt Printer
///
/// One logical printer over the embedded engine, Bluetooth SPP and USB.
pub struct Printer {
    manager: ConnectionManager,
}

impl Printer {
    /// Printer over the real OS transports
    pub fn new(provider: Box<dyn EngineProvider>) -> Self {
        Self {
            manager: ConnectionManager::new(provider),
        }
    }

    /// Printer with an injected transport factory (tests use this)
    pub fn with_factory(
        provider: Box<dyn EngineProvider>,
        factory: Box<dyn TransportFactory>,
    ) -> Self {
        Self {
            manager: ConnectionManager::with_factory(provider, factory),
        }
    }

    // ------------------------------------------------------------------
    // Connection surface
    // ------------------------------------------------------------------

    /// Startup-only embedded probe; never touches Bluetooth or USB
    pub fn auto_connect(&mut self) {
        self.manager.auto_connect();
    }

    pub fn connect(&mut self, target: &ConnectTarget) -> Result<()> {
        self.manager.connect(target)
    }

    /// Close the pluggable transport; the embedded engine stays confirmed
    pub fn disconnect(&mut self) {
        self.manager.disconnect();
    }

    pub fn discover(&mut self) -> Vec<DeviceDescriptor> {
        self.manager.discover()
    }

    pub fn get_status(&mut self) -> PrinterStatus {
        self.manager.status()
    }

    /// Subscribe to connection events; each call replaces the previous
    /// subscriber
    pub fn subscribe(&mut self) -> Receiver<PrinterEvent> {
        self.manager.subscribe()
    }

    /// Pick the backend for a print operation.
    ///
    /// An open byte transport wins over the engine, mirroring how the
    /// derived connection state reports the transport's kind. No handle at
    /// all is the fail-fast `NotConnected` path — the single check that
    /// guarantees zero I/O for every operation below.
    fn route(&mut self) -> Result<Route<'_>> {
        self.manager.poll_probe();
        if self.manager.transport().is_some() {
            // Re-borrow through the accessor to give the route the right
            // lifetime
            return Ok(Route::Wire(
                self.manager
                    .transport()
                    .ok_or(PrinterError::NotConnected)?,
            ));
        }
        if let Some(engine) = self.manager.engine() {
            return Ok(Route::Engine(engine));
        }
        Err(PrinterError::NotConnected)
    }

    // ------------------------------------------------------------------
    // Printing surface
    // ------------------------------------------------------------------

    /// Reset the printer to power-on defaults.
    ///
    /// Only ever sent when asked — no operation in this crate auto-inits.
    /// The engine manages its own initialization, so the embedded path
    /// succeeds without action.
    pub fn printer_init(&mut self) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&commands::init()),
            Route::Engine(_) => Ok(()),
        }
    }

    /// Set alignment for subsequent lines. Out-of-range values map to left.
    pub fn set_alignment(&mut self, alignment: i32) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&commands::align(Alignment::from_value(alignment))),
            Route::Engine(_) => Ok(()),
        }
    }

    /// Set the character size for subsequent lines (point value, binned)
    pub fn set_font_size(&mut self, points: i32) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&commands::font_size(points)),
            Route::Engine(_) => Ok(()),
        }
    }

    /// Print text in the current style
    pub fn print_text(&mut self, text: &str) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&encoding::encode_text(text)),
            Route::Engine(engine) => engine.print_text(text, &TextStyle {
                font_size: 0,
                alignment: Alignment::Left,
                bold: false,
            }),
        }
    }

    /// Print text at a specific size, restoring normal size afterwards
    pub fn print_text_with_font(&mut self, text: &str, points: i32) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => {
                let mut data = commands::font_size(points);
                data.extend(encoding::encode_text(text));
                data.extend(commands::size_normal());
                t.write_all(&data)
            }
            Route::Engine(engine) => engine.print_text(text, &TextStyle {
                font_size: points,
                alignment: Alignment::Left,
                bold: false,
            }),
        }
    }

    /// Print text with full styling, restoring defaults afterwards
    pub fn print_text_styled(
        &mut self,
        text: &str,
        points: i32,
        alignment: i32,
        bold: bool,
    ) -> Result<()> {
        let alignment = Alignment::from_value(alignment);
        match self.route()? {
            Route::Wire(t) => {
                let mut data = commands::align(alignment);
                if bold {
                    data.extend(commands::bold_on());
                }
                data.extend(commands::font_size(points));
                data.extend(encoding::encode_text(text));
                data.extend(commands::size_normal());
                if bold {
                    data.extend(commands::bold_off());
                }
                t.write_all(&data)
            }
            Route::Engine(engine) => engine.print_text(text, &TextStyle {
                font_size: points,
                alignment,
                bold,
            }),
        }
    }

    /// Print one tabular line composed from columns
    pub fn print_columns(&mut self, columns: &[Column]) -> Result<()> {
        let line = columns::compose(columns);
        self.print_text(&line)
    }

    /// Print a QR symbol
    pub fn print_qr_code(&mut self, data: &str, module_size: u8, alignment: i32) -> Result<()> {
        let alignment = Alignment::from_value(alignment);
        match self.route()? {
            Route::Wire(t) => {
                let mut bytes = commands::align(alignment);
                bytes.extend(qr::qr(data.as_bytes(), module_size));
                t.write_all(&bytes)
            }
            Route::Engine(engine) => engine.print_qr(data, module_size, alignment),
        }
    }

    /// Print a 1-bpp raster image.
    ///
    /// Only the embedded engine rasterizes images; on byte transports this
    /// fails `Unsupported` instead of silently printing nothing.
    pub fn print_bitmap(&mut self, image: &RasterImage, alignment: i32) -> Result<()> {
        if !image.is_well_formed() {
            return Err(PrinterError::Engine(format!(
                "raster data length {} does not match {}x{}",
                image.data.len(),
                image.width,
                image.height
            )));
        }
        match self.route()? {
            Route::Wire(_) => Err(PrinterError::Unsupported(
                "bitmap printing requires the embedded engine",
            )),
            Route::Engine(engine) => engine.print_bitmap(image, Alignment::from_value(alignment)),
        }
    }

    /// Feed `lines` blank lines
    pub fn line_wrap(&mut self, lines: u8) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&commands::feed_lines(lines)),
            Route::Engine(engine) => engine.feed(lines),
        }
    }

    /// Feed past the tear bar and cut
    pub fn cut_paper(&mut self) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&commands::cut_feed()),
            Route::Engine(engine) => engine.finish_receipt(),
        }
    }

    /// Finish the current receipt (feed out and cut where hardware allows)
    pub fn print_receipt(&mut self) -> Result<()> {
        self.cut_paper()
    }

    /// Kick the cash drawer
    pub fn open_drawer(&mut self) -> Result<()> {
        match self.route()? {
            Route::Wire(t) => t.write_all(&commands::open_drawer()),
            Route::Engine(engine) => engine.open_drawer(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NullProvider;
    use crate::transport::TransportKind;

    struct NoTransports;
    impl TransportFactory for NoTransports {
        fn open(&self, _kind: TransportKind, address: &str) -> Result<Box<dyn Transport>> {
            Err(PrinterError::DeviceNotFound(address.to_string()))
        }
        fn scan_bluetooth(&self) -> Vec<(String, String)> {
            Vec::new()
        }
        fn scan_usb(&self) -> Vec<(String, String)> {
            Vec::new()
        }
    }

    fn disconnected_printer() -> Printer {
        Printer::with_factory(Box::new(NullProvider), Box::new(NoTransports))
    }

    #[test]
    fn test_every_print_operation_fails_fast_when_disconnected() {
        let mut printer = disconnected_printer();
        let image = RasterImage {
            width: 8,
            height: 1,
            data: vec![0xFF],
        };

        assert!(matches!(printer.printer_init(), Err(PrinterError::NotConnected)));
        assert!(matches!(printer.set_alignment(1), Err(PrinterError::NotConnected)));
        assert!(matches!(printer.set_font_size(36), Err(PrinterError::NotConnected)));
        assert!(matches!(printer.print_text("x"), Err(PrinterError::NotConnected)));
        assert!(matches!(
            printer.print_text_with_font("x", 48),
            Err(PrinterError::NotConnected)
        ));
        assert!(matches!(
            printer.print_text_styled("x", 48, 1, true),
            Err(PrinterError::NotConnected)
        ));
        assert!(matches!(
            printer.print_columns(&[Column::new("x", 4, Alignment::Left)]),
            Err(PrinterError::NotConnected)
        ));
        assert!(matches!(
            printer.print_qr_code("x", 4, 1),
            Err(PrinterError::NotConnected)
        ));
        assert!(matches!(
            printer.print_bitmap(&image, 0),
            Err(PrinterError::NotConnected)
        ));
        assert!(matches!(printer.line_wrap(3), Err(PrinterError::NotConnected)));
        assert!(matches!(printer.cut_paper(), Err(PrinterError::NotConnected)));
        assert!(matches!(printer.open_drawer(), Err(PrinterError::NotConnected)));
        assert!(matches!(printer.print_receipt(), Err(PrinterError::NotConnected)));
    }

    #[test]
    fn test_status_and_discover_always_available() {
        let mut printer = disconnected_printer();
        assert!(!printer.get_status().connected);
        assert!(printer.discover().is_empty());
        printer.disconnect(); // infallible even when disconnected
    }

    #[test]
    fn test_malformed_raster_rejected_before_routing() {
        let mut printer = disconnected_printer();
        let bad = RasterImage {
            width: 16,
            height: 2,
            data: vec![0; 3], // needs 4 bytes
        };
        // Shape validation reports the data problem, not the connection
        assert!(matches!(
            printer.print_bitmap(&bad, 0),
            Err(PrinterError::Engine(_))
        ));
    }
}
