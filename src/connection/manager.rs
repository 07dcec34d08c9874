//! # Connection Manager
//!
//! Owns both printer lifecycles — the embedded engine handle and the
//! pluggable byte transport — and derives the public connection state from
//! them.
//!
//! ## Invariants
//!
//! - At most one pluggable transport is open at a time; connecting to a new
//!   one tears the old one down *first*, so there is never a moment with
//!   two OS handles held.
//! - `disconnect()` never releases the engine. The vendor binding is
//!   process-scoped; dropping it would require a host restart to recover.
//! - An accepted probe is not a connection. Only the engine handle
//!   arriving on the probe channel flips the state to connected.
//! - A failed connect leaves the previous (already torn down) state as it
//!   is; it never fabricates a connection.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crate::connection::{
    ConnectTarget, ConnectionState, DeviceDescriptor, PrinterEvent, PrinterStatus,
};
use crate::engine::{EngineAdapter, EngineProvider, PrintEngine};
use crate::error::{PrinterError, Result};
use crate::transport::{SystemTransports, Transport, TransportFactory, TransportKind};

/// How long a blocking `connect(Embedded)` waits for probe confirmation
const PROBE_CONFIRM_TIMEOUT: Duration = Duration::from_secs(2);

/// # Printer Connection Manager
pub struct ConnectionManager {
    provider: Box<dyn EngineProvider>,
    factory: Box<dyn TransportFactory>,
    engine: Option<Arc<dyn PrintEngine>>,
    /// Outstanding probe confirmation channel; also the duplicate-probe guard
    pending_probe: Option<Receiver<Arc<dyn PrintEngine>>>,
    transport: Option<Box<dyn Transport>>,
    events: Option<Sender<PrinterEvent>>,
}

impl ConnectionManager {
    /// Manager over the real OS transports
    pub fn new(provider: Box<dyn EngineProvider>) -> Self {
        Self::with_factory(provider, Box::new(SystemTransports))
    }

    /// Manager with an injected transport factory (tests use this)
    pub fn with_factory(
        provider: Box<dyn EngineProvider>,
        factory: Box<dyn TransportFactory>,
    ) -> Self {
        Self {
            provider,
            factory,
            engine: None,
            pending_probe: None,
            transport: None,
            events: None,
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Current state, derived from the live handles
    pub fn state(&self) -> ConnectionState {
        if let Some(transport) = &self.transport {
            if transport.is_open() {
                return ConnectionState::Connected(transport.kind());
            }
        }
        if self.engine.is_some() {
            return ConnectionState::Connected(TransportKind::Embedded);
        }
        if self.pending_probe.is_some() {
            return ConnectionState::Connecting;
        }
        ConnectionState::Disconnected
    }

    /// Status snapshot. Reads memory only — the single exception is
    /// draining the probe channel, which is a non-blocking channel poll,
    /// not transport I/O.
    pub fn status(&mut self) -> PrinterStatus {
        self.poll_probe();
        match self.state() {
            ConnectionState::Connected(kind) => PrinterStatus::connected(kind),
            _ => PrinterStatus::disconnected(),
        }
    }

    /// Adapter over the confirmed engine, when routing targets it
    pub fn engine(&self) -> Option<EngineAdapter> {
        self.engine.clone().map(EngineAdapter::new)
    }

    /// Mutable access to the open byte transport, when one is held
    pub fn transport(&mut self) -> Option<&mut dyn Transport> {
        match self.transport.as_mut() {
            Some(t) if t.is_open() => Some(t.as_mut()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Probe lifecycle
    // ------------------------------------------------------------------

    /// Startup-only: issue the embedded-engine probe and return.
    ///
    /// Never touches Bluetooth or USB. A rejected probe (for example on a
    /// host without the vendor service) leaves the manager Disconnected
    /// without error — startup must not fail over optional hardware.
    pub fn auto_connect(&mut self) {
        if self.engine.is_some() || self.pending_probe.is_some() {
            return; // probe already confirmed or outstanding
        }
        let (tx, rx) = mpsc::channel();
        match self.provider.probe(tx) {
            Ok(()) => {
                log::info!("embedded engine probe accepted, awaiting confirmation");
                self.pending_probe = Some(rx);
            }
            Err(e) => {
                log::debug!("embedded engine probe rejected: {}", e);
            }
        }
    }

    /// Drain the probe channel without blocking; promote a confirmed
    /// engine to connected.
    pub fn poll_probe(&mut self) {
        if let Some(rx) = &self.pending_probe {
            match rx.try_recv() {
                Ok(engine) => self.confirm_engine(engine),
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("embedded engine probe abandoned by provider");
                    self.pending_probe = None;
                }
            }
        }
    }

    fn confirm_engine(&mut self, engine: Arc<dyn PrintEngine>) {
        log::info!("embedded engine confirmed: {}", engine.name());
        let name = engine.name().to_string();
        self.engine = Some(engine);
        self.pending_probe = None;
        self.emit(PrinterEvent::Connected {
            kind: TransportKind::Embedded,
            name: Some(name),
        });
    }

    // ------------------------------------------------------------------
    // Connect / disconnect
    // ------------------------------------------------------------------

    /// Connect to a specific target.
    ///
    /// Embedded is idempotent once confirmed; an outstanding probe is
    /// awaited (bounded), never duplicated. Bluetooth and USB tear down
    /// any open pluggable transport before opening the new one.
    pub fn connect(&mut self, target: &ConnectTarget) -> Result<()> {
        match target {
            ConnectTarget::Embedded => self.connect_embedded(),
            ConnectTarget::Bluetooth { address } => {
                self.connect_transport(TransportKind::Bluetooth, address)
            }
            ConnectTarget::Usb { address } => self.connect_transport(TransportKind::Usb, address),
        }
    }

    fn connect_embedded(&mut self) -> Result<()> {
        self.poll_probe();
        if self.engine.is_some() {
            return Ok(()); // already confirmed
        }

        // Issue a probe only if none is outstanding
        if self.pending_probe.is_none() {
            let (tx, rx) = mpsc::channel();
            self.provider.probe(tx)?;
            self.pending_probe = Some(rx);
        }

        let rx = match self.pending_probe.take() {
            Some(rx) => rx,
            None => return Err(PrinterError::NotConnected),
        };
        match rx.recv_timeout(PROBE_CONFIRM_TIMEOUT) {
            Ok(engine) => {
                self.confirm_engine(engine);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                // Probe stays pending; a late confirmation is still welcome
                self.pending_probe = Some(rx);
                Err(PrinterError::TransportUnavailable(
                    "embedded engine probe not confirmed in time".to_string(),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err(PrinterError::TransportUnavailable(
                "embedded engine probe abandoned by provider".to_string(),
            )),
        }
    }

    fn connect_transport(&mut self, kind: TransportKind, address: &str) -> Result<()> {
        // One OS handle at a time: release the old transport before the
        // new open, even though a failed open then leaves us disconnected.
        self.close_transport();

        let transport = self.factory.open(kind, address)?;
        let name = transport.peer_name().map(str::to_string);
        log::info!("connected via {} to {}", kind.label(), address);
        self.transport = Some(transport);
        self.emit(PrinterEvent::Connected { kind, name });
        Ok(())
    }

    /// Close any pluggable transport. The embedded engine is untouched —
    /// it stays confirmed across generic disconnects. Infallible.
    pub fn disconnect(&mut self) {
        self.close_transport();
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                log::warn!("error closing {} transport: {}", transport.kind().label(), e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// Enumerate reachable printers across all device classes.
    ///
    /// Per-class failures degrade to an empty subset of the listing; the
    /// call itself never fails. `connected` is computed against the live
    /// handle identity.
    pub fn discover(&mut self) -> Vec<DeviceDescriptor> {
        self.poll_probe();

        let mut devices = Vec::new();

        if let Some(engine) = &self.engine {
            devices.push(DeviceDescriptor {
                name: engine.name().to_string(),
                address: "embedded".to_string(),
                kind: TransportKind::Embedded,
                connected: true,
            });
        }

        let live = self
            .transport
            .as_ref()
            .filter(|t| t.is_open())
            .map(|t| (t.kind(), t.address().to_string()));
        let is_live = |kind: TransportKind, address: &str| {
            live.as_ref()
                .is_some_and(|(k, a)| *k == kind && a == address)
        };

        for (name, address) in self.factory.scan_bluetooth() {
            let connected = is_live(TransportKind::Bluetooth, &address);
            devices.push(DeviceDescriptor {
                name,
                address,
                kind: TransportKind::Bluetooth,
                connected,
            });
        }

        for (name, address) in self.factory.scan_usb() {
            let connected = is_live(TransportKind::Usb, &address);
            devices.push(DeviceDescriptor {
                name,
                address,
                kind: TransportKind::Usb,
                connected,
            });
        }

        devices
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to connection events. Each call replaces the previous
    /// subscriber; this is a single-listener notification channel.
    pub fn subscribe(&mut self) -> Receiver<PrinterEvent> {
        let (tx, rx) = mpsc::channel();
        self.events = Some(tx);
        rx
    }

    fn emit(&mut self, event: PrinterEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                // Subscriber went away; stop buffering into the void
                self.events = None;
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close_transport();
        self.provider.shutdown();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LineApi, NullProvider};
    use crate::transport::mock::{MockSink, MockTransport};
    use std::sync::Mutex;

    // ---- doubles -----------------------------------------------------

    struct StubEngine;
    impl PrintEngine for StubEngine {
        fn name(&self) -> &str {
            "stub-engine"
        }
        fn line_api(&self) -> Option<&dyn LineApi> {
            None
        }
    }

    /// Provider that accepts the probe and optionally confirms at once
    struct StubProvider {
        confirm_immediately: bool,
        tx_keepalive: Option<Sender<Arc<dyn PrintEngine>>>,
    }

    impl StubProvider {
        fn confirming() -> Self {
            Self {
                confirm_immediately: true,
                tx_keepalive: None,
            }
        }
        fn silent() -> Self {
            Self {
                confirm_immediately: false,
                tx_keepalive: None,
            }
        }
    }

    impl EngineProvider for StubProvider {
        fn probe(&mut self, tx: Sender<Arc<dyn PrintEngine>>) -> Result<()> {
            if self.confirm_immediately {
                let _ = tx.send(Arc::new(StubEngine));
            }
            // Keep the sender alive so a silent probe hangs instead of
            // looking abandoned
            self.tx_keepalive = Some(tx);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFactory {
        sinks: Mutex<Vec<MockSink>>,
        bluetooth: Vec<(String, String)>,
        usb: Vec<(String, String)>,
        fail_opens: bool,
    }

    impl TransportFactory for FakeFactory {
        fn open(&self, kind: TransportKind, address: &str) -> Result<Box<dyn Transport>> {
            if self.fail_opens {
                return Err(PrinterError::DeviceNotFound(address.to_string()));
            }
            let (transport, sink) = MockTransport::new(kind, address);
            self.sinks.lock().unwrap().push(sink);
            Ok(Box::new(transport))
        }
        fn scan_bluetooth(&self) -> Vec<(String, String)> {
            self.bluetooth.clone()
        }
        fn scan_usb(&self) -> Vec<(String, String)> {
            self.usb.clone()
        }
    }

    fn manager_with(factory: FakeFactory) -> (ConnectionManager, Arc<FakeFactory>) {
        let factory = Arc::new(factory);

        struct Shared(Arc<FakeFactory>);
        impl TransportFactory for Shared {
            fn open(&self, kind: TransportKind, address: &str) -> Result<Box<dyn Transport>> {
                self.0.open(kind, address)
            }
            fn scan_bluetooth(&self) -> Vec<(String, String)> {
                self.0.scan_bluetooth()
            }
            fn scan_usb(&self) -> Vec<(String, String)> {
                self.0.scan_usb()
            }
        }

        let manager = ConnectionManager::with_factory(
            Box::new(NullProvider),
            Box::new(Shared(factory.clone())),
        );
        (manager, factory)
    }

    fn usb_target() -> ConnectTarget {
        ConnectTarget::Usb {
            address: "1:4".to_string(),
        }
    }

    // ---- probe lifecycle ---------------------------------------------

    #[test]
    fn test_accepted_probe_is_not_connected() {
        let mut manager = ConnectionManager::with_factory(
            Box::new(StubProvider::silent()),
            Box::new(FakeFactory::default()),
        );
        manager.auto_connect();
        assert_eq!(manager.state(), ConnectionState::Connecting);
        assert!(!manager.status().connected);
    }

    #[test]
    fn test_confirmed_probe_connects_embedded() {
        let mut manager = ConnectionManager::with_factory(
            Box::new(StubProvider::confirming()),
            Box::new(FakeFactory::default()),
        );
        let events = manager.subscribe();
        manager.auto_connect();
        let status = manager.status(); // drains the confirmation
        assert!(status.connected);
        assert_eq!(status.kind, TransportKind::Embedded);
        assert_eq!(status.message, "Connected via EMBEDDED");

        match events.try_recv().unwrap() {
            PrinterEvent::Connected { kind, name } => {
                assert_eq!(kind, TransportKind::Embedded);
                assert_eq!(name.as_deref(), Some("stub-engine"));
            }
        }
    }

    #[test]
    fn test_auto_connect_never_duplicates_probe() {
        let mut manager = ConnectionManager::with_factory(
            Box::new(StubProvider::silent()),
            Box::new(FakeFactory::default()),
        );
        manager.auto_connect();
        manager.auto_connect();
        manager.auto_connect();
        // One probe outstanding: still Connecting, and a later explicit
        // embedded connect waits on it rather than issuing another.
        assert_eq!(manager.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_rejected_probe_leaves_disconnected() {
        let mut manager = ConnectionManager::with_factory(
            Box::new(NullProvider),
            Box::new(FakeFactory::default()),
        );
        manager.auto_connect();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_explicit_embedded_connect_is_idempotent() {
        let mut manager = ConnectionManager::with_factory(
            Box::new(StubProvider::confirming()),
            Box::new(FakeFactory::default()),
        );
        manager.connect(&ConnectTarget::Embedded).unwrap();
        manager.connect(&ConnectTarget::Embedded).unwrap();
        assert_eq!(
            manager.state(),
            ConnectionState::Connected(TransportKind::Embedded)
        );
    }

    // ---- transport lifecycle -----------------------------------------

    #[test]
    fn test_reconnect_closes_previous_handle_exactly_once() {
        let (mut manager, factory) = manager_with(FakeFactory::default());
        manager.connect(&usb_target()).unwrap();
        manager
            .connect(&ConnectTarget::Bluetooth {
                address: "00:11:22:33:44:55".to_string(),
            })
            .unwrap();
        manager.disconnect();

        let sinks = factory.sinks.lock().unwrap();
        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[0].close_count(), 1, "replaced handle leaked");
        assert_eq!(sinks[1].close_count(), 1, "disconnected handle leaked");
    }

    #[test]
    fn test_failed_connect_does_not_fabricate_connection() {
        let (mut manager, _factory) = manager_with(FakeFactory {
            fail_opens: true,
            ..Default::default()
        });
        assert!(manager.connect(&usb_target()).is_err());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.status().connected);
    }

    #[test]
    fn test_disconnect_is_infallible_and_idempotent() {
        let (mut manager, _factory) = manager_with(FakeFactory::default());
        manager.disconnect();
        manager.connect(&usb_target()).unwrap();
        manager.disconnect();
        manager.disconnect();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_keeps_engine_sticky() {
        struct Confirming;
        impl EngineProvider for Confirming {
            fn probe(&mut self, tx: Sender<Arc<dyn PrintEngine>>) -> Result<()> {
                let _ = tx.send(Arc::new(StubEngine));
                Ok(())
            }
        }
        let mut manager = ConnectionManager::with_factory(
            Box::new(Confirming),
            Box::new(FakeFactory::default()),
        );
        manager.connect(&ConnectTarget::Embedded).unwrap();
        manager.disconnect();
        // Engine survives the generic disconnect
        assert_eq!(
            manager.state(),
            ConnectionState::Connected(TransportKind::Embedded)
        );
        assert_eq!(manager.status().message, "Connected via EMBEDDED");
    }

    #[test]
    fn test_transport_connect_overrides_embedded_for_state() {
        struct Confirming;
        impl EngineProvider for Confirming {
            fn probe(&mut self, tx: Sender<Arc<dyn PrintEngine>>) -> Result<()> {
                let _ = tx.send(Arc::new(StubEngine));
                Ok(())
            }
        }
        let factory = FakeFactory::default();
        let mut manager =
            ConnectionManager::with_factory(Box::new(Confirming), Box::new(factory));
        manager.connect(&ConnectTarget::Embedded).unwrap();
        manager.connect(&usb_target()).unwrap();
        assert_eq!(
            manager.state(),
            ConnectionState::Connected(TransportKind::Usb)
        );
        // And the engine is still there underneath
        manager.disconnect();
        assert_eq!(
            manager.state(),
            ConnectionState::Connected(TransportKind::Embedded)
        );
    }

    // ---- discovery ---------------------------------------------------

    #[test]
    fn test_discover_merges_classes_and_marks_live_handle() {
        let (mut manager, _factory) = manager_with(FakeFactory {
            bluetooth: vec![("TM-P20".to_string(), "00:11:22:33:44:55".to_string())],
            usb: vec![
                ("TM-T20".to_string(), "1:4".to_string()),
                ("Other".to_string(), "1:9".to_string()),
            ],
            ..Default::default()
        });
        manager.connect(&usb_target()).unwrap();

        let devices = manager.discover();
        assert_eq!(devices.len(), 3);

        let connected: Vec<_> = devices.iter().filter(|d| d.connected).collect();
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].address, "1:4");
        assert_eq!(connected[0].kind, TransportKind::Usb);
    }

    #[test]
    fn test_discover_empty_when_nothing_reachable() {
        let (mut manager, _factory) = manager_with(FakeFactory::default());
        assert!(manager.discover().is_empty());
    }

    // ---- events ------------------------------------------------------

    #[test]
    fn test_transport_connect_emits_event() {
        let (mut manager, _factory) = manager_with(FakeFactory::default());
        let events = manager.subscribe();
        manager.connect(&usb_target()).unwrap();
        match events.try_recv().unwrap() {
            PrinterEvent::Connected { kind, .. } => assert_eq!(kind, TransportKind::Usb),
        }
    }
}
