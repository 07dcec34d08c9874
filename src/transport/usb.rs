//! # USB Bulk Transport
//!
//! Direct communication with USB receipt printers through their bulk-OUT
//! endpoint, via libusb.
//!
//! ## Device Selection
//!
//! Printers are addressed as `bus:device` (the decimal numbers `lsusb`
//! prints). Only printer-class hardware is accepted: the device must carry
//! USB class 7 either on the device descriptor or on at least one
//! interface. The first interface exposing class 7 with a bulk-OUT
//! endpoint is claimed for the session.
//!
//! ## Write Semantics
//!
//! Each write is a blocking bulk transfer with a 5 second timeout. Short
//! transfers are treated as I/O errors rather than silently retried — a
//! printer that accepts half a cut command is in a worse state than one
//! that rejected it outright.

use std::time::Duration;

use rusb::{Device, DeviceHandle, GlobalContext, UsbContext};

use crate::error::{PrinterError, Result};
use crate::transport::{Transport, TransportKind};

/// USB printer interface class
const USB_CLASS_PRINTER: u8 = 7;

/// Bulk transfer timeout
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// # USB Printer Transport
///
/// Holds the claimed interface for one printer session. `close()` releases
/// the interface and drops the handle exactly once; `Drop` covers the
/// paths that never call it.
pub struct UsbTransport {
    handle: Option<DeviceHandle<GlobalContext>>,
    endpoint: u8,
    interface: u8,
    address: String,
    product_name: Option<String>,
}

impl UsbTransport {
    /// Open the printer at `address` (`bus:device`, decimal).
    ///
    /// ## Errors
    ///
    /// - [`PrinterError::DeviceNotFound`]: malformed address, no device at
    ///   it, or the device is not printer-class
    /// - [`PrinterError::PermissionDenied`]: libusb denied access (udev
    ///   rules usually)
    pub fn open(address: &str) -> Result<Self> {
        let (bus, dev_addr) = parse_address(address)?;

        let devices = rusb::devices()?;
        let device = devices
            .iter()
            .find(|d| d.bus_number() == bus && d.address() == dev_addr)
            .ok_or_else(|| {
                PrinterError::DeviceNotFound(format!("no USB device at {}", address))
            })?;

        let (interface, endpoint) = find_printer_endpoint(&device)?.ok_or_else(|| {
            PrinterError::DeviceNotFound(format!(
                "USB device at {} has no printer-class bulk-OUT endpoint",
                address
            ))
        })?;

        let mut handle = device.open()?;
        if handle.kernel_driver_active(interface).unwrap_or(false) {
            handle.detach_kernel_driver(interface)?;
        }
        handle.claim_interface(interface)?;

        let product_name = read_product_name(&device, &handle);
        log::info!(
            "opened USB transport {} ({}), interface {} endpoint {:#04x}",
            address,
            product_name.as_deref().unwrap_or("unknown product"),
            interface,
            endpoint
        );

        Ok(Self {
            handle: Some(handle),
            endpoint,
            interface,
            address: address.to_string(),
            product_name,
        })
    }
}

impl Transport for UsbTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Usb
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn peer_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(PrinterError::NotConnected)?;

        let mut written = 0;
        while written < data.len() {
            let n = handle.write_bulk(self.endpoint, &data[written..], WRITE_TIMEOUT)?;
            if n == 0 {
                return Err(PrinterError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!("bulk transfer stalled after {} of {} bytes", written, data.len()),
                )));
            }
            written += n;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            log::debug!("closing USB transport {}", self.address);
            if let Err(e) = handle.release_interface(self.interface) {
                log::warn!("failed to release USB interface {}: {}", self.interface, e);
            }
        }
        Ok(())
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ============================================================================
// DEVICE SELECTION
// ============================================================================

/// Parse a `bus:device` address into its decimal components.
fn parse_address(address: &str) -> Result<(u8, u8)> {
    let parse = || {
        let (bus, dev) = address.split_once(':')?;
        Some((bus.parse::<u8>().ok()?, dev.parse::<u8>().ok()?))
    };
    parse().ok_or_else(|| {
        PrinterError::DeviceNotFound(format!(
            "invalid USB address '{}' (expected bus:device)",
            address
        ))
    })
}

/// Find the first printer-class interface with a bulk-OUT endpoint.
///
/// Returns `(interface number, endpoint address)`, or `None` when the
/// device exposes no printer interface at all.
fn find_printer_endpoint<T: UsbContext>(device: &Device<T>) -> Result<Option<(u8, u8)>> {
    let config = device.active_config_descriptor()?;
    let device_class = device.device_descriptor()?.class_code();

    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            let printer_class = descriptor.class_code() == USB_CLASS_PRINTER
                || device_class == USB_CLASS_PRINTER;
            if !printer_class {
                continue;
            }
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.transfer_type() == rusb::TransferType::Bulk
                    && endpoint.direction() == rusb::Direction::Out
                {
                    return Ok(Some((descriptor.interface_number(), endpoint.address())));
                }
            }
        }
    }
    Ok(None)
}

/// Best-effort product string for logs and discovery listings.
fn read_product_name<T: UsbContext>(
    device: &Device<T>,
    handle: &DeviceHandle<T>,
) -> Option<String> {
    let descriptor = device.device_descriptor().ok()?;
    handle.read_product_string_ascii(&descriptor).ok()
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// List attached printer-class USB devices as `(name, address)` pairs.
///
/// Any enumeration failure degrades to an empty list with a warning —
/// discovery never fails over one absent subsystem. Devices that cannot be
/// opened still appear, named by their vendor/product IDs.
pub fn attached_printers() -> Vec<(String, String)> {
    let devices = match rusb::devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("USB enumeration failed, skipping USB discovery: {}", e);
            return Vec::new();
        }
    };

    let mut printers = Vec::new();
    for device in devices.iter() {
        match find_printer_endpoint(&device) {
            Ok(Some(_)) => {}
            _ => continue,
        }

        let address = format!("{}:{}", device.bus_number(), device.address());
        let name = device
            .open()
            .ok()
            .and_then(|handle| read_product_name(&device, &handle))
            .unwrap_or_else(|| match device.device_descriptor() {
                Ok(d) => format!("USB printer {:04x}:{:04x}", d.vendor_id(), d.product_id()),
                Err(_) => "USB printer".to_string(),
            });
        printers.push((name, address));
    }
    printers
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_accepts_bus_device() {
        assert_eq!(parse_address("1:4").unwrap(), (1, 4));
        assert_eq!(parse_address("3:127").unwrap(), (3, 127));
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        for bad in ["", "1", "1:", ":4", "1:4:2", "one:four", "999:1"] {
            match parse_address(bad) {
                Err(PrinterError::DeviceNotFound(_)) => {}
                other => panic!("expected DeviceNotFound for '{}', got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_open_rejects_malformed_address() {
        assert!(matches!(
            UsbTransport::open("nonsense"),
            Err(PrinterError::DeviceNotFound(_))
        ));
    }
}
