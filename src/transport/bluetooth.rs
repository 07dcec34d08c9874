//! # Bluetooth SPP Transport
//!
//! Serial Port Profile communication with receipt printers over RFCOMM.
//!
//! ## Address Resolution
//!
//! Callers connect by Bluetooth MAC address. The MAC is resolved to a bound
//! RFCOMM device node (`/dev/rfcommN`) by consulting `/proc/net/rfcomm`
//! first and falling back to `rfcomm -a`. Binding itself (pairing plus
//! `rfcomm bind`) is host setup, not something this transport does behind
//! the caller's back.
//!
//! ## TTY Configuration
//!
//! The device node is opened in raw mode so binary command bytes pass
//! through unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, etc. cleared
//! - **No output processing**: OPOST cleared (no CR/LF translation)
//! - **8-bit characters**: CS8, no parity
//! - **No flow control**: IXON/IXOFF/IXANY cleared — 0x11 (XON) and 0x13
//!   (XOFF) are legitimate bytes in raster and QR payloads
//!
//! ## Chunked Writes
//!
//! Large buffers are written in 4096-byte chunks with a short delay in
//! between so the printer's serial buffer is not overrun.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use crate::error::{PrinterError, Result};
use crate::transport::{Transport, TransportKind};

/// Chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Bluetooth SPP Printer Transport
///
/// Owns the RFCOMM device file for one printer connection. The handle is
/// released exactly once: `close()` takes it out of the `Option`, and
/// `Drop` covers the paths that never call `close()`.
pub struct BluetoothTransport {
    file: Option<File>,
    address: String,
    device_path: String,
}

impl BluetoothTransport {
    /// Open an SPP connection to the printer at `address` (MAC form
    /// `XX:XX:XX:XX:XX:XX`).
    ///
    /// ## Errors
    ///
    /// - [`PrinterError::DeviceNotFound`]: malformed MAC, or no RFCOMM
    ///   device is bound to it
    /// - [`PrinterError::PermissionDenied`]: the device node exists but is
    ///   not writable (needs root or the dialout group)
    /// - [`PrinterError::TransportUnavailable`]: RFCOMM tooling missing
    pub fn open(address: &str) -> Result<Self> {
        if !is_valid_mac(address) {
            return Err(PrinterError::DeviceNotFound(format!(
                "invalid Bluetooth address '{}'",
                address
            )));
        }

        let device_path = find_rfcomm_for_mac(address)?.ok_or_else(|| {
            PrinterError::DeviceNotFound(format!("no RFCOMM device bound to {}", address))
        })?;

        let file = OpenOptions::new()
            .write(true)
            .open(&device_path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::PermissionDenied => PrinterError::PermissionDenied(format!(
                    "cannot write {}: {}",
                    device_path, e
                )),
                io::ErrorKind::NotFound => {
                    PrinterError::DeviceNotFound(format!("{} disappeared", device_path))
                }
                _ => PrinterError::Io(e),
            })?;

        configure_tty_raw(&file)?;
        log::info!("opened Bluetooth SPP transport {} ({})", address, device_path);

        Ok(Self {
            file: Some(file),
            address: address.to_string(),
            device_path,
        })
    }

    /// Device node this transport writes to (e.g. `/dev/rfcomm0`)
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    fn write_chunked(file: &mut File, data: &[u8]) -> Result<()> {
        if data.len() <= CHUNK_SIZE {
            file.write_all(data)?;
        } else {
            for chunk in data.chunks(CHUNK_SIZE) {
                file.write_all(chunk)?;
                thread::sleep(Duration::from_millis(CHUNK_DELAY_MS));
            }
        }
        file.flush()?;
        Ok(())
    }
}

impl Transport for BluetoothTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Bluetooth
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => Self::write_chunked(file, data),
            None => Err(PrinterError::NotConnected),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            log::debug!("closing Bluetooth transport {}", self.address);
            drop(file);
        }
        Ok(())
    }
}

impl Drop for BluetoothTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ============================================================================
// ADDRESS RESOLUTION
// ============================================================================

/// Validate a Bluetooth MAC address (`XX:XX:XX:XX:XX:XX`).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Find the RFCOMM device node bound to `mac`, if any.
///
/// `/proc/net/rfcomm` has lines like `rfcomm0: XX:XX:XX:XX:XX:XX channel 1`;
/// when it is absent the `rfcomm -a` listing is parsed the same way.
#[cfg(unix)]
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>> {
    let mac_upper = mac.to_uppercase();

    if let Ok(contents) = fs::read_to_string("/proc/net/rfcomm") {
        if let Some(path) = parse_rfcomm_listing(&contents, &mac_upper) {
            return Ok(Some(path));
        }
    }

    let output = Command::new("rfcomm").arg("-a").output().map_err(|e| {
        PrinterError::TransportUnavailable(format!("failed to run 'rfcomm -a': {}", e))
    })?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_rfcomm_listing(&stdout, &mac_upper))
}

#[cfg(not(unix))]
pub fn find_rfcomm_for_mac(_mac: &str) -> Result<Option<String>> {
    Ok(None)
}

/// Pull the device path for `mac_upper` out of an rfcomm listing.
fn parse_rfcomm_listing(listing: &str, mac_upper: &str) -> Option<String> {
    for line in listing.lines() {
        if !line.to_uppercase().contains(mac_upper) {
            continue;
        }
        if let Some(dev_name) = line.split(':').next() {
            let device_path = format!("/dev/{}", dev_name.trim());
            if Path::new(&device_path).exists() {
                return Some(device_path);
            }
        }
    }
    None
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// List bonded Bluetooth devices as `(name, address)` pairs.
///
/// Runs `bluetoothctl devices Paired` (falling back to the older
/// `paired-devices` spelling). Any failure — tool missing, adapter off, no
/// permission — degrades to an empty list with a warning: discovery never
/// fails over one absent subsystem.
pub fn bonded_devices() -> Vec<(String, String)> {
    for args in [&["devices", "Paired"][..], &["paired-devices"][..]] {
        match Command::new("bluetoothctl").args(args).output() {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let devices = parse_bluetoothctl_devices(&stdout);
                if !devices.is_empty() {
                    return devices;
                }
            }
            Ok(_) => continue,
            Err(e) => {
                log::warn!("bluetoothctl unavailable, skipping Bluetooth discovery: {}", e);
                return Vec::new();
            }
        }
    }
    Vec::new()
}

/// Parse `bluetoothctl` device lines: `Device AA:BB:CC:DD:EE:FF Some Name`.
fn parse_bluetoothctl_devices(listing: &str) -> Vec<(String, String)> {
    listing
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("Device ")?;
            let (address, name) = rest.split_once(' ').unwrap_or((rest, "Unknown"));
            if is_valid_mac(address) {
                Some((name.trim().to_string(), address.to_string()))
            } else {
                None
            }
        })
        .collect()
}

// ============================================================================
// TTY CONFIGURATION
// ============================================================================

/// Put the RFCOMM file descriptor into raw mode.
///
/// Disables all input/output processing, echo and canonical mode, and
/// selects 8-bit characters with no parity. Flow control is disabled
/// because XON/XOFF bytes occur in binary payloads.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> Result<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();

    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(PrinterError::Io(io::Error::last_os_error()));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(PrinterError::Io(io::Error::last_os_error()));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> Result<()> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mac_addresses() {
        assert!(is_valid_mac("00:11:22:33:44:55"));
        assert!(is_valid_mac("AA:BB:CC:DD:EE:FF"));
        assert!(is_valid_mac("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_invalid_mac_addresses() {
        assert!(!is_valid_mac("00:11:22:33:44")); // too short
        assert!(!is_valid_mac("00:11:22:33:44:55:66")); // too long
        assert!(!is_valid_mac("00-11-22-33-44-55")); // wrong separator
        assert!(!is_valid_mac("GG:HH:II:JJ:KK:LL")); // invalid hex
        assert!(!is_valid_mac(""));
    }

    #[test]
    fn test_open_rejects_malformed_address() {
        match BluetoothTransport::open("not-a-mac") {
            Err(PrinterError::DeviceNotFound(_)) => {}
            other => panic!("expected DeviceNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_bluetoothctl_devices() {
        let listing = "Device 00:11:62:AA:BB:CC TM-P20\nDevice 11:22:33:44:55:66 Kitchen Printer\nnot a device line\n";
        let devices = parse_bluetoothctl_devices(listing);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], ("TM-P20".to_string(), "00:11:62:AA:BB:CC".to_string()));
        assert_eq!(
            devices[1],
            ("Kitchen Printer".to_string(), "11:22:33:44:55:66".to_string())
        );
    }

    #[test]
    fn test_parse_bluetoothctl_skips_malformed_lines() {
        let listing = "Device nonsense\nDevice 00:11:22:33:44:55 OK\n";
        let devices = parse_bluetoothctl_devices(listing);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].1, "00:11:22:33:44:55");
    }

    #[test]
    fn test_parse_rfcomm_listing_requires_existing_node() {
        // The MAC matches but /dev/rfcomm99 will not exist on any test host
        let listing = "rfcomm99: 00:11:22:33:44:55 channel 1 clean";
        assert_eq!(parse_rfcomm_listing(listing, "00:11:22:33:44:55"), None);
    }
}
