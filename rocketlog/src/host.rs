//! Host-side utilities for serial port discovery.

use crate::port::PortInfo;

/// Discover all available serial ports, in the order the OS reports them.
///
/// Enumeration failures are logged and yield an empty list.
#[cfg(feature = "native")]
#[must_use]
pub fn discover_ports() -> Vec<PortInfo> {
    use crate::port::{NativePortEnumerator, PortEnumerator};

    match NativePortEnumerator::list_ports() {
        Ok(ports) => {
            log::debug!("Found {} serial port(s)", ports.len());
            ports
        },
        Err(e) => {
            log::debug!("Failed to enumerate serial ports: {e}");
            Vec::new()
        },
    }
}

/// Discover all available serial ports (no native support - always empty).
#[cfg(not(feature = "native"))]
#[must_use]
pub fn discover_ports() -> Vec<PortInfo> {
    Vec::new()
}

/// Format a port for display: name, then USB IDs and product when known.
pub fn format_port(port: &PortInfo) -> String {
    let ids = match (port.vid, port.pid) {
        (Some(vid), Some(pid)) => format!(" [VID:{vid:04X} PID:{pid:04X}]"),
        _ => String::new(),
    };

    let product = port
        .product
        .as_ref()
        .map(|p| format!(" - {p}"))
        .unwrap_or_default();

    format!("{}{ids}{product}", port.name)
}
