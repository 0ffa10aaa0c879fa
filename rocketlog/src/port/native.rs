//! Native serial port implementation using the `serialport` crate.
//!
//! This module provides the serial port implementation for native platforms
//! (Linux, macOS, Windows, FreeBSD, etc.).

use {
    crate::{
        error::{Error, Result},
        port::{POLL_INTERVAL, Port, PortEnumerator, PortInfo, SerialConfig, validate_baud},
    },
    log::{debug, trace},
    serialport::{ClearBuffer, DataBits, FlowControl, Parity, StopBits},
    std::io::{Read, Write},
};

/// Native serial port implementation.
pub struct NativePort {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
    baud_rate: u32,
}

impl NativePort {
    /// Open a serial port with the given configuration.
    ///
    /// The link is always 8-N-1 without flow control.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        validate_baud(config.baud_rate)?;

        let port = serialport::new(&config.port_name, config.baud_rate)
            .timeout(POLL_INTERVAL)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| Error::Connection(format!("{}: {e}", config.port_name)))?;

        debug!("Opened {} at {} baud", config.port_name, config.baud_rate);

        Ok(Self {
            port: Some(port),
            name: config.port_name.clone(),
            baud_rate: config.baud_rate,
        })
    }

    /// Open a serial port with default settings.
    pub fn open_simple(port_name: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig::new(port_name, baud_rate);
        Self::open(&config)
    }
}

fn closed_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "port closed")
}

impl Port for NativePort {
    fn name(&self) -> &str {
        &self.name
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn discard_input(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or_else(closed_error)?;
        port.clear(ClearBuffer::Input)
            .map_err(|e| Error::Io(e.into()))?;
        trace!("Discarded pending input on {}", self.name);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the handle closes the OS port.
        if self.port.take().is_some() {
            debug!("Closed {}", self.name);
        }
        Ok(())
    }
}

impl Read for NativePort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port
            .as_mut()
            .ok_or_else(closed_error)
            .and_then(|p| p.read(buf))
    }
}

impl Write for NativePort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port
            .as_mut()
            .ok_or_else(closed_error)
            .and_then(|p| p.write(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port
            .as_mut()
            .ok_or_else(closed_error)
            .and_then(std::io::Write::flush)
    }
}

/// Native port enumerator.
pub struct NativePortEnumerator;

impl PortEnumerator for NativePortEnumerator {
    fn list_ports() -> Result<Vec<PortInfo>> {
        let ports = serialport::available_ports()
            .map_err(|e| Error::Connection(format!("cannot enumerate ports: {e}")))?;

        Ok(ports
            .into_iter()
            .map(|p| {
                let (vid, pid, product) = match p.port_type {
                    serialport::SerialPortType::UsbPort(info) => {
                        (Some(info.vid), Some(info.pid), info.product)
                    },
                    _ => (None, None, None),
                };

                PortInfo {
                    name: p.port_name,
                    vid,
                    pid,
                    product,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ports() {
        // This test just verifies that list_ports doesn't panic
        let _ = NativePortEnumerator::list_ports();
    }

    #[test]
    fn test_open_rejects_unsupported_baud() {
        let err = NativePort::open_simple("/dev/ttyUSB0", 921600)
            .err()
            .expect("unsupported baud must fail before touching the OS");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_open_missing_port_is_connection_error() {
        let err = NativePort::open_simple("/nonexistent/rocketlog-port", 115200)
            .err()
            .expect("missing port must not open");
        assert!(matches!(err, Error::Connection(_)));
        assert!(err.to_string().contains("/nonexistent/rocketlog-port"));
    }
}
