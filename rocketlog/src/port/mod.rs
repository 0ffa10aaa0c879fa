//! Port abstraction for the serial link to the data logger.
//!
//! The protocol layer only sees the [`Port`] trait, so sessions run the same
//! against a real serial port and against an in-memory device in tests.
//!
//! ```text
//! +---------------------------+
//! |   Sessions                |
//! |  (download, reformat)     |
//! +-------------+-------------+
//!               |
//!               v
//! +-------------+-------------+
//! |   Port trait              |
//! |  read_byte / read_line    |
//! +-------------+-------------+
//!               |
//!               v
//! +-------------+-------------+
//! |   NativePort (serialport) |
//! +---------------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use rocketlog::port::Port;
//!
//! fn handshake<P: Port>(port: &mut P) -> rocketlog::Result<String> {
//!     port.discard_input()?;
//!     port.write_all_bytes(&[0x04])?;
//!     port.read_line()
//! }
//! ```

#[cfg(feature = "native")]
pub mod native;

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::{Error, Result};

/// Baud rates the data logger firmware can be built for.
pub const BAUD_RATES: [u32; 5] = [1200, 2400, 9600, 19200, 115200];

/// Default baud rate (the highest supported).
pub const DEFAULT_BAUD: u32 = 115200;

/// Poll interval for blocking reads.
///
/// Reads block until data arrives; the poll interval only bounds how quickly
/// an interrupt request is noticed.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest text line [`Port::read_line`] accepts before giving up.
pub const MAX_LINE_LEN: usize = 4096;

/// Check that a baud rate is one the device supports.
pub fn validate_baud(baud_rate: u32) -> Result<u32> {
    if BAUD_RATES.contains(&baud_rate) {
        Ok(baud_rate)
    } else {
        Err(Error::Config(format!(
            "unsupported baud rate {baud_rate} (supported: {})",
            BAUD_RATES.map(|b| b.to_string()).join(", ")
        )))
    }
}

/// Serial port configuration.
///
/// The logger always talks 8-N-1 without flow control, so only the port
/// name and baud rate are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyUSB0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD,
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
        }
    }
}

/// Serial port information.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortInfo {
    /// Port name/path.
    pub name: String,
    /// USB vendor ID (if available).
    pub vid: Option<u16>,
    /// USB product ID (if available).
    pub pid: Option<u16>,
    /// Product string (if available).
    pub product: Option<String>,
}

/// Duplex byte channel to the data logger.
///
/// All operations may block the calling thread. A port is never used by two
/// sessions at once; sessions take it by `&mut`.
pub trait Port: Read + Write + Send {
    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Get the current baud rate.
    fn baud_rate(&self) -> u32;

    /// Discard any input the device sent that has not been read yet.
    fn discard_input(&mut self) -> Result<()>;

    /// Close the port and release resources.
    ///
    /// Closing twice is a no-op. Reads and writes afterwards fail with
    /// `NotConnected`.
    fn close(&mut self) -> Result<()>;

    /// Write all bytes and flush, blocking until complete.
    fn write_all_bytes(&mut self, buf: &[u8]) -> Result<()> {
        Write::write_all(self, buf)?;
        Write::flush(self)?;
        Ok(())
    }

    /// Read one byte, blocking until it arrives.
    ///
    /// End of stream is reported as `UnexpectedEof`. An interrupt requested
    /// through [`crate::set_interrupt_checker`] is reported as `Interrupted`.
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            if crate::is_interrupted_requested() {
                return Err(Error::interrupted());
            }
            match self.read(&mut buf) {
                Ok(1) => return Ok(buf[0]),
                Ok(_) => return Err(Error::channel_closed()),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) => {},
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Read one text line, blocking until `\n` arrives.
    ///
    /// The line is decoded lossily as UTF-8 and trailing whitespace
    /// (including `\r`) is trimmed. More than [`MAX_LINE_LEN`] bytes without
    /// a newline is reported as [`Error::UnexpectedLine`].
    fn read_line(&mut self) -> Result<String> {
        let mut raw = Vec::new();
        loop {
            match self.read_byte()? {
                b'\n' => break,
                byte => raw.push(byte),
            }
            if raw.len() > MAX_LINE_LEN {
                return Err(Error::UnexpectedLine(
                    String::from_utf8_lossy(&raw[..64]).into_owned(),
                ));
            }
        }
        let line = String::from_utf8_lossy(&raw);
        Ok(line.trim_end().to_string())
    }
}

impl<P: Port + ?Sized> Port for &mut P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn baud_rate(&self) -> u32 {
        (**self).baud_rate()
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Trait for listing available serial ports.
///
/// This is separated from `Port` because it's a static operation that
/// doesn't require an open port instance.
pub trait PortEnumerator {
    /// List all available serial ports.
    fn list_ports() -> Result<Vec<PortInfo>>;
}

#[cfg(feature = "native")]
pub use native::{NativePort, NativePortEnumerator};

/// Scripted in-memory port used by unit tests.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::io::{Read, Write};

    use super::Port;
    use crate::error::Result;

    /// Replays `read_buf` to the reader and records everything written.
    pub(crate) struct MockPort {
        pub(crate) read_buf: VecDeque<u8>,
        pub(crate) write_buf: Vec<u8>,
        pub(crate) discarded: usize,
        pub(crate) closed: bool,
    }

    impl MockPort {
        pub(crate) fn new(response: &[u8]) -> Self {
            Self {
                read_buf: response.iter().copied().collect(),
                write_buf: Vec::new(),
                discarded: 0,
                closed: false,
            }
        }

        /// Build a port that answers with the given text lines.
        pub(crate) fn with_lines<S: AsRef<str>>(lines: &[S]) -> Self {
            let mut response = Vec::new();
            for line in lines {
                response.extend_from_slice(line.as_ref().as_bytes());
                response.extend_from_slice(b"\r\n");
            }
            Self::new(&response)
        }

        pub(crate) fn remaining(&self) -> usize {
            self.read_buf.len()
        }
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            // One byte per call mirrors how the sessions consume the stream.
            match (buf.first_mut(), self.read_buf.pop_front()) {
                (Some(slot), Some(byte)) => {
                    *slot = byte;
                    Ok(1)
                },
                _ => Ok(0),
            }
        }
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.write_buf.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Port for MockPort {
        fn name(&self) -> &str {
            "mock"
        }

        fn baud_rate(&self) -> u32 {
            super::DEFAULT_BAUD
        }

        fn discard_input(&mut self) -> Result<()> {
            self.discarded += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }
}
