//! Owned handle to a connected data logger.
//!
//! [`DataLogger`] owns its port for as long as the logger is in use. Both
//! sessions take `&mut self`, so a download can never overlap a reformat or a
//! close on the same link.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rocketlog::{DataLogger, NoStatus, ReformatRequest};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut logger = DataLogger::open("/dev/ttyUSB0", 115200)?;
//!     let pages = logger.reformat(&ReformatRequest::default(), &mut NoStatus)?;
//!     println!("Rewrote {pages} pages");
//!     Ok(())
//! }
//! ```

use std::io::Write;

use log::debug;

use crate::error::Result;
use crate::port::Port;
use crate::session::{self, DownloadRequest, ReformatRequest, StatusSink};

/// A data logger on an open port.
///
/// Generic over the port type `P`, so the same handle drives a real serial
/// port or a simulated device.
pub struct DataLogger<P: Port> {
    port: P,
}

impl<P: Port> DataLogger<P> {
    /// Wrap an already opened port.
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Consume the logger and return the underlying port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Download the recorded data into `sink`.
    ///
    /// See [`session::download`].
    pub fn download<W, S>(
        &mut self,
        request: &DownloadRequest,
        sink: &mut W,
        status: &mut S,
    ) -> Result<u64>
    where
        W: Write + ?Sized,
        S: StatusSink + ?Sized,
    {
        session::download(&mut self.port, request, sink, status)
    }

    /// Reformat the logger's memory.
    ///
    /// See [`session::reformat`].
    pub fn reformat<S>(&mut self, request: &ReformatRequest, status: &mut S) -> Result<u32>
    where
        S: StatusSink + ?Sized,
    {
        session::reformat(&mut self.port, request, status)
    }

    /// Close the port. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        debug!("Closing logger on {}", self.port.name());
        self.port.close()
    }
}

#[cfg(feature = "native")]
impl DataLogger<crate::port::NativePort> {
    /// Open a logger on a native serial port.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = crate::port::NativePort::open_simple(port_name, baud_rate)?;
        Ok(Self::new(port))
    }
}
