//! # rocketlog
//!
//! A library for talking to rocket flight data loggers over a serial link.
//!
//! The logger speaks a small command protocol:
//!
//! - **Download** streams the recorded flight data, ended by a 3-byte
//!   terminator
//! - **Reformat** erases the EEPROM after a textual confirmation handshake
//!
//! ## Features
//!
//! - `native` (default): Native serial port support via the `serialport` crate
//! - `serde`: Serialization support for data types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::fs::File;
//!
//! use rocketlog::{DownloadRequest, NoStatus};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "native")]
//!     {
//!         let mut logger = rocketlog::DataLogger::open("/dev/ttyUSB0", 115200)?;
//!         let mut out = File::create("Data.txt")?;
//!
//!         let bytes = logger.download(&DownloadRequest::default(), &mut out, &mut NoStatus)?;
//!         println!("Downloaded {bytes} bytes");
//!
//!         logger.close()?;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::{Arc, OnceLock};

pub mod device;
pub mod error;
pub mod host;
pub mod port;
pub mod protocol;
pub mod session;

static INTERRUPT_CHECKER: OnceLock<Arc<dyn Fn() -> bool + Send + Sync>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_INTERRUPTED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Register a global interruption checker used by blocking reads.
///
/// The checker should return `true` when the current operation should stop
/// (for example after receiving Ctrl-C in CLI applications). Only the first
/// registration takes effect.
pub fn set_interrupt_checker<F>(checker: F)
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let _ = INTERRUPT_CHECKER.set(Arc::new(checker));
}

/// Returns whether interruption was requested by the embedding application.
#[must_use]
pub fn is_interrupted_requested() -> bool {
    #[cfg(test)]
    if TEST_INTERRUPTED.with(std::cell::Cell::get) {
        return true;
    }

    INTERRUPT_CHECKER
        .get()
        .is_some_and(|checker| checker())
}

/// Per-thread interrupt flag, so parallel tests don't see each other's
/// interrupts.
#[cfg(test)]
pub(crate) fn test_set_interrupted(value: bool) {
    TEST_INTERRUPTED.with(|flag| flag.set(value));
}

// Re-exports for convenience
#[cfg(feature = "native")]
pub use port::{NativePort, NativePortEnumerator};
pub use {
    device::DataLogger,
    error::{Error, Result},
    host::{discover_ports, format_port},
    port::{BAUD_RATES, DEFAULT_BAUD, Port, PortEnumerator, PortInfo, SerialConfig},
    protocol::{Command, Decoded, FrameDecoder},
    session::{
        DownloadRequest, NoStatus, ReformatRequest, Status, StatusEvent, StatusSink, download,
        reformat,
    },
};
