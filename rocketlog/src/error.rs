//! Error types for rocketlog.

use std::io;
use thiserror::Error;

/// Result type for rocketlog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for rocketlog operations.
///
/// Every variant is terminal for the session that produced it; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial port could not be opened or closed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Read or write failure on an open channel (including a closed channel
    /// and a requested interrupt).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The device did not acknowledge the download command with the preamble.
    #[error("Unexpected preamble: expected 01 02 03, got {}", hex_bytes(.0))]
    UnexpectedPreamble([u8; 3]),

    /// The device answered the reformat command with something other than
    /// the reformat prompt.
    #[error("Unexpected reformat prompt: {0:?}")]
    UnexpectedPrompt(String),

    /// A line that is neither a page-write line nor the finished sentinel
    /// arrived during reformat.
    #[error("Unexpected line during reformat: {0:?}")]
    UnexpectedLine(String),

    /// The device finished reformatting after the wrong number of pages.
    #[error("Page count mismatch: device reported {0} pages, expected 512")]
    PageCountMismatch(u32),

    /// Invalid configuration (baud rate, port settings).
    #[error("Configuration error: {0}")]
    Config(String),
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Error {
    /// Whether the device violated the protocol (as opposed to a transport
    /// or configuration failure).
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedPreamble(_)
                | Self::UnexpectedPrompt(_)
                | Self::UnexpectedLine(_)
                | Self::PageCountMismatch(_)
        )
    }

    /// Whether this error was caused by an interrupt request.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::Interrupted)
    }

    pub(crate) fn interrupted() -> Self {
        Self::Io(io::Error::new(
            io::ErrorKind::Interrupted,
            "operation interrupted",
        ))
    }

    pub(crate) fn channel_closed() -> Self {
        Self::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "channel closed",
        ))
    }
}
