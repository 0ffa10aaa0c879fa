//! Wire protocol of the data logger.
//!
//! The logger speaks two dialects over the same serial link:
//!
//! - a binary download stream, acknowledged by a 3-byte preamble and ended by
//!   a 3-byte terminator (see [`frame`]);
//! - a line-oriented reformat handshake (see [`lines`]).
//!
//! ```text
//! Download:
//!   host -> 05
//!   dev  -> 01 02 03 | payload ... | 03 02 01
//!
//! Reformat:
//!   host -> 04
//!   dev  -> "Reformat EEPROM (all data will be erased)?\n"
//!   host -> 'y'
//!   dev  -> "Writing page N\n" x 512
//!   dev  -> "Finished reformat\n"
//! ```

pub mod frame;
pub mod lines;

pub use frame::{Chunk, DecodeOutcome, Decoded, FrameDecoder, decode, frame};
pub use lines::{ReformatLine, classify_line};

/// Acknowledgment the device echoes right after the download command.
pub const PREAMBLE: [u8; 3] = [0x01, 0x02, 0x03];

/// Sequence that ends the download payload.
pub const TERMINATOR: [u8; 3] = [0x03, 0x02, 0x01];

/// Prompt the device sends after the reformat command.
pub const REFORMAT_PROMPT: &str = "Reformat EEPROM (all data will be erased)?";

/// Prefix of each page-write progress line during reformat.
pub const PAGE_LINE_PREFIX: &str = "Writing page";

/// Sentinel line that ends the reformat.
pub const FINISHED_LINE: &str = "Finished reformat";

/// Byte that approves the reformat prompt.
pub const CONFIRM_BYTE: u8 = b'y';

/// Number of EEPROM pages the device must report during reformat.
pub const REQUIRED_PAGES: u32 = 512;

/// Command byte sent as the first byte of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Command {
    /// Query device information (0x06). Not used by the sessions.
    GetInfo = 0x06,
    /// Stream the recorded data (0x05).
    Download = 0x05,
    /// Erase and rewrite the EEPROM (0x04).
    Reformat = 0x04,
}

impl Command {
    /// Wire value of the command.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Parse a command byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x06 => Some(Self::GetInfo),
            0x05 => Some(Self::Download),
            0x04 => Some(Self::Reformat),
            _ => None,
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd.byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::GetInfo.byte(), 0x06);
        assert_eq!(Command::Download.byte(), 0x05);
        assert_eq!(Command::Reformat.byte(), 0x04);
        assert_eq!(u8::from(Command::Download), 5);
    }

    #[test]
    fn test_command_from_byte() {
        assert_eq!(Command::from_byte(0x05), Some(Command::Download));
        assert_eq!(Command::from_byte(0x04), Some(Command::Reformat));
        assert_eq!(Command::from_byte(0x06), Some(Command::GetInfo));
        assert_eq!(Command::from_byte(0x07), None);
    }

    #[test]
    fn test_page_prefix_is_twelve_chars() {
        assert_eq!(PAGE_LINE_PREFIX.len(), 12);
    }

    #[test]
    fn test_confirm_byte() {
        assert_eq!(CONFIRM_BYTE, 0x79);
    }
}
