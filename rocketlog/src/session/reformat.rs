//! Reformat session: erase the logger's EEPROM.

use log::{debug, info, trace};

use super::{Status, StatusSink};
use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::{CONFIRM_BYTE, Command, REQUIRED_PAGES, ReformatLine, classify_line};

/// Parameters of one reformat.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReformatRequest {
    /// Command byte that starts the reformat.
    pub command: u8,
    /// Byte sent to approve the prompt.
    pub confirm: u8,
}

impl Default for ReformatRequest {
    fn default() -> Self {
        Self {
            command: Command::Reformat.byte(),
            confirm: CONFIRM_BYTE,
        }
    }
}

/// Reformat the logger's memory.
///
/// Returns the number of page lines seen, which is always
/// [`REQUIRED_PAGES`] on success. Reading stops at the first line that does
/// not fit the handshake.
pub fn reformat<P, S>(port: &mut P, request: &ReformatRequest, status: &mut S) -> Result<u32>
where
    P: Port + ?Sized,
    S: StatusSink + ?Sized,
{
    status.on_reset();
    status.on_status(Status::Starting);
    info!("Starting reformat on {}", port.name());

    match run_handshake(port, request, status) {
        Ok(pages) => {
            status.on_status(Status::Complete);
            info!("Reformat complete: {pages} pages");
            Ok(pages)
        },
        Err(e) => {
            status.on_status(Status::Failed);
            debug!("Reformat failed: {e}");
            Err(e)
        },
    }
}

fn run_handshake<P, S>(port: &mut P, request: &ReformatRequest, status: &mut S) -> Result<u32>
where
    P: Port + ?Sized,
    S: StatusSink + ?Sized,
{
    port.write_all_bytes(&[request.command])?;
    debug!("Sent reformat command 0x{:02X}", request.command);

    let prompt = port.read_line()?;
    if classify_line(&prompt) != ReformatLine::Prompt {
        return Err(Error::UnexpectedPrompt(prompt));
    }

    port.write_all_bytes(&[request.confirm])?;
    status.on_status(Status::Reformatting);

    let mut pages = 0u32;
    loop {
        let line = port.read_line()?;
        match classify_line(&line) {
            ReformatLine::Page if pages < REQUIRED_PAGES => {
                pages += 1;
                trace!("{line}");
                status.on_progress(1);
            },
            ReformatLine::Finished => break,
            _ => return Err(Error::UnexpectedLine(line)),
        }
    }

    if pages != REQUIRED_PAGES {
        return Err(Error::PageCountMismatch(pages));
    }
    Ok(pages)
}
