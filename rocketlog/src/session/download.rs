//! Download session: pull the recorded flight data off the logger.

use std::io::Write;

use log::{debug, info, trace, warn};

use super::reformat::{ReformatRequest, reformat};
use super::{Status, StatusSink};
use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::{Command, Decoded, FrameDecoder, PREAMBLE};

/// Parameters of one download.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DownloadRequest {
    /// Command byte that starts the download.
    pub command: u8,
    /// Run a reformat on the same port once the download succeeds.
    pub reformat_after: bool,
    /// Parameters for the chained reformat.
    pub reformat: ReformatRequest,
}

impl Default for DownloadRequest {
    fn default() -> Self {
        Self {
            command: Command::Download.byte(),
            reformat_after: false,
            reformat: ReformatRequest::default(),
        }
    }
}

impl DownloadRequest {
    /// Set whether to reformat after a successful download.
    #[must_use]
    pub fn with_reformat_after(mut self, reformat_after: bool) -> Self {
        self.reformat_after = reformat_after;
        self
    }
}

/// Download the logger's payload into `sink`.
///
/// Returns the number of payload bytes written. Bytes decoded before a
/// failure stay in the sink; nothing is rolled back. A chained reformat runs
/// only after success and its outcome never changes the return value.
pub fn download<P, W, S>(
    port: &mut P,
    request: &DownloadRequest,
    sink: &mut W,
    status: &mut S,
) -> Result<u64>
where
    P: Port + ?Sized,
    W: Write + ?Sized,
    S: StatusSink + ?Sized,
{
    status.on_reset();
    status.on_status(Status::Starting);
    info!("Starting download on {}", port.name());

    let streamed = stream_payload(port, request.command, sink, status);
    let flushed = sink.flush().map_err(Error::Io);

    match streamed.and_then(|written| flushed.map(|()| written)) {
        Ok(written) => {
            status.on_status(Status::Complete);
            info!("Download complete: {written} bytes");

            if request.reformat_after {
                if let Err(e) = reformat(port, &request.reformat, status) {
                    warn!("Reformat after download failed: {e}");
                }
            }

            Ok(written)
        },
        Err(e) => {
            status.on_status(Status::Failed);
            debug!("Download failed: {e}");
            Err(e)
        },
    }
}

fn stream_payload<P, W, S>(port: &mut P, command: u8, sink: &mut W, status: &mut S) -> Result<u64>
where
    P: Port + ?Sized,
    W: Write + ?Sized,
    S: StatusSink + ?Sized,
{
    port.discard_input()?;
    port.write_all_bytes(&[command])?;
    debug!("Sent download command 0x{command:02X}");

    let mut preamble = [0u8; 3];
    for slot in &mut preamble {
        *slot = port.read_byte()?;
    }
    if preamble != PREAMBLE {
        return Err(Error::UnexpectedPreamble(preamble));
    }
    debug!("Preamble received");

    status.on_status(Status::Downloading);

    let mut decoder = FrameDecoder::new();
    loop {
        match decoder.push(port.read_byte()?) {
            Decoded::Pending => {},
            Decoded::Chunk(chunk) => {
                sink.write_all(&chunk)?;
                status.on_progress(chunk.delta());
            },
            Decoded::Terminated => break,
        }
    }
    trace!("Terminator received after {} bytes", decoder.decoded_len());

    Ok(decoder.decoded_len())
}
