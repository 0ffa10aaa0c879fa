//! Terminator framing of the download stream.
//!
//! The payload is sent raw and ends with [`TERMINATOR`] (`03 02 01`). Every
//! `0x03` is a potential terminator, so the decoder looks ahead up to two
//! bytes:
//!
//! ```text
//! b0 != 03                  -> emit b0
//! b0 == 03, b1 != 02        -> emit b0 b1
//! b0 == 03, b1 == 02, b2!=01-> emit b0 b1 b2
//! b0 == 03, b1 == 02, b2==01-> end of stream
//! ```
//!
//! The match is greedy and never backtracks: a lookahead byte that is itself
//! `0x03` is emitted as data rather than re-examined. Payloads containing the
//! terminator triple cannot be represented, and neither can payloads ending
//! in `03` or `03 02`: the trailing bytes pull the start of the real
//! terminator into a data chunk and the stream never ends.

use std::ops::Deref;

use super::TERMINATOR;

const FIRST: u8 = TERMINATOR[0];
const SECOND: u8 = TERMINATOR[1];
const THIRD: u8 = TERMINATOR[2];

/// One to three decoded payload bytes.
///
/// Its length is the progress delta reported for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    bytes: [u8; 3],
    len: u8,
}

impl Chunk {
    fn one(b0: u8) -> Self {
        Self {
            bytes: [b0, 0, 0],
            len: 1,
        }
    }

    fn two(b0: u8, b1: u8) -> Self {
        Self {
            bytes: [b0, b1, 0],
            len: 2,
        }
    }

    fn three(b0: u8, b1: u8, b2: u8) -> Self {
        Self {
            bytes: [b0, b1, b2],
            len: 3,
        }
    }

    /// The decoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Progress delta for this chunk.
    pub fn delta(&self) -> u64 {
        u64::from(self.len)
    }
}

impl Deref for Chunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Result of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Byte held back as a possible terminator prefix.
    Pending,
    /// Payload bytes ready for the sink.
    Chunk(Chunk),
    /// Terminator matched; the stream is complete.
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    SawFirst,
    SawSecond,
    Done,
}

/// Push-based decoder for the download stream.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: State,
    decoded: u64,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder at the start of a payload.
    pub fn new() -> Self {
        Self {
            state: State::Data,
            decoded: 0,
        }
    }

    /// Feed one byte from the wire.
    ///
    /// Once the terminator has matched, every further byte is ignored and
    /// `Terminated` is returned again.
    pub fn push(&mut self, byte: u8) -> Decoded {
        let (next, out) = match (self.state, byte) {
            (State::Done, _) => (State::Done, Decoded::Terminated),
            (State::Data, FIRST) => (State::SawFirst, Decoded::Pending),
            (State::Data, b0) => (State::Data, Decoded::Chunk(Chunk::one(b0))),
            (State::SawFirst, SECOND) => (State::SawSecond, Decoded::Pending),
            (State::SawFirst, b1) => (State::Data, Decoded::Chunk(Chunk::two(FIRST, b1))),
            (State::SawSecond, THIRD) => (State::Done, Decoded::Terminated),
            (State::SawSecond, b2) => (
                State::Data,
                Decoded::Chunk(Chunk::three(FIRST, SECOND, b2)),
            ),
        };

        self.state = next;
        if let Decoded::Chunk(chunk) = out {
            self.decoded += chunk.delta();
        }
        out
    }

    /// Whether the terminator has been seen.
    pub fn is_terminated(&self) -> bool {
        self.state == State::Done
    }

    /// Whether bytes are held back waiting for more input.
    pub fn has_pending(&self) -> bool {
        matches!(self.state, State::SawFirst | State::SawSecond)
    }

    /// Total payload bytes emitted so far.
    pub fn decoded_len(&self) -> u64 {
        self.decoded
    }
}

/// Outcome of decoding an in-memory buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Decoded payload.
    pub payload: Vec<u8>,
    /// Whether the terminator was found.
    pub terminated: bool,
    /// Input bytes consumed, terminator included.
    pub consumed: usize,
}

/// Decode a buffer, stopping at the terminator.
///
/// Bytes after the terminator are not consumed. A terminator prefix left
/// dangling at the end of an unterminated buffer is not part of `payload`.
pub fn decode(input: &[u8]) -> DecodeOutcome {
    let mut decoder = FrameDecoder::new();
    let mut payload = Vec::with_capacity(input.len());

    for (i, &byte) in input.iter().enumerate() {
        match decoder.push(byte) {
            Decoded::Pending => {},
            Decoded::Chunk(chunk) => payload.extend_from_slice(&chunk),
            Decoded::Terminated => {
                return DecodeOutcome {
                    payload,
                    terminated: true,
                    consumed: i + 1,
                };
            },
        }
    }

    DecodeOutcome {
        payload,
        terminated: false,
        consumed: input.len(),
    }
}

/// Frame a payload the way the device sends it: raw bytes then the
/// terminator.
///
/// The result only decodes back to `payload` when the payload neither
/// contains `03 02 01` nor ends in `03` or `03 02`. For `[0x41, 0x03]` the
/// decoder sees `03 03` as data, then `02 01` as data, and keeps waiting.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + TERMINATOR.len());
    out.extend_from_slice(payload);
    out.extend_from_slice(&TERMINATOR);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(input: &[u8]) -> Vec<u64> {
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        for &b in input {
            match decoder.push(b) {
                Decoded::Chunk(chunk) => out.push(chunk.delta()),
                Decoded::Terminated => break,
                Decoded::Pending => {},
            }
        }
        out
    }

    #[test]
    fn test_plain_bytes_pass_through() {
        let outcome = decode(&frame(b"ALT 1234\n"));
        assert!(outcome.terminated);
        assert_eq!(outcome.payload, b"ALT 1234\n");
    }

    #[test]
    fn test_empty_payload() {
        let outcome = decode(&TERMINATOR);
        assert!(outcome.terminated);
        assert!(outcome.payload.is_empty());
        assert_eq!(outcome.consumed, 3);
    }

    #[test]
    fn test_partial_match_passthrough() {
        let outcome = decode(&[0x03, 0x02, 0x05, 0x10, 0x03, 0x02, 0x01]);
        assert!(outcome.terminated);
        assert_eq!(outcome.payload, vec![0x03, 0x02, 0x05, 0x10]);
    }

    #[test]
    fn test_first_byte_followed_by_other() {
        let outcome = decode(&[0x03, 0x07, 0x03, 0x02, 0x01]);
        assert_eq!(outcome.payload, vec![0x03, 0x07]);
    }

    #[test]
    fn test_lookahead_byte_is_not_rescanned() {
        // 03 03 02 01: the second 03 is consumed as data with the first, so
        // the following 02 01 is plain data and the stream continues.
        let outcome = decode(&[0x03, 0x03, 0x02, 0x01, 0x03, 0x02, 0x01]);
        assert!(outcome.terminated);
        assert_eq!(outcome.payload, vec![0x03, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_third_byte_is_not_rescanned() {
        // 03 02 03 02 01: the third byte 03 is emitted with its prefix,
        // leaving 02 01 as data.
        let outcome = decode(&[0x03, 0x02, 0x03, 0x02, 0x01, 0x03, 0x02, 0x01]);
        assert!(outcome.terminated);
        assert_eq!(outcome.payload, vec![0x03, 0x02, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_embedded_terminator_truncates() {
        let outcome = decode(&frame(&[0xAA, 0x03, 0x02, 0x01, 0xBB]));
        assert!(outcome.terminated);
        assert_eq!(outcome.payload, vec![0xAA]);
        assert_eq!(outcome.consumed, 4);
    }

    #[test]
    fn test_progress_deltas_in_chunk_order() {
        let input = [0x41, 0x03, 0x42, 0x03, 0x02, 0x43, 0x03, 0x02, 0x01];
        assert_eq!(deltas(&input), vec![1, 2, 3]);
    }

    #[test]
    fn test_unterminated_buffer() {
        let outcome = decode(&[0x10, 0x20, 0x03, 0x02]);
        assert!(!outcome.terminated);
        assert_eq!(outcome.payload, vec![0x10, 0x20]);
        assert_eq!(outcome.consumed, 4);
    }

    #[test]
    fn test_decoder_state_reporting() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(0x03), Decoded::Pending);
        assert!(decoder.has_pending());
        assert_eq!(decoder.push(0x02), Decoded::Pending);
        assert_eq!(decoder.push(0x01), Decoded::Terminated);
        assert!(decoder.is_terminated());
        assert!(!decoder.has_pending());
        assert_eq!(decoder.push(0x42), Decoded::Terminated);
        assert_eq!(decoder.decoded_len(), 0);
    }

    #[test]
    fn test_decoded_len_counts_chunks() {
        let mut decoder = FrameDecoder::new();
        for &b in &[0x01, 0x03, 0x09, 0x03, 0x02, 0x00] {
            decoder.push(b);
        }
        assert_eq!(decoder.decoded_len(), 6);
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        // Ascending order never produces a 03 02 01 run.
        let payload: Vec<u8> = (0..=255u8).collect();
        let outcome = decode(&frame(&payload));
        assert!(outcome.terminated);
        assert_eq!(outcome.payload, payload);
    }

    #[test]
    fn test_chunk_deref() {
        let chunk = Chunk::two(0x03, 0x09);
        assert_eq!(&*chunk, &[0x03, 0x09]);
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.delta(), 2);
    }

    #[test]
    fn test_trailing_partial_terminator_swallows_real_one() {
        let outcome = decode(&frame(&[0x41, 0x03]));
        assert!(!outcome.terminated);
        assert_eq!(outcome.payload, vec![0x41, 0x03, 0x03, 0x02, 0x01]);

        let outcome = decode(&frame(&[0x41, 0x03, 0x02]));
        assert!(!outcome.terminated);
        assert_eq!(outcome.payload, vec![0x41, 0x03, 0x02, 0x03, 0x02, 0x01]);
    }
}
