use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: one 4-byte big-endian unsigned line count.
pub const LINE_COUNT_SIZE: usize = 4;

/// Line count reserved as the session-termination sentinel.
pub const SENTINEL_LINE_COUNT: u32 = 0;

/// The line delimiter byte.
pub const LF: u8 = 0x0A;

/// One upload unit: an ordered batch of LF-free lines.
///
/// Constructed by the sender immediately before transmission and
/// consumed by the receiver once fully read and acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<Bytes>,
}

impl Frame {
    /// Create a frame, validating that no line embeds the delimiter
    /// and that the count fits the 4-byte header.
    pub fn new(lines: Vec<Bytes>) -> Result<Self> {
        if u32::try_from(lines.len()).is_err() {
            return Err(FrameError::TooManyLines {
                count: lines.len(),
                max: u32::MAX,
            });
        }
        if lines.iter().any(|line| line.contains(&LF)) {
            return Err(FrameError::EmbeddedNewline);
        }
        Ok(Self { lines })
    }

    /// The number of lines, as carried in the wire header.
    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// The lines in transmission order.
    pub fn lines(&self) -> &[Bytes] {
        &self.lines
    }

    /// Consume the frame and return its lines.
    pub fn into_lines(self) -> Vec<Bytes> {
        self.lines
    }

    /// The total wire size of this frame (header + lines + delimiters).
    pub fn wire_size(&self) -> usize {
        LINE_COUNT_SIZE
            + self
                .lines
                .iter()
                .map(|line| line.len() + 1)
                .sum::<usize>()
    }
}

/// Encode a line count into the wire header.
///
/// The full unsigned 32-bit range is carried; nothing is truncated.
pub fn encode_line_count(count: u32) -> [u8; LINE_COUNT_SIZE] {
    count.to_be_bytes()
}

/// Decode a wire header into a line count.
///
/// Every 4-byte value is valid, including the sentinel 0.
pub fn decode_line_count(bytes: [u8; LINE_COUNT_SIZE]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────┬────┬─────┬──────────┬────┐
/// │ Line count       │ Line 0   │ LF │ ... │ Line N-1 │ LF │
/// │ (4B BE unsigned) │ (bytes)  │    │     │ (bytes)  │    │
/// └──────────────────┴──────────┴────┴─────┴──────────┴────┘
/// ```
/// A count of 0 is the termination sentinel and carries no lines.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    dst.reserve(frame.wire_size());
    dst.put_slice(&encode_line_count(frame.line_count()));
    for line in frame.lines() {
        dst.put_slice(line);
        dst.put_u8(LF);
    }
}
