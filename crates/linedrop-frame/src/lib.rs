//! Line-count-prefixed wire framing for the linedrop upload protocol.
//!
//! This is the core value-add layer of linedrop. Every upload is framed
//! with:
//! - A 4-byte big-endian unsigned line count (0 is the termination
//!   sentinel)
//! - That many lines, each terminated by exactly one LF byte
//!
//! The receiving side answers every frame with a single response byte.
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod response;
pub mod writer;

pub use codec::{
    decode_line_count, encode_frame, encode_line_count, Frame, LF, LINE_COUNT_SIZE,
    SENTINEL_LINE_COUNT,
};
pub use error::{FrameError, Result};
pub use reader::{ByteReader, LineReader};
pub use response::ResponseCode;
pub use writer::FrameWriter;
