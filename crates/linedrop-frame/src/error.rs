/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A line contains an embedded LF byte. LF is the line delimiter
    /// on the wire and can never be part of a line's content.
    #[error("line contains an embedded LF byte (0x0A)")]
    EmbeddedNewline,

    /// The batch holds more lines than the 4-byte header can carry.
    #[error("too many lines for one frame ({count}, max {max})")]
    TooManyLines { count: usize, max: u32 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// Reserved. Every 4-byte header value is currently a valid line
    /// count, so the decoder never produces this.
    #[error("malformed frame length")]
    MalformedLength,
}

pub type Result<T> = std::result::Result<T, FrameError>;
