/// Errors that can occur while driving a protocol session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (connect/accept/write failures). Fatal to
    /// the session.
    #[error("transport error: {0}")]
    Transport(#[from] linedrop_transport::TransportError),

    /// Frame-level error (codec or I/O). Fatal to the session.
    #[error("frame error: {0}")]
    Frame(#[from] linedrop_frame::FrameError),

    /// Storage backend failure while persisting a batch.
    #[error("storage error: {0}")]
    Storage(#[from] linedrop_storage::StorageError),

    /// The peer sent a response byte outside the expected set. Reported
    /// to the caller; the session remains usable for further uploads.
    #[error("unexpected response byte 0x{byte:02X}")]
    UnexpectedResponse { byte: u8 },

    /// The peer closed the connection without signaling end-of-session.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// An upload of zero lines was requested. The zero count is the
    /// termination sentinel and is never a legitimate upload.
    #[error("cannot upload an empty batch (zero is the termination sentinel)")]
    EmptyUpload,

    /// The session already terminated; no further frames may be sent.
    #[error("session is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
