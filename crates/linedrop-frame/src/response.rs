//! Single-byte server responses.
//!
//! The server answers every processed frame with exactly one byte:
//! `A` accepts an upload, `R` rejects it, and `Q` acknowledges the
//! termination sentinel.

/// The response byte sent by the server after each processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// The upload was accepted and persisted.
    Accepted,
    /// The upload was rejected; nothing was persisted.
    Rejected,
    /// The termination sentinel was observed; the session is over.
    Quit,
}

impl ResponseCode {
    /// The wire byte for this response.
    pub fn as_byte(self) -> u8 {
        match self {
            ResponseCode::Accepted => b'A',
            ResponseCode::Rejected => b'R',
            ResponseCode::Quit => b'Q',
        }
    }

    /// Parse a wire byte. Returns `None` for anything outside `{A,R,Q}`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(ResponseCode::Accepted),
            b'R' => Some(ResponseCode::Rejected),
            b'Q' => Some(ResponseCode::Quit),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResponseCode::Accepted => "accepted",
            ResponseCode::Rejected => "rejected",
            ResponseCode::Quit => "quit",
        };
        write!(f, "{name}")
    }
}
