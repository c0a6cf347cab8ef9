use std::fmt;
use std::io;

use linedrop_frame::FrameError;
use linedrop_session::SessionError;
use linedrop_storage::StorageError;
use linedrop_transport::TransportError;

// Exit code constants, sysexits-adjacent.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn storage_error(context: &str, err: StorageError) -> CliError {
    match err {
        StorageError::Create { source, .. }
        | StorageError::Write { source, .. }
        | StorageError::Io(source) => io_error(context, source),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Storage(err) => storage_error(context, err),
        SessionError::Frame(FrameError::Io(source)) => io_error(context, source),
        err @ SessionError::Frame(FrameError::ConnectionClosed) => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        err @ SessionError::Frame(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        err @ SessionError::UnexpectedResponse { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        err @ SessionError::Disconnected(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        err @ (SessionError::EmptyUpload | SessionError::Closed) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}
