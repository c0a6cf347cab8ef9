//! Client and server protocol sessions for linedrop uploads.
//!
//! A session is the full ordered exchange of frames and responses on
//! one connection: the client uploads batches of lines, the server
//! acknowledges each one, and a zero-count sentinel frame ends the
//! exchange. One connection carries exactly one session.

pub mod client;
pub mod error;
pub mod server;

pub use client::{connect, ClientSession, UploadOutcome};
pub use error::{Result, SessionError};
pub use server::{accept, ServerSession, SessionStats};
