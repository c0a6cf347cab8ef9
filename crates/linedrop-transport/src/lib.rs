//! TCP transport layer for the linedrop upload protocol.
//!
//! Provides explicit, owned connect/listen/accept mechanics and the
//! [`Connection`] duplex stream type. This is the lowest layer of
//! linedrop. Everything else builds on top of `Connection`.

pub mod connection;
pub mod error;
pub mod tcp;

pub use connection::Connection;
pub use error::{Result, TransportError};
pub use tcp::TcpSocket;
