use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected duplex byte stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// It delivers bytes with no message boundaries; framing lives above it.
pub struct Connection {
    inner: TcpStream,
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl Connection {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this connection (creates a new file descriptor).
    ///
    /// Used to split one connection into a read half and a write half.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Shut down both directions of the stream.
    ///
    /// Any read blocked on this connection (including on a clone)
    /// observes end-of-stream rather than hanging.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown(Shutdown::Both).map_err(Into::into)
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Local address of this end of the connection.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}
