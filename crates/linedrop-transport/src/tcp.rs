use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::connection::Connection;
use crate::error::{Result, TransportError};

/// TCP transport.
///
/// Owns a listening socket and hands out [`Connection`] streams.
/// There is no process-wide socket state; every socket is an explicit,
/// owned value passed to whatever drives it.
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen on a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Connection> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(Connection::from_tcp(stream))
    }

    /// Connect to a listening peer (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Connection> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        debug!(?addr, "connected to tcp peer");
        Ok(Connection::from_tcp(stream))
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}
