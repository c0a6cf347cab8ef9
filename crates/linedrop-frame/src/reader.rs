use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::LF;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Buffers and yields exact byte counts from any blocking `Read` stream.
///
/// A byte-stream transport delivers no message boundaries; this reader
/// reassembles partial arrivals internally so callers always get the
/// exact count they asked for, or a detectable failure.
pub struct ByteReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> ByteReader<T> {
    /// Create a new byte reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read exactly `n` bytes (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` if the peer closes
    /// before `n` bytes have arrived — the stream ending is a failure
    /// here, never an indefinite wait.
    pub fn read_exactly(&mut self, n: usize) -> Result<Bytes> {
        while self.buf.len() < n {
            if self.fill()? == 0 {
                return Err(FrameError::ConnectionClosed);
            }
        }
        Ok(self.buf.split_to(n).freeze())
    }

    /// Read a single byte (blocking).
    pub fn read_byte(&mut self) -> Result<u8> {
        if self.buf.is_empty() && self.fill()? == 0 {
            return Err(FrameError::ConnectionClosed);
        }
        Ok(self.buf.split_to(1)[0])
    }

    /// Pull one chunk from the underlying stream into the buffer.
    ///
    /// Returns the number of bytes read; 0 means end of stream.
    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    ///
    /// Buffered but unconsumed bytes are discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Produces one LF-terminated line at a time, built on [`ByteReader`].
pub struct LineReader<T> {
    inner: ByteReader<T>,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner: ByteReader::new(inner),
        }
    }

    /// Read bytes until an LF and return them, excluding the LF itself.
    ///
    /// A line may be empty (a bare LF on the wire). If the stream ends
    /// before an LF is found, returns `ConnectionClosed` — a declared
    /// line count can never be satisfied by a peer that closed mid-line,
    /// and that is distinct from a clean termination.
    pub fn read_line(&mut self) -> Result<Bytes> {
        let mut line = BytesMut::new();
        loop {
            let byte = self.inner.read_byte()?;
            if byte == LF {
                return Ok(line.freeze());
            }
            line.put_u8(byte);
        }
    }

    /// Read exactly `n` bytes through the same cursor.
    ///
    /// Lets a session read headers and lines from one buffered stream
    /// without losing bytes between the two.
    pub fn read_exactly(&mut self, n: usize) -> Result<Bytes> {
        self.inner.read_exactly(n)
    }

    /// Read a single byte through the same cursor.
    pub fn read_byte(&mut self) -> Result<u8> {
        self.inner.read_byte()
    }
}
