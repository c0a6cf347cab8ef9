use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, encode_line_count, Frame, SENTINEL_LINE_COUNT};
use crate::error::{FrameError, Result};
use crate::response::ResponseCode;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames and response bytes to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a complete frame: header plus LF-terminated lines (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        encode_frame(frame, &mut self.buf);
        self.write_buffered()
    }

    /// Write the session-termination sentinel (header only).
    pub fn write_terminator(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf
            .extend_from_slice(&encode_line_count(SENTINEL_LINE_COUNT));
        self.write_buffered()
    }

    /// Write a single response byte (server side).
    pub fn write_response(&mut self, code: ResponseCode) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(&[code.as_byte()]);
        self.write_buffered()
    }

    /// Drain the staging buffer to the stream, handling short writes.
    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;

    use super::*;

    fn written(writer: FrameWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_frame_emits_header_and_lines() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        let frame = Frame::new(vec![Bytes::from_static(b"hello"), Bytes::new()]).unwrap();

        writer.write_frame(&frame).unwrap();

        assert_eq!(written(writer), b"\x00\x00\x00\x02hello\n\n");
    }

    #[test]
    fn write_terminator_is_zero_header() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.write_terminator().unwrap();
        assert_eq!(written(writer), &[0, 0, 0, 0]);
    }

    #[test]
    fn write_response_is_one_byte() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.write_response(ResponseCode::Accepted).unwrap();
        writer.write_response(ResponseCode::Rejected).unwrap();
        writer.write_response(ResponseCode::Quit).unwrap();
        assert_eq!(written(writer), b"ARQ");
    }

    #[test]
    fn consecutive_frames_share_the_stream() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        let first = Frame::new(vec![Bytes::from_static(b"a")]).unwrap();
        let second = Frame::new(vec![Bytes::from_static(b"b")]).unwrap();

        writer.write_frame(&first).unwrap();
        writer.write_frame(&second).unwrap();

        assert_eq!(written(writer), b"\x00\x00\x00\x01a\n\x00\x00\x00\x01b\n");
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let frame = Frame::new(vec![Bytes::from_static(b"x")]).unwrap();
        let err = writer.write_frame(&frame).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn interrupted_write_retries() {
        let inner = InterruptedOnceWriter {
            interrupted: false,
            data: Vec::new(),
        };
        let mut writer = FrameWriter::new(inner);
        writer.write_response(ResponseCode::Quit).unwrap();
        assert_eq!(writer.into_inner().data, b"Q");
    }

    #[test]
    fn short_writes_are_completed() {
        let inner = OneBytePerWrite { data: Vec::new() };
        let mut writer = FrameWriter::new(inner);
        let frame = Frame::new(vec![Bytes::from_static(b"ab")]).unwrap();

        writer.write_frame(&frame).unwrap();

        assert_eq!(writer.into_inner().data, b"\x00\x00\x00\x01ab\n");
    }

    #[test]
    fn io_error_propagates() {
        let mut writer = FrameWriter::new(BrokenWriter);
        let err = writer.write_terminator().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnceWriter {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnceWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct OneBytePerWrite {
        data: Vec<u8>,
    }

    impl Write for OneBytePerWrite {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
