use std::io::{Read, Write};
use std::net::ToSocketAddrs;

use bytes::Bytes;
use linedrop_frame::{ByteReader, Frame, FrameError, FrameWriter, ResponseCode};
use linedrop_transport::{Connection, TcpSocket};
use tracing::debug;

use crate::error::{Result, SessionError};

/// The server's verdict on one uploaded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The batch was accepted and persisted.
    Accepted,
    /// The batch was rejected by the server's storage policy.
    Rejected,
}

/// Client side of one upload session.
///
/// Drives the sequence `Idle → send header → send lines → await
/// response → Idle`, repeated per batch, and ends with the sentinel
/// exchange in [`finish`](Self::finish). Exchanges are strictly
/// alternating: the next frame goes out only after the previous
/// response arrived.
pub struct ClientSession<R, W> {
    reader: ByteReader<R>,
    writer: FrameWriter<W>,
    closed: bool,
}

/// Connect to a listening peer and start a session over the connection.
pub fn connect(
    addr: impl ToSocketAddrs + std::fmt::Debug,
) -> Result<ClientSession<Connection, Connection>> {
    let stream = TcpSocket::connect(addr)?;
    let reader_half = stream.try_clone()?;
    Ok(ClientSession::from_parts(reader_half, stream))
}

impl<R: Read, W: Write> ClientSession<R, W> {
    /// Build a session from a read half and a write half of one
    /// duplex connection.
    pub fn from_parts(reader: R, writer: W) -> Self {
        Self {
            reader: ByteReader::new(reader),
            writer: FrameWriter::new(writer),
            closed: false,
        }
    }

    /// Upload one batch of lines and block for the server's verdict.
    ///
    /// An empty batch is refused locally: the zero line count is the
    /// session-termination sentinel and is only ever sent by
    /// [`finish`](Self::finish).
    ///
    /// A response byte outside `{A, R}` is reported as
    /// [`SessionError::UnexpectedResponse`]; the session stays usable,
    /// the caller decides whether to try another batch.
    pub fn upload(&mut self, lines: Vec<Bytes>) -> Result<UploadOutcome> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if lines.is_empty() {
            return Err(SessionError::EmptyUpload);
        }

        let frame = Frame::new(lines)?;
        debug!(lines = frame.line_count(), "uploading batch");

        if let Err(err) = self.writer.write_frame(&frame) {
            self.closed = true;
            return Err(err.into());
        }

        match self.await_response()? {
            b'A' => Ok(UploadOutcome::Accepted),
            b'R' => Ok(UploadOutcome::Rejected),
            byte => Err(SessionError::UnexpectedResponse { byte }),
        }
    }

    /// Terminate the session: send the sentinel frame and block for
    /// the server's `Q`.
    ///
    /// Any other byte is reported as `UnexpectedResponse`; either way
    /// the session is consumed and the transport closes when the
    /// halves drop.
    pub fn finish(mut self) -> Result<()> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        self.writer.write_terminator().map_err(|err| {
            self.closed = true;
            SessionError::from(err)
        })?;

        let byte = self.await_response()?;
        self.closed = true;
        if byte == ResponseCode::Quit.as_byte() {
            debug!("session terminated cleanly");
            Ok(())
        } else {
            Err(SessionError::UnexpectedResponse { byte })
        }
    }

    /// Block for exactly one response byte.
    ///
    /// The peer closing here is fatal: the session's frame went out
    /// but was never acknowledged.
    fn await_response(&mut self) -> Result<u8> {
        match self.reader.read_byte() {
            Ok(byte) => Ok(byte),
            Err(FrameError::ConnectionClosed) => {
                self.closed = true;
                Err(SessionError::Disconnected(
                    "connection closed while awaiting response".into(),
                ))
            }
            Err(err) => {
                self.closed = true;
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn session(responses: &[u8]) -> ClientSession<Cursor<Vec<u8>>, Cursor<Vec<u8>>> {
        ClientSession::from_parts(Cursor::new(responses.to_vec()), Cursor::new(Vec::new()))
    }

    fn written<R>(session: ClientSession<R, Cursor<Vec<u8>>>) -> Vec<u8> {
        session.writer.into_inner().into_inner()
    }

    #[test]
    fn upload_writes_frame_and_parses_accept() {
        let mut session = session(b"A");
        let outcome = session
            .upload(vec![Bytes::from_static(b"hello"), Bytes::new()])
            .unwrap();

        assert_eq!(outcome, UploadOutcome::Accepted);
        assert_eq!(written(session), b"\x00\x00\x00\x02hello\n\n");
    }

    #[test]
    fn upload_parses_reject_and_stays_usable() {
        let mut session = session(b"RA");

        let first = session.upload(vec![Bytes::from_static(b"x")]).unwrap();
        assert_eq!(first, UploadOutcome::Rejected);

        let second = session.upload(vec![Bytes::from_static(b"y")]).unwrap();
        assert_eq!(second, UploadOutcome::Accepted);
    }

    #[test]
    fn unexpected_response_is_reported_but_not_fatal() {
        // A 'Q' where 'A'/'R' was expected is outside the contract.
        let mut session = session(b"QA");

        let err = session
            .upload(vec![Bytes::from_static(b"x")])
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnexpectedResponse { byte: 0x51 }
        ));

        let outcome = session.upload(vec![Bytes::from_static(b"y")]).unwrap();
        assert_eq!(outcome, UploadOutcome::Accepted);
    }

    #[test]
    fn empty_upload_is_refused_before_any_write() {
        let mut session = session(b"");
        let err = session.upload(Vec::new()).unwrap_err();
        assert!(matches!(err, SessionError::EmptyUpload));
        assert!(written(session).is_empty());
    }

    #[test]
    fn embedded_newline_is_refused_before_any_write() {
        let mut session = session(b"");
        let err = session
            .upload(vec![Bytes::from_static(b"two\nlines")])
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Frame(FrameError::EmbeddedNewline)
        ));
        assert!(written(session).is_empty());
    }

    #[test]
    fn peer_closing_before_response_is_fatal() {
        let mut session = session(b"");
        let err = session.upload(vec![Bytes::from_static(b"x")]).unwrap_err();
        assert!(matches!(err, SessionError::Disconnected(_)));

        let err = session.upload(vec![Bytes::from_static(b"y")]).unwrap_err();
        assert!(matches!(err, SessionError::Closed));
    }

    #[test]
    fn finish_sends_sentinel_and_expects_quit() {
        let session = session(b"Q");
        session.finish().unwrap();
    }

    #[test]
    fn finish_reports_non_quit_byte() {
        let session = session(b"A");
        let err = session.finish().unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnexpectedResponse { byte: 0x41 }
        ));
    }

    #[test]
    fn finish_wire_bytes_are_the_sentinel_header() {
        let wire = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut session =
            ClientSession::from_parts(Cursor::new(b"AQ".to_vec()), SharedWriter(wire.clone()));

        session.upload(vec![Bytes::from_static(b"hi")]).unwrap();
        session.finish().unwrap();

        let wire = wire.lock().unwrap();
        assert_eq!(&wire[..], b"\x00\x00\x00\x01hi\n\x00\x00\x00\x00");
    }

    struct SharedWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
