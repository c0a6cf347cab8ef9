use std::io::{Read, Write};

use bytes::Bytes;
use linedrop_frame::{
    decode_line_count, FrameError, FrameWriter, LineReader, ResponseCode, LINE_COUNT_SIZE,
    SENTINEL_LINE_COUNT,
};
use linedrop_storage::{BatchSequence, Storage};
use linedrop_transport::{Connection, TcpSocket};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};

/// Upper bound on the `Vec` preallocation for a declared line count.
/// The count itself is honored in full; only the initial reservation
/// is capped so a hostile header cannot demand gigabytes up front.
const MAX_PREALLOC_LINES: u32 = 1024;

/// What a finished server session observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames accepted and persisted.
    pub accepted: u64,
    /// Frames rejected by storage policy.
    pub rejected: u64,
}

/// Server side of one upload session.
///
/// Drives the sequence `AwaitingLineCount → ReadingLines → Responding`
/// per frame until the sentinel arrives, then answers `Q` and closes.
pub struct ServerSession<R, W> {
    reader: LineReader<R>,
    writer: FrameWriter<W>,
}

/// Accept the next connection and start a server session over it.
pub fn accept(socket: &TcpSocket) -> Result<ServerSession<Connection, Connection>> {
    let stream = socket.accept()?;
    let reader_half = stream.try_clone()?;
    Ok(ServerSession::from_parts(reader_half, stream))
}

impl<R: Read, W: Write> ServerSession<R, W> {
    /// Build a session from a read half and a write half of one
    /// accepted connection.
    pub fn from_parts(reader: R, writer: W) -> Self {
        Self {
            reader: LineReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Run the session to completion.
    ///
    /// Every accepted frame is handed to `storage` under an index from
    /// the shared `sequence`. Returns the session's stats on a clean
    /// sentinel exchange; a peer that disappears before the sentinel
    /// yields [`SessionError::Disconnected`] instead, and the partial
    /// batch never reaches storage.
    pub fn run<S: Storage + ?Sized>(
        mut self,
        storage: &S,
        sequence: &BatchSequence,
    ) -> Result<SessionStats> {
        let mut stats = SessionStats::default();

        loop {
            let line_count = match self.read_line_count() {
                Ok(count) => count,
                Err(FrameError::ConnectionClosed) => {
                    return Err(SessionError::Disconnected(
                        "peer closed without sending the termination frame".into(),
                    ))
                }
                Err(err) => return Err(err.into()),
            };

            if line_count == SENTINEL_LINE_COUNT {
                // Termination short-circuits before any line reading.
                self.writer.write_response(ResponseCode::Quit)?;
                info!(
                    accepted = stats.accepted,
                    rejected = stats.rejected,
                    "session terminated cleanly"
                );
                return Ok(stats);
            }

            let lines = match self.read_lines(line_count) {
                Ok(lines) => lines,
                Err(FrameError::ConnectionClosed) => {
                    return Err(SessionError::Disconnected(format!(
                        "peer closed mid-frame ({line_count} lines declared)"
                    )))
                }
                Err(err) => return Err(err.into()),
            };

            match sequence.persist(storage, &lines)? {
                Some(batch_index) => {
                    debug!(batch_index, lines = lines.len(), "batch accepted");
                    stats.accepted += 1;
                    self.writer.write_response(ResponseCode::Accepted)?;
                }
                None => {
                    warn!(lines = lines.len(), "batch rejected by storage policy");
                    stats.rejected += 1;
                    self.writer.write_response(ResponseCode::Rejected)?;
                }
            }
        }
    }

    fn read_line_count(&mut self) -> linedrop_frame::Result<u32> {
        let header = self.reader.read_exactly(LINE_COUNT_SIZE)?;
        let mut bytes = [0u8; LINE_COUNT_SIZE];
        bytes.copy_from_slice(&header);
        Ok(decode_line_count(bytes))
    }

    fn read_lines(&mut self, line_count: u32) -> linedrop_frame::Result<Vec<Bytes>> {
        let mut lines = Vec::with_capacity(line_count.min(MAX_PREALLOC_LINES) as usize);
        for _ in 0..line_count {
            lines.push(self.reader.read_line()?);
        }
        Ok(lines)
    }
}
