//! Batch persistence collaborators for the linedrop upload protocol.
//!
//! A server session hands every accepted frame to a [`Storage`]
//! implementation together with a 1-based batch index. The index space
//! is shared across sessions and allocated through [`BatchSequence`].

pub mod dir;
pub mod error;
pub mod memory;
pub mod sequence;

use bytes::Bytes;

pub use dir::{DirStorage, StorageLimits};
pub use error::{Result, StorageError};
pub use memory::MemoryStorage;
pub use sequence::BatchSequence;

/// The line delimiter, shared with the wire format.
pub(crate) const LF: u8 = 0x0A;

/// Persists one received batch of lines.
///
/// `Ok(true)` means the batch was accepted and persisted; `Ok(false)`
/// means it was rejected by policy and nothing was written. Backend
/// failures are errors, not rejections.
pub trait Storage: Send + Sync {
    fn persist(&self, batch_index: u64, lines: &[Bytes]) -> Result<bool>;
}
