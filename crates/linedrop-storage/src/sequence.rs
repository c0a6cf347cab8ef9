use std::sync::{Mutex, PoisonError};

use bytes::Bytes;

use crate::error::Result;
use crate::Storage;

/// Shared 1-based batch-index allocator.
///
/// Sessions share one numbered-file namespace, so index allocation and
/// the persist call happen under a single lock: two connections can
/// never claim the same index or interleave writes to the same target.
/// The index advances only when a batch is accepted, keeping accepted
/// indices contiguous.
#[derive(Debug)]
pub struct BatchSequence {
    next: Mutex<u64>,
}

impl BatchSequence {
    /// Start a fresh sequence at batch index 1.
    pub fn new() -> Self {
        Self {
            next: Mutex::new(1),
        }
    }

    /// Resume a sequence at an explicit next index.
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: Mutex::new(next),
        }
    }

    /// Persist a batch under the next index.
    ///
    /// Returns `Some(index)` if the storage accepted it, `None` if it
    /// was rejected by policy (the index is not consumed).
    pub fn persist<S: Storage + ?Sized>(
        &self,
        storage: &S,
        lines: &[Bytes],
    ) -> Result<Option<u64>> {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let index = *next;
        if storage.persist(index, lines)? {
            *next += 1;
            Ok(Some(index))
        } else {
            Ok(None)
        }
    }

    /// The index the next accepted batch will receive.
    pub fn peek(&self) -> u64 {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BatchSequence {
    fn default() -> Self {
        Self::new()
    }
}
