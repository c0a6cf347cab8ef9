use std::collections::BTreeMap;
use std::sync::Mutex;

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::Storage;

/// In-memory storage, for tests and tooling.
///
/// Keeps every accepted batch keyed by batch index. An optional
/// capacity turns it into a rejecting backend once full.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    batches: Mutex<BTreeMap<u64, Vec<Bytes>>>,
    capacity: Option<usize>,
}

impl MemoryStorage {
    /// Unbounded in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory storage that rejects batches once `capacity` are held.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            batches: Mutex::new(BTreeMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Snapshot of all accepted batches, ordered by batch index.
    pub fn batches(&self) -> Vec<(u64, Vec<Bytes>)> {
        self.lock().iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    /// The lines of one batch, if it was accepted.
    pub fn batch(&self, batch_index: u64) -> Option<Vec<Bytes>> {
        self.lock().get(&batch_index).cloned()
    }

    /// Number of accepted batches.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no batch has been accepted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Vec<Bytes>>> {
        self.batches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn persist(&self, batch_index: u64, lines: &[Bytes]) -> Result<bool> {
        let mut batches = self.lock();
        if let Some(capacity) = self.capacity {
            if batches.len() >= capacity {
                debug!(batch_index, "batch rejected: memory storage full");
                return Ok(false);
            }
        }
        batches.insert(batch_index, lines.to_vec());
        Ok(true)
    }
}
