use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::{Storage, LF};

/// Rejection policy for [`DirStorage`].
///
/// A batch exceeding either bound is rejected, not persisted, and the
/// server answers `R` for it. `None` means unbounded.
#[derive(Debug, Clone, Default)]
pub struct StorageLimits {
    /// Maximum number of lines per batch.
    pub max_lines: Option<usize>,
    /// Maximum size of a single line in bytes.
    pub max_line_bytes: Option<usize>,
}

/// Persists each accepted batch as a numbered text file.
///
/// Batch `i` lands at `<root>/<i>.txt`, each line followed by one LF,
/// so the artifact is byte-for-byte what crossed the wire.
pub struct DirStorage {
    root: PathBuf,
    limits: StorageLimits,
}

impl DirStorage {
    /// Open (creating if needed) a storage directory with no limits.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_limits(root, StorageLimits::default())
    }

    /// Open a storage directory with an explicit rejection policy.
    pub fn with_limits(root: impl AsRef<Path>, limits: StorageLimits) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StorageError::Create {
            path: root.clone(),
            source: e,
        })?;
        info!(root = %root.display(), "opened batch storage directory");
        Ok(Self { root, limits })
    }

    /// The directory batches are written into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn within_limits(&self, lines: &[Bytes]) -> bool {
        if let Some(max) = self.limits.max_lines {
            if lines.len() > max {
                return false;
            }
        }
        if let Some(max) = self.limits.max_line_bytes {
            if lines.iter().any(|line| line.len() > max) {
                return false;
            }
        }
        true
    }
}

impl Storage for DirStorage {
    fn persist(&self, batch_index: u64, lines: &[Bytes]) -> Result<bool> {
        if !self.within_limits(lines) {
            debug!(batch_index, lines = lines.len(), "batch rejected by limits");
            return Ok(false);
        }

        let path = self.root.join(format!("{batch_index}.txt"));
        let mut file = fs::File::create(&path).map_err(|e| StorageError::Write {
            path: path.clone(),
            source: e,
        })?;
        for line in lines {
            file.write_all(line).map_err(|e| StorageError::Write {
                path: path.clone(),
                source: e,
            })?;
            file.write_all(&[LF]).map_err(|e| StorageError::Write {
                path: path.clone(),
                source: e,
            })?;
        }

        info!(batch_index, lines = lines.len(), path = %path.display(), "persisted batch");
        Ok(true)
    }
}
