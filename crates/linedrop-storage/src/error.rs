use std::path::PathBuf;

/// Errors that can occur while persisting a batch.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to create the storage root directory.
    #[error("failed to create storage directory {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a batch artifact.
    #[error("failed to write batch file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred in the storage backend.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
