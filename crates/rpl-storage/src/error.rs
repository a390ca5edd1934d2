use std::path::PathBuf;

/// Errors reported by a [`BlobBackend`](crate::BlobBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No object is stored under this key.
    #[error("object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    /// The backend cannot address this key (or container) at all.
    #[error("invalid backend key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The store refused the request (auth, permission, quota).
    #[error("request rejected by backend: {0}")]
    Rejected(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("backend lock poisoned")]
    LockPoisoned,

    /// I/O error from the underlying store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Returns `true` for the distinguished "object absent" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

/// Result alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors from [`KeyStorage`](crate::KeyStorage) operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The key has no stored object.
    #[error("key does not exist: {key}")]
    DoesNotExist { key: String },

    /// Any backend failure other than "not found", passed through as-is.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The caller broke the operation's contract (bad key, missing source).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local filesystem failure while reading a sync source.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
