//! The [`BlobBackend`] trait: the object-store client a storage instance
//! delegates to.
//!
//! Connection handling, authentication, retries and multipart transfer all
//! live behind this trait. Callers see a blocking key/blob API scoped by
//! container.

use crate::error::{BackendError, BackendResult};

/// A blocking key/blob object store.
///
/// Implementations must be thread-safe (`Send + Sync`); a storage instance
/// shares one backend handle across all of its callers.
pub trait BlobBackend: Send + Sync {
    /// Create or replace the object at `key`.
    fn put(&self, container: &str, key: &str, data: &[u8]) -> BackendResult<()>;

    /// Read the object at `key`.
    ///
    /// Returns [`BackendError::NotFound`] when no such object exists.
    fn get(&self, container: &str, key: &str) -> BackendResult<Vec<u8>>;

    /// List every key starting with `prefix`, at any depth.
    ///
    /// Pass `""` to list the whole container. An unknown container lists as
    /// empty.
    fn list(&self, container: &str, prefix: &str) -> BackendResult<Vec<String>>;

    /// Delete the object at `key`.
    ///
    /// Returns `Ok(true)` if the object existed, `Ok(false)` if it did not.
    fn delete(&self, container: &str, key: &str) -> BackendResult<bool>;

    /// Check whether an object exists.
    ///
    /// Default implementation reads the object. Backends may override with a
    /// cheaper metadata lookup.
    fn exists(&self, container: &str, key: &str) -> BackendResult<bool> {
        match self.get(container, key) {
            Ok(_) => Ok(true),
            Err(BackendError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
