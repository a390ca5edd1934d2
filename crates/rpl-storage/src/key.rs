//! Mapping between caller keys and backend keys.
//!
//! A storage instance owns a `root` prefix. The backend key for caller key
//! `k` is `root/k`, or `k` itself when the root is empty. Nothing else is
//! normalized.

use crate::error::{StorageError, StorageResult};

/// Check that `key` can address an object: non-empty and not starting with `/`.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidArgument("key must not be empty".into()));
    }
    if key.starts_with('/') {
        return Err(StorageError::InvalidArgument(format!(
            "key must be relative, got {key:?}"
        )));
    }
    Ok(())
}

/// Check a listing prefix. Empty is allowed; a leading `/` is not.
pub fn validate_prefix(prefix: &str) -> StorageResult<()> {
    if prefix.starts_with('/') {
        return Err(StorageError::InvalidArgument(format!(
            "prefix must be relative, got {prefix:?}"
        )));
    }
    Ok(())
}

/// Drop trailing separators so `"r/"` and `"r"` name the same root.
pub fn normalize_root(root: &str) -> String {
    root.trim_end_matches('/').to_string()
}

/// Prefix `key` with `root`, collapsing an empty root to no prefix.
///
/// ```
/// use rpl_storage::key::root_join;
///
/// assert_eq!(root_join("", "foo/bar.txt"), "foo/bar.txt");
/// assert_eq!(root_join("someroot", "foo/bar.txt"), "someroot/foo/bar.txt");
/// assert_eq!(root_join("someroot", ""), "someroot/");
/// ```
pub fn root_join(root: &str, key: &str) -> String {
    if root.is_empty() {
        key.to_string()
    } else {
        format!("{root}/{key}")
    }
}

/// Inverse of [`root_join`]. Returns `None` for backend keys outside the root.
pub fn strip_root<'a>(root: &str, backend_key: &'a str) -> Option<&'a str> {
    if root.is_empty() {
        return Some(backend_key);
    }
    backend_key.strip_prefix(root)?.strip_prefix('/')
}

/// Turn a listing prefix into a directory form: `""` or `"some/dir/"`.
pub(crate) fn dir_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}
