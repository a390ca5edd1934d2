//! A blob backend on a local directory.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/
//!   .staging/          temp files for in-flight writes
//!   <container>/
//!     <key segments...>/<last segment>
//! ```
//!
//! Each container is a subdirectory and each key a relative file path. Writes
//! land in a temp file under `.staging` and are renamed into place, so a
//! reader never observes a partially written object and `list` never sees a
//! temp file. Container names may not start with `.`.
//!
//! Because keys are file paths, one key cannot be both an object and a prefix
//! of other objects: with `some/bar` stored, `put("some")` fails, and with
//! `file` stored, `put("file/child")` fails. Both are
//! [`BackendError::InvalidKey`]. Remote object stores have no such limit.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::backend::BlobBackend;
use crate::error::{BackendError, BackendResult};

/// Directory under the base that holds temp files for in-flight writes.
const STAGING_DIR: &str = ".staging";

/// Filesystem-backed [`BlobBackend`].
#[derive(Clone, Debug)]
pub struct DiskBackend {
    base: PathBuf,
}

impl DiskBackend {
    /// Create a backend rooted at `base`. The directory is created lazily.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The base directory holding all containers.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn container_dir(&self, container: &str) -> BackendResult<PathBuf> {
        if container.is_empty()
            || container.starts_with('.')
            || container.contains('/')
            || container.contains('\\')
        {
            return Err(BackendError::InvalidKey {
                key: container.to_string(),
                reason: "container must be a single path segment not starting with '.'".into(),
            });
        }
        Ok(self.base.join(container))
    }

    fn object_path(&self, container: &str, key: &str) -> BackendResult<PathBuf> {
        let mut path = self.container_dir(container)?;
        for segment in key.split('/') {
            let reason = match segment {
                "" => "empty path segment",
                "." | ".." => "relative path segment",
                s if s.contains('\\') || s.contains('\0') => "forbidden character",
                _ => {
                    path.push(segment);
                    continue;
                }
            };
            return Err(BackendError::InvalidKey {
                key: key.to_string(),
                reason: reason.into(),
            });
        }
        Ok(path)
    }

    fn staging_dir(&self) -> PathBuf {
        self.base.join(STAGING_DIR)
    }

    /// Fail when `path` would collide with an existing object or prefix.
    fn check_conflicts(&self, container_dir: &Path, key: &str, path: &Path) -> BackendResult<()> {
        let conflict = |reason: &str| BackendError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        };
        if path.is_dir() {
            return Err(conflict("key is a prefix of stored objects"));
        }
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == container_dir {
                break;
            }
            if dir.is_file() {
                return Err(conflict("a parent of the key is stored as an object"));
            }
            current = dir.parent();
        }
        Ok(())
    }

    /// Remove now-empty directories between `path` and its container.
    fn prune_empty_parents(&self, container_dir: &Path, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == container_dir || fs::remove_dir(dir).is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

impl BlobBackend for DiskBackend {
    fn put(&self, container: &str, key: &str, data: &[u8]) -> BackendResult<()> {
        let path = self.object_path(container, key)?;
        self.check_conflicts(&self.container_dir(container)?, key, &path)?;
        let parent = path.parent().ok_or_else(|| BackendError::InvalidKey {
            key: key.to_string(),
            reason: "key has no parent directory".into(),
        })?;
        fs::create_dir_all(parent)?;

        let staging = self.staging_dir();
        fs::create_dir_all(&staging)?;
        let mut tmp = NamedTempFile::new_in(&staging)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(container, key, len = data.len(), "disk put");
        Ok(())
    }

    fn get(&self, container: &str, key: &str) -> BackendResult<Vec<u8>> {
        let path = self.object_path(container, key)?;
        let not_found = || BackendError::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        };
        if path.is_dir() {
            return Err(not_found());
        }
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, container: &str, prefix: &str) -> BackendResult<Vec<String>> {
        let dir = self.container_dir(container)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let segments: Option<Vec<&str>> = relative
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect();
            let Some(segments) = segments else {
                continue;
            };
            let key = segments.join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, container: &str, key: &str) -> BackendResult<bool> {
        let path = self.object_path(container, key)?;
        if path.is_dir() {
            return Ok(false);
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                self.prune_empty_parents(&self.container_dir(container)?, &path);
                debug!(container, key, "disk delete");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, container: &str, key: &str) -> BackendResult<bool> {
        Ok(self.object_path(container, key)?.is_file())
    }
}
