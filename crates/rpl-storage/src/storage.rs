//! The [`KeyStorage`] facade.
//!
//! Every operation maps the caller key to a backend key under the instance's
//! root, then makes exactly one backend call (or, for directory sync, one put
//! per uploaded file). No state is kept between calls.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use rpl_ignore::{IgnoreRules, IGNORE_FILE_NAME};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::backend::BlobBackend;
use crate::config::StorageConfig;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::key::{dir_prefix, normalize_root, root_join, strip_root, validate_key, validate_prefix};

/// Outcome of a [`KeyStorage::put_path`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PutPathSummary {
    /// Files written to the backend.
    pub uploaded: usize,
    /// Files left out because an ignore pattern matched them.
    pub skipped: usize,
    /// Directories left out, with everything under them, by an ignore pattern.
    pub pruned_dirs: usize,
    /// Files and directories left out because their names are not UTF-8.
    pub invalid_names: usize,
}

/// Key/blob storage bound to one container and one root prefix.
///
/// Cheap to share: the only state is the immutable `container`/`root` pair
/// and a handle to the backend, so a single instance can serve many threads.
pub struct KeyStorage {
    container: String,
    root: String,
    backend: Arc<dyn BlobBackend>,
}

impl KeyStorage {
    /// Bind a storage instance to `container` and `root` on `backend`.
    ///
    /// Trailing `/` on the root is dropped.
    pub fn new(
        container: impl Into<String>,
        root: impl Into<String>,
        backend: Arc<dyn BlobBackend>,
    ) -> Self {
        Self {
            container: container.into(),
            root: normalize_root(&root.into()),
            backend,
        }
    }

    pub fn from_config(config: &StorageConfig, backend: Arc<dyn BlobBackend>) -> Self {
        Self::new(config.container.clone(), config.root.clone(), backend)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// The backend key `key` is stored under.
    pub fn backend_key(&self, key: &str) -> StorageResult<String> {
        validate_key(key)?;
        Ok(root_join(&self.root, key))
    }

    // ---------------------------------------------------------------
    // Object operations
    // ---------------------------------------------------------------

    /// Write `content` at `key`, replacing any existing object.
    pub fn put(&self, key: &str, content: &[u8]) -> StorageResult<()> {
        let backend_key = self.backend_key(key)?;
        debug!(container = %self.container, key = %backend_key, len = content.len(), "put");
        self.backend.put(&self.container, &backend_key, content)?;
        Ok(())
    }

    /// Write UTF-8 `text` at `key`.
    pub fn put_str(&self, key: &str, text: &str) -> StorageResult<()> {
        self.put(key, text.as_bytes())
    }

    /// Read the object at `key`.
    ///
    /// A missing object is [`StorageError::DoesNotExist`]; every other
    /// backend failure is [`StorageError::Backend`].
    pub fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let backend_key = self.backend_key(key)?;
        debug!(container = %self.container, key = %backend_key, "get");
        match self.backend.get(&self.container, &backend_key) {
            Ok(data) => Ok(data),
            Err(BackendError::NotFound { .. }) => Err(StorageError::DoesNotExist {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` if an object is stored at `key`.
    pub fn exists(&self, key: &str) -> StorageResult<bool> {
        let backend_key = self.backend_key(key)?;
        Ok(self.backend.exists(&self.container, &backend_key)?)
    }

    /// Keys of the objects directly under `prefix`, one level deep.
    ///
    /// With `foo` and `some/bar` stored, `list("")` is `["foo"]` and
    /// `list("some")` is `["some/bar"]`. Keys are returned sorted and without
    /// the root.
    pub fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let dir = dir_prefix(prefix);
        let keys = self.list_under(prefix, &dir)?;
        Ok(keys
            .into_iter()
            .filter(|key| !key[dir.len()..].contains('/'))
            .collect())
    }

    /// Keys of every object under `prefix`, at any depth, sorted.
    pub fn list_recursive(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let dir = dir_prefix(prefix);
        self.list_under(prefix, &dir)
    }

    fn list_under(&self, prefix: &str, dir: &str) -> StorageResult<Vec<String>> {
        validate_prefix(prefix)?;
        let backend_prefix = root_join(&self.root, dir);
        debug!(container = %self.container, prefix = %backend_prefix, "list");

        let mut keys: Vec<String> = self
            .backend
            .list(&self.container, &backend_prefix)?
            .iter()
            .filter_map(|backend_key| strip_root(&self.root, backend_key))
            .filter(|key| key.len() > dir.len() && key.starts_with(dir))
            .map(str::to_string)
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Remove the object at `key`. Removing a missing key succeeds.
    pub fn delete(&self, key: &str) -> StorageResult<()> {
        let backend_key = self.backend_key(key)?;
        let existed = self.backend.delete(&self.container, &backend_key)?;
        debug!(container = %self.container, key = %backend_key, existed, "delete");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Local path upload
    // ---------------------------------------------------------------

    /// Upload a local file or directory.
    ///
    /// A file is stored at `destination_key` verbatim. A directory is walked
    /// recursively and each regular file at relative path `p` is stored at
    /// `destination_key/p`, except files excluded by the directory's
    /// `.replicateignore`. The top-level `.replicateignore` is not uploaded.
    /// Symlinks are not followed, and entries whose names are not UTF-8 are
    /// skipped with a warning since they cannot form a key.
    ///
    /// Uploads are not transactional: on error, files already written stay
    /// written.
    pub fn put_path(&self, source: &Path, destination_key: &str) -> StorageResult<PutPathSummary> {
        let metadata = fs::metadata(source).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::InvalidArgument(format!(
                    "source path does not exist: {}",
                    source.display()
                ))
            } else {
                io_error(source, e)
            }
        })?;
        validate_key(destination_key)?;

        if !metadata.is_dir() {
            let data = fs::read(source).map_err(|e| io_error(source, e))?;
            self.put(destination_key, &data)?;
            return Ok(PutPathSummary {
                uploaded: 1,
                ..Default::default()
            });
        }

        self.put_dir(source, destination_key.trim_end_matches('/'))
    }

    fn put_dir(&self, source: &Path, destination: &str) -> StorageResult<PutPathSummary> {
        let rules = IgnoreRules::load(source);
        let mut summary = PutPathSummary::default();

        let mut walker = WalkDir::new(source)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(source).to_path_buf();
                StorageError::Io {
                    path,
                    source: e.into(),
                }
            })?;
            let file_type = entry.file_type();
            let Some(relative) = relative_key(source, entry.path())? else {
                warn!(path = %entry.path().display(), "skipping entry with non-UTF-8 name");
                summary.invalid_names += 1;
                if file_type.is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            };

            if file_type.is_dir() {
                if rules.is_excluded_dir(&relative) {
                    debug!(path = %relative, "skipping ignored directory");
                    summary.pruned_dirs += 1;
                    walker.skip_current_dir();
                }
                continue;
            }
            if !file_type.is_file() {
                debug!(path = %relative, "skipping non-regular file");
                continue;
            }
            if relative == IGNORE_FILE_NAME {
                continue;
            }
            if rules.is_excluded(&relative) {
                debug!(path = %relative, "skipping ignored file");
                summary.skipped += 1;
                continue;
            }

            let data = fs::read(entry.path()).map_err(|e| io_error(entry.path(), e))?;
            self.put(&format!("{destination}/{relative}"), &data)?;
            summary.uploaded += 1;
        }

        info!(
            source = %source.display(),
            destination,
            uploaded = summary.uploaded,
            skipped = summary.skipped,
            pruned_dirs = summary.pruned_dirs,
            invalid_names = summary.invalid_names,
            "directory uploaded"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for KeyStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStorage")
            .field("container", &self.container)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn io_error(path: &Path, source: io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `/`-joined path of `path` relative to `base`, or `None` if a component
/// is not valid UTF-8.
fn relative_key(base: &Path, path: &Path) -> StorageResult<Option<String>> {
    let relative = path.strip_prefix(base).map_err(|_| {
        StorageError::InvalidArgument(format!(
            "{} is not under {}",
            path.display(),
            base.display()
        ))
    })?;
    let segments: Option<Vec<&str>> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();
    Ok(segments.map(|s| s.join("/")))
}
