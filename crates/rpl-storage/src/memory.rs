use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{PoisonError, RwLock};

use crate::backend::BlobBackend;
use crate::error::{BackendError, BackendResult};

type Container = BTreeMap<String, Vec<u8>>;

/// In-memory, HashMap-of-BTreeMap blob backend.
///
/// Intended for tests and embedding. Containers spring into existence on
/// first write. Objects are cloned on read and write; keys within a container
/// are kept ordered so listings are deterministic.
pub struct InMemoryBackend {
    containers: RwLock<HashMap<String, Container>>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
        }
    }

    /// Read an object directly, bypassing any storage root.
    pub fn object(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        let map = self.containers.read().unwrap_or_else(PoisonError::into_inner);
        map.get(container)?.get(key).cloned()
    }

    /// All keys in a container, sorted.
    pub fn keys(&self, container: &str) -> Vec<String> {
        let map = self.containers.read().unwrap_or_else(PoisonError::into_inner);
        map.get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of objects across all containers.
    pub fn len(&self) -> usize {
        let map = self.containers.read().unwrap_or_else(PoisonError::into_inner);
        map.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if no container holds any object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every container and object.
    pub fn clear(&self) {
        self.containers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobBackend for InMemoryBackend {
    fn put(&self, container: &str, key: &str, data: &[u8]) -> BackendResult<()> {
        let mut map = self
            .containers
            .write()
            .map_err(|_| BackendError::LockPoisoned)?;
        map.entry(container.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn get(&self, container: &str, key: &str) -> BackendResult<Vec<u8>> {
        let map = self
            .containers
            .read()
            .map_err(|_| BackendError::LockPoisoned)?;
        map.get(container)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            })
    }

    fn list(&self, container: &str, prefix: &str) -> BackendResult<Vec<String>> {
        let map = self
            .containers
            .read()
            .map_err(|_| BackendError::LockPoisoned)?;
        let Some(objects) = map.get(container) else {
            return Ok(Vec::new());
        };
        Ok(objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn delete(&self, container: &str, key: &str) -> BackendResult<bool> {
        let mut map = self
            .containers
            .write()
            .map_err(|_| BackendError::LockPoisoned)?;
        Ok(map
            .get_mut(container)
            .map(|objects| objects.remove(key).is_some())
            .unwrap_or(false))
    }

    fn exists(&self, container: &str, key: &str) -> BackendResult<bool> {
        let map = self
            .containers
            .read()
            .map_err(|_| BackendError::LockPoisoned)?;
        Ok(map
            .get(container)
            .is_some_and(|objects| objects.contains_key(key)))
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let backend = InMemoryBackend::new();
        backend.put("bucket", "foo/bar.txt", b"nice").unwrap();
        assert_eq!(backend.get("bucket", "foo/bar.txt").unwrap(), b"nice");
    }

    #[test]
    fn put_overwrites() {
        let backend = InMemoryBackend::new();
        backend.put("bucket", "k", b"one").unwrap();
        backend.put("bucket", "k", b"two").unwrap();
        assert_eq!(backend.object("bucket", "k").unwrap(), b"two");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend.get("bucket", "missing").unwrap_err();
        assert!(err.is_not_found());

        backend.put("bucket", "present", b"x").unwrap();
        assert!(backend.get("bucket", "missing").unwrap_err().is_not_found());
    }

    #[test]
    fn containers_are_isolated() {
        let backend = InMemoryBackend::new();
        backend.put("a", "key", b"in a").unwrap();
        assert!(backend.get("b", "key").unwrap_err().is_not_found());
        assert!(backend.keys("b").is_empty());
    }

    #[test]
    fn list_is_flat_and_sorted() {
        let backend = InMemoryBackend::new();
        for key in ["some/b", "foo", "some/a", "some/deep/c", "somewhere"] {
            backend.put("bucket", key, b"x").unwrap();
        }
        assert_eq!(
            backend.list("bucket", "some/").unwrap(),
            vec!["some/a", "some/b", "some/deep/c"]
        );
        assert_eq!(backend.list("bucket", "").unwrap().len(), 5);
        assert!(backend.list("bucket", "nothing").unwrap().is_empty());
        assert!(backend.list("unknown", "").unwrap().is_empty());
    }

    #[test]
    fn delete_reports_presence() {
        let backend = InMemoryBackend::new();
        backend.put("bucket", "k", b"x").unwrap();
        assert!(backend.delete("bucket", "k").unwrap());
        assert!(!backend.delete("bucket", "k").unwrap());
        assert!(!backend.delete("unknown", "k").unwrap());
        assert!(!backend.exists("bucket", "k").unwrap());
    }

    #[test]
    fn clear_removes_all() {
        let backend = InMemoryBackend::new();
        backend.put("a", "1", b"x").unwrap();
        backend.put("b", "2", b"y").unwrap();
        assert_eq!(backend.len(), 2);

        backend.clear();
        assert!(backend.is_empty());
    }

    #[test]
    fn concurrent_writers_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let backend = Arc::new(InMemoryBackend::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    let key = format!("worker-{i}");
                    backend.put("bucket", &key, key.as_bytes()).unwrap();
                    assert_eq!(backend.get("bucket", &key).unwrap(), key.as_bytes());
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(backend.len(), 8);
    }

    #[test]
    fn debug_format() {
        let backend = InMemoryBackend::new();
        backend.put("bucket", "x", b"x").unwrap();
        let debug = format!("{backend:?}");
        assert!(debug.contains("InMemoryBackend"));
        assert!(debug.contains("object_count"));
    }
}
